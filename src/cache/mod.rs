//! Cache subsystem.
//!
//! # Data Flow
//! ```text
//! ResilientGateway::fetch(key)
//!     → Cache::get(key)
//!         hit  → value returned, breaker untouched
//!         miss → protected call, then Cache::put(key, value) on success
//!
//! Startup / shutdown (memory.rs):
//!     snapshot file → load     save → snapshot file
//! ```
//!
//! # Design Decisions
//! - Synchronous trait: cache access never suspends
//! - Last write wins per key; no ordering across keys
//! - No eviction unless a TTL is configured
//! - A backend that cannot be reached reports `CacheError::Unavailable`;
//!   the gateway treats it as a miss

pub mod memory;

use std::fmt::Debug;

use thiserror::Error;

pub use memory::{CacheEntry, CacheStats, MemoryCache};

/// Errors from a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store in front of the protected operation.
pub trait Cache: Send + Sync + Debug {
    /// Current value for `key`, `None` on a miss.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: String) -> Result<(), CacheError>;
}
