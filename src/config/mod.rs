//! Configuration.
//!
//! One TOML file configures both binaries; every section and field has a
//! default, so an empty file (or no file) is valid.
//!
//! ```text
//! file → loader.rs (toml + serde) → validation.rs → GatewayConfig
//!
//! caller service only:
//! file change → watcher.rs → loader.rs → registry snapshot swapped
//! ```
//!
//! Breaker and cache parameters are read once at startup.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::{
    CacheConfig, CircuitBreakerConfig, DataSourceConfig, DataSourceKind, DiscoveryConfig,
    GatewayConfig, ListenerConfig, ObservabilityConfig, SelectionStrategy, ServiceEntry,
};
