//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Caller needs "backend-service"
//!     → registry.rs (list instances for the name)
//!     → selector.rs (round-robin or random pick)
//!     → client.rs (GET http://<address>/api/data)
//!     → body text, or an error for the caller to handle
//! ```
//!
//! # Design Decisions
//! - The registry is read-only from here; registration is external
//! - Selection state lives in the policy, not in the registry
//! - Errors surface to the caller; fallback belongs one hop downstream

pub mod client;
pub mod registry;
pub mod selector;

use thiserror::Error;

pub use client::{DiscoveryClient, DATA_PATH};
pub use registry::{ServiceInstance, ServiceRegistry, StaticRegistry};
pub use selector::{policy_for, Random, RoundRobin, SelectionPolicy};

/// Errors surfaced by discovery and the outbound call.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The registry returned no usable instance.
    #[error("no instance available for service '{0}'")]
    NoInstanceAvailable(String),

    /// The registry itself could not be queried.
    #[error("registry error: {0}")]
    Registry(String),

    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Outbound request failed in transport.
    #[error("request to {address} failed: {source}")]
    Request {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// Instance answered with a non-success status.
    #[error("{address} returned status {status}")]
    Status { address: String, status: u16 },
}
