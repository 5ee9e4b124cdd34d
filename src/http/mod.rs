//! HTTP surfaces for both services.
//!
//! # Data Flow
//! ```text
//! Gateway:
//!     client → server.rs (request ID, trace, timeout)
//!         → gateway::ResilientGateway (cache → breaker → source → fallback)
//!         → response.rs (200 + x-gateway-source)
//!
//! Caller:
//!     client → caller.rs
//!         → discovery::DiscoveryClient (registry → selector → outbound GET)
//!         → response.rs (body, or 502/503 on failure)
//! ```

pub mod caller;
pub mod request;
pub mod response;
pub mod server;

pub use caller::CallerServer;
pub use request::X_REQUEST_ID;
pub use response::X_GATEWAY_SOURCE;
pub use server::{AppState, HttpServer, ServerError};
