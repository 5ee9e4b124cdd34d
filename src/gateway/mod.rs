//! Resilient data gateway.
//!
//! # Data Flow
//! ```text
//! GET /api/data
//!     → service.rs ResilientGateway::fetch(resource_key)
//!         → cache hit: return value
//!         → cache miss: CircuitBreaker::call(operation.rs source)
//!             → success: cache populated, value returned
//!             → open / failure / timeout: fallback text returned
//! ```
//!
//! # Design Decisions
//! - Explicit composition: cache, breaker and source are passed in, nothing is
//!   intercepted behind the caller's back
//! - `fetch` cannot fail; degraded content replaces errors
//! - The cache is written only after a verified success
//! - One attempt per fetch

pub mod operation;
pub mod service;

pub use operation::{build_operation, OperationError, ProtectedOperation, StaticSource, UpstreamSource};
pub use service::{Fetched, ResilientGateway, Source};
