//! Resilient cached data gateway library.
//!
//! A read-through cache in front of a fragile data source, protected by a
//! circuit breaker with a static fallback, plus a discovery client that
//! reaches the gateway through a service registry.

pub mod admin;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayConfig;
pub use gateway::ResilientGateway;
pub use http::{CallerServer, HttpServer};
pub use lifecycle::Shutdown;
