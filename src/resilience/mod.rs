//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Cache miss in the gateway:
//!     → circuit_breaker.rs (admit, short-circuit or probe)
//!     → timeouts.rs (enforce the call deadline)
//!     → protected operation
//!     → circuit_breaker.rs (record outcome, maybe transition)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every protected call has a deadline
//! - No retries here: repeated client calls act as retries across the window
//! - One breaker per protected operation, owned by the process
//! - Time comes from clock.rs so transitions are testable

pub mod circuit_breaker;
pub mod clock;
pub mod timeouts;

pub use circuit_breaker::{BreakerError, BreakerSnapshot, CircuitBreaker, Phase};
pub use clock::{Clock, ManualClock, SystemClock};
