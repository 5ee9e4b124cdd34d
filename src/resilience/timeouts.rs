//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap protected calls with a deadline
//! - Cancel the inner future cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from operation errors so the breaker can
//!   report them separately (both count as failures)

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The deadline passed before the future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} exceeded")]
pub struct TimedOut(pub Duration);

/// Await `fut`, giving up after `limit`.
pub async fn enforce<F: Future>(limit: Duration, fut: F) -> Result<F::Output, TimedOut> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| TimedOut(limit))
}
