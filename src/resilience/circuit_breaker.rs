//! Circuit breaker guarding a protected operation.
//!
//! # States
//! - Closed: normal operation, calls pass through and are recorded
//! - Open: operation assumed down, calls fail fast
//! - Half-Open: a bounded number of probe calls test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: window holds >= minimum_calls and failure rate >= threshold
//! Open → Half-Open: wait_duration elapsed since opened_at
//! Half-Open → Closed: a probe succeeds (window cleared)
//! Half-Open → Open: a probe fails (opened_at reset)
//! ```
//!
//! # Design Decisions
//! - One mutex around the whole state; never held across an `.await`
//! - Every transition bumps a generation counter; outcomes from calls admitted
//!   under an older generation are dropped, so one condition yields one transition
//! - Timeouts count as failures
//! - A probe that is cancelled before settling gives its slot back

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;
use crate::resilience::clock::Clock;
use crate::resilience::timeouts::{enforce, TimedOut};

/// Breaker phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Closed,
    Open,
    HalfOpen,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Closed => "closed",
            Phase::Open => "open",
            Phase::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single guarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallResult {
    Success,
    Failure,
}

/// One entry of the sliding window.
#[derive(Debug, Clone, Copy)]
pub struct CallOutcome {
    pub at: Instant,
    pub result: CallResult,
}

/// Errors returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Short-circuited, the operation was not invoked.
    #[error("circuit breaker '{0}' is open")]
    Open(String),

    /// The operation exceeded its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The operation itself returned an error.
    #[error("operation failed: {0}")]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// True when the call never reached the operation.
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, BreakerError::Open(_))
    }
}

#[derive(Debug)]
struct BreakerState {
    phase: Phase,
    window: VecDeque<CallOutcome>,
    opened_at: Option<Instant>,
    probes_in_flight: u32,
    generation: u64,
}

/// Point-in-time view of a breaker, for admin endpoints and logs.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub phase: Phase,
    pub window_len: usize,
    pub failures: usize,
    pub failure_rate: f64,
    pub open_for_ms: Option<u64>,
    pub probes_in_flight: u32,
}

/// Circuit breaker for one protected operation.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        metrics::record_breaker_phase(&config.name, Phase::Closed);
        Self {
            state: Mutex::new(BreakerState {
                phase: Phase::Closed,
                window: VecDeque::with_capacity(config.sliding_window_size),
                opened_at: None,
                probes_in_flight: 0,
                generation: 0,
            }),
            config,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current phase. An elapsed cool-down is applied before answering.
    pub fn current_phase(&self) -> Phase {
        let now = self.clock.now();
        let mut state = self.lock();
        self.refresh(&mut state, now);
        state.phase
    }

    /// Run `operation` under the breaker with the configured call timeout.
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_with_timeout(self.config.call_timeout(), operation).await
    }

    /// Run `operation` under the breaker, failing it after `timeout`.
    pub async fn call_with_timeout<T, E, F, Fut>(
        &self,
        timeout: Duration,
        operation: F,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.try_acquire() else {
            tracing::debug!(breaker = %self.config.name, "Call short-circuited");
            metrics::record_breaker_call(&self.config.name, "rejected");
            return Err(BreakerError::Open(self.config.name.clone()));
        };

        match enforce(timeout, operation()).await {
            Ok(Ok(value)) => {
                permit.settle(CallResult::Success);
                metrics::record_breaker_call(&self.config.name, "success");
                Ok(value)
            }
            Ok(Err(e)) => {
                permit.settle(CallResult::Failure);
                metrics::record_breaker_call(&self.config.name, "failure");
                Err(BreakerError::Operation(e))
            }
            Err(TimedOut(limit)) => {
                permit.settle(CallResult::Failure);
                metrics::record_breaker_call(&self.config.name, "timeout");
                Err(BreakerError::Timeout(limit))
            }
        }
    }

    /// Force the breaker back to closed with an empty window.
    pub fn reset(&self) {
        let now = self.clock.now();
        let mut state = self.lock();
        if state.phase != Phase::Closed {
            self.transition(&mut state, Phase::Closed, now);
        } else {
            state.window.clear();
            state.generation += 1;
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = self.clock.now();
        let mut state = self.lock();
        self.refresh(&mut state, now);
        self.trim(&mut state, now);
        let failures = count_failures(&state.window);
        let window_len = state.window.len();
        BreakerSnapshot {
            name: self.config.name.clone(),
            phase: state.phase,
            window_len,
            failures,
            failure_rate: if window_len == 0 {
                0.0
            } else {
                failures as f64 / window_len as f64
            },
            open_for_ms: state
                .opened_at
                .map(|t| now.saturating_duration_since(t).as_millis() as u64),
            probes_in_flight: state.probes_in_flight,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a call, or `None` when it must be short-circuited.
    fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let now = self.clock.now();
        let mut state = self.lock();
        self.refresh(&mut state, now);

        let probe = match state.phase {
            Phase::Closed => false,
            Phase::Open => return None,
            Phase::HalfOpen => {
                if state.probes_in_flight >= self.config.permitted_probes {
                    return None;
                }
                state.probes_in_flight += 1;
                true
            }
        };
        let generation = state.generation;
        drop(state);

        Some(CallPermit {
            breaker: self,
            generation,
            probe,
            settled: false,
        })
    }

    fn record(&self, generation: u64, result: CallResult) {
        let now = self.clock.now();
        let mut state = self.lock();

        if state.generation != generation {
            tracing::trace!(breaker = %self.config.name, "Outcome from a previous phase ignored");
            return;
        }

        match state.phase {
            Phase::Closed => {
                state.window.push_back(CallOutcome { at: now, result });
                self.trim(&mut state, now);
                if self.should_trip(&state) {
                    self.transition(&mut state, Phase::Open, now);
                }
            }
            Phase::HalfOpen => {
                state.probes_in_flight = state.probes_in_flight.saturating_sub(1);
                match result {
                    CallResult::Success => self.transition(&mut state, Phase::Closed, now),
                    CallResult::Failure => self.transition(&mut state, Phase::Open, now),
                }
            }
            // No permits are handed out while open.
            Phase::Open => {}
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation && state.phase == Phase::HalfOpen {
            state.probes_in_flight = state.probes_in_flight.saturating_sub(1);
        }
    }

    fn refresh(&self, state: &mut BreakerState, now: Instant) {
        if state.phase != Phase::Open {
            return;
        }
        let elapsed = state
            .opened_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        if elapsed >= self.config.wait_duration() {
            self.transition(state, Phase::HalfOpen, now);
        }
    }

    fn trim(&self, state: &mut BreakerState, now: Instant) {
        while state.window.len() > self.config.sliding_window_size {
            state.window.pop_front();
        }
        if let Some(max_age) = self.config.window_age() {
            while let Some(front) = state.window.front() {
                if now.saturating_duration_since(front.at) <= max_age {
                    break;
                }
                state.window.pop_front();
            }
        }
    }

    fn should_trip(&self, state: &BreakerState) -> bool {
        let total = state.window.len();
        if total == 0 || total < self.config.minimum_calls {
            return false;
        }
        let failures = count_failures(&state.window);
        failures as f64 >= self.config.failure_rate_threshold * total as f64
    }

    fn transition(&self, state: &mut BreakerState, to: Phase, now: Instant) {
        let from = state.phase;
        state.phase = to;
        state.generation += 1;
        state.probes_in_flight = 0;

        match to {
            Phase::Open => state.opened_at = Some(now),
            Phase::Closed => {
                state.window.clear();
                state.opened_at = None;
            }
            Phase::HalfOpen => {}
        }

        if to == Phase::Open {
            tracing::warn!(
                breaker = %self.config.name,
                from = %from,
                to = %to,
                window = state.window.len(),
                failures = count_failures(&state.window),
                "Circuit breaker opened"
            );
        } else {
            tracing::info!(breaker = %self.config.name, from = %from, to = %to, "Circuit breaker transition");
        }
        metrics::record_breaker_transition(&self.config.name, from, to);
    }
}

fn count_failures(window: &VecDeque<CallOutcome>) -> usize {
    window
        .iter()
        .filter(|o| o.result == CallResult::Failure)
        .count()
}

/// Admission ticket for one call.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    settled: bool,
}

impl CallPermit<'_> {
    fn settle(mut self, result: CallResult) {
        self.settled = true;
        self.breaker.record(self.generation, result);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.release_probe(self.generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::clock::ManualClock;
    use futures_util::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(threshold: f64, minimum_calls: usize, window: usize) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            name: "test".to_string(),
            failure_rate_threshold: threshold,
            minimum_calls,
            sliding_window_size: window,
            sliding_window_secs: None,
            wait_duration_ms: 30_000,
            permitted_probes: 3,
            call_timeout_ms: 1_000,
        }
    }

    fn breaker(cfg: CircuitBreakerConfig) -> (CircuitBreaker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (CircuitBreaker::new(cfg, clock.clone()), clock)
    }

    async fn feed(cb: &CircuitBreaker, outcomes: &[bool]) {
        for ok in outcomes {
            let _ = cb
                .call(|| async move { if *ok { Ok(()) } else { Err("boom") } })
                .await;
        }
    }

    #[tokio::test]
    async fn test_failure_rate_at_threshold_opens() {
        let (cb, _clock) = breaker(config(0.5, 4, 4));
        feed(&cb, &[false, false, true]).await;
        assert_eq!(cb.current_phase(), Phase::Closed);

        feed(&cb, &[true]).await;
        assert_eq!(cb.current_phase(), Phase::Open);
    }

    #[tokio::test]
    async fn test_all_successes_stay_closed() {
        let (cb, _clock) = breaker(config(0.5, 4, 4));
        feed(&cb, &[true, true, true, true]).await;
        assert_eq!(cb.current_phase(), Phase::Closed);
        assert_eq!(cb.snapshot().window_len, 4);
    }

    #[tokio::test]
    async fn test_minimum_calls_gate() {
        let (cb, _clock) = breaker(config(0.5, 5, 10));
        feed(&cb, &[false, false, false, false]).await;
        assert_eq!(cb.current_phase(), Phase::Closed);

        feed(&cb, &[false]).await;
        assert_eq!(cb.current_phase(), Phase::Open);
    }

    #[tokio::test]
    async fn test_window_keeps_most_recent_calls() {
        let (cb, _clock) = breaker(config(0.5, 4, 4));
        feed(&cb, &[false, true, true, true]).await;
        feed(&cb, &[true, true]).await;
        let snap = cb.snapshot();
        assert_eq!(snap.window_len, 4);
        assert_eq!(snap.failures, 0);
    }

    #[tokio::test]
    async fn test_time_bounded_window_drops_old_outcomes() {
        let mut cfg = config(0.5, 2, 10);
        cfg.sliding_window_secs = Some(10);
        let (cb, clock) = breaker(cfg);

        feed(&cb, &[false]).await;
        clock.advance(Duration::from_secs(11));
        feed(&cb, &[true]).await;

        let snap = cb.snapshot();
        assert_eq!(snap.window_len, 1);
        assert_eq!(cb.current_phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn test_open_short_circuits_without_invoking() {
        let (cb, _clock) = breaker(config(0.5, 4, 4));
        feed(&cb, &[false, false, false, false]).await;

        let invoked = AtomicUsize::new(0);
        let res: Result<(), BreakerError<&str>> = cb
            .call(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(res, Err(BreakerError::Open(_))));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_probe_closes_and_clears_window() {
        let (cb, clock) = breaker(config(0.5, 4, 4));
        feed(&cb, &[false, false, false, false]).await;
        assert_eq!(cb.current_phase(), Phase::Open);

        clock.advance(Duration::from_millis(29_999));
        assert_eq!(cb.current_phase(), Phase::Open);
        clock.advance(Duration::from_millis(1));
        assert_eq!(cb.current_phase(), Phase::HalfOpen);

        feed(&cb, &[true]).await;
        assert_eq!(cb.current_phase(), Phase::Closed);
        let snap = cb.snapshot();
        assert_eq!(snap.window_len, 0);
        assert!(snap.open_for_ms.is_none());
    }

    #[tokio::test]
    async fn test_failed_probe_reopens_and_restarts_wait() {
        let (cb, clock) = breaker(config(0.5, 4, 4));
        feed(&cb, &[false, false, false, false]).await;
        clock.advance(Duration::from_secs(30));

        feed(&cb, &[false]).await;
        assert_eq!(cb.current_phase(), Phase::Open);
        assert_eq!(cb.snapshot().open_for_ms, Some(0));

        clock.advance(Duration::from_secs(29));
        assert_eq!(cb.current_phase(), Phase::Open);
        clock.advance(Duration::from_secs(1));
        assert_eq!(cb.current_phase(), Phase::HalfOpen);
    }

    #[tokio::test]
    async fn test_half_open_admits_bounded_probes() {
        let (cb, clock) = breaker(config(0.5, 4, 4));
        feed(&cb, &[false, false, false, false]).await;
        clock.advance(Duration::from_secs(30));

        let invoked = AtomicUsize::new(0);
        let calls = (0..5).map(|_| {
            cb.call(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, &str>(())
            })
        });
        let results = join_all(calls).await;

        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(BreakerError::Open(_))))
            .count();
        assert_eq!(invoked.load(Ordering::SeqCst), 3);
        assert_eq!(rejected, 2);
        assert_eq!(cb.current_phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn test_one_transition_per_condition() {
        let (cb, clock) = breaker(config(0.5, 4, 4));
        feed(&cb, &[false, false, false, false]).await;
        clock.advance(Duration::from_secs(30));

        // First probe fails fast, the other two fail later and must not re-open.
        let calls = (0..3u64).map(|i| {
            cb.call(move || async move {
                tokio::time::sleep(Duration::from_millis(10 * (i + 1))).await;
                Err::<(), _>("down")
            })
        });
        join_all(calls).await;

        assert_eq!(cb.current_phase(), Phase::Open);
        assert_eq!(cb.snapshot().probes_in_flight, 0);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let mut cfg = config(0.5, 1, 4);
        cfg.call_timeout_ms = 20;
        let (cb, _clock) = breaker(cfg);

        let res: Result<(), BreakerError<&str>> = cb
            .call(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .await;

        assert!(matches!(res, Err(BreakerError::Timeout(_))));
        assert_eq!(cb.current_phase(), Phase::Open);
    }

    #[tokio::test]
    async fn test_cancelled_probe_releases_slot() {
        let mut cfg = config(0.5, 1, 4);
        cfg.permitted_probes = 1;
        let (cb, clock) = breaker(cfg);
        feed(&cb, &[false]).await;
        clock.advance(Duration::from_secs(30));

        let pending = cb.call(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, &str>(())
        });
        let _ = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert_eq!(cb.snapshot().probes_in_flight, 0);

        feed(&cb, &[true]).await;
        assert_eq!(cb.current_phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn test_reset_forces_closed() {
        let (cb, _clock) = breaker(config(0.5, 1, 4));
        feed(&cb, &[false]).await;
        assert_eq!(cb.current_phase(), Phase::Open);

        cb.reset();
        assert_eq!(cb.current_phase(), Phase::Closed);
        assert_eq!(cb.snapshot().window_len, 0);
    }

    #[test]
    fn test_error_display() {
        let err: BreakerError<&str> = BreakerError::Open("backendService".into());
        assert_eq!(err.to_string(), "circuit breaker 'backendService' is open");
        assert!(err.is_short_circuit());

        let err: BreakerError<&str> = BreakerError::Operation("boom");
        assert_eq!(err.to_string(), "operation failed: boom");
    }
}
