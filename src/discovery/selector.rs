//! Instance selection policies.
//!
//! - Round-robin: per-service counter, rotates through the current instance list
//! - Random: uniform pick per call
//!
//! Neither policy can keep returning the same instance while others exist.

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::config::SelectionStrategy;
use crate::discovery::registry::ServiceInstance;

/// Picks one instance out of the registry answer.
pub trait SelectionPolicy: Send + Sync + Debug {
    fn select<'a>(&self, service: &str, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance>;
}

/// Round-robin selector.
/// Stores one counter per service name so services rotate independently.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counters: DashMap<String, AtomicUsize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_index(&self, service: &str) -> usize {
        if let Some(counter) = self.counters.get(service) {
            return counter.fetch_add(1, Ordering::Relaxed);
        }
        self.counters
            .entry(service.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
    }
}

impl SelectionPolicy for RoundRobin {
    fn select<'a>(&self, service: &str, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        if instances.is_empty() {
            return None;
        }
        // The list may shrink or grow between calls; modulo keeps us in range.
        let index = self.next_index(service) % instances.len();
        instances.get(index)
    }
}

/// Uniform random selector.
#[derive(Debug, Default)]
pub struct Random;

impl SelectionPolicy for Random {
    fn select<'a>(&self, _service: &str, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        if instances.is_empty() {
            return None;
        }
        instances.get(fastrand::usize(..instances.len()))
    }
}

/// Policy for a configured strategy.
pub fn policy_for(strategy: SelectionStrategy) -> Box<dyn SelectionPolicy> {
    match strategy {
        SelectionStrategy::RoundRobin => Box::new(RoundRobin::new()),
        SelectionStrategy::Random => Box::new(Random),
    }
}
