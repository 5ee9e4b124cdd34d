//! Cache-aside read guarded by a circuit breaker.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::Cache;
use crate::gateway::operation::ProtectedOperation;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{BreakerError, CircuitBreaker};

/// Which path produced a fetched value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cache,
    Origin,
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Origin => "origin",
            Source::Fallback => "fallback",
        }
    }
}

/// A value together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub value: String,
    pub source: Source,
}

/// Composes a cache, a breaker and a protected operation into `fetch`.
#[derive(Clone)]
pub struct ResilientGateway {
    cache: Arc<dyn Cache>,
    breaker: Arc<CircuitBreaker>,
    operation: Arc<dyn ProtectedOperation>,
    fallback: String,
}

impl ResilientGateway {
    pub fn new(
        cache: Arc<dyn Cache>,
        breaker: Arc<CircuitBreaker>,
        operation: Arc<dyn ProtectedOperation>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            breaker,
            operation,
            fallback: fallback.into(),
        }
    }

    /// Value for `key`: cached, freshly fetched, or the fallback. Never fails.
    pub async fn fetch(&self, key: &str) -> String {
        self.fetch_with_source(key).await.value
    }

    /// Like [`fetch`](Self::fetch), also reporting the path taken.
    pub async fn fetch_with_source(&self, key: &str) -> Fetched {
        match self.cache.get(key) {
            Ok(Some(value)) => {
                metrics::record_cache_lookup("hit");
                metrics::record_fetch(Source::Cache.as_str());
                return Fetched {
                    value,
                    source: Source::Cache,
                };
            }
            Ok(None) => metrics::record_cache_lookup("miss"),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                metrics::record_cache_lookup("error");
            }
        }

        let operation = &self.operation;
        match self.breaker.call(|| operation.run(key)).await {
            Ok(value) => {
                if let Err(e) = self.cache.put(key, value.clone()) {
                    tracing::warn!(key = %key, error = %e, "Cache write failed");
                }
                metrics::record_fetch(Source::Origin.as_str());
                Fetched {
                    value,
                    source: Source::Origin,
                }
            }
            Err(e) => {
                match &e {
                    BreakerError::Open(_) => {
                        tracing::debug!(key = %key, breaker = %self.breaker.name(), "Breaker open, serving fallback")
                    }
                    _ => {
                        tracing::warn!(key = %key, breaker = %self.breaker.name(), error = %e, "Protected call failed, serving fallback")
                    }
                }
                metrics::record_fetch(Source::Fallback.as_str());
                Fetched {
                    value: self.fallback.clone(),
                    source: Source::Fallback,
                }
            }
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}
