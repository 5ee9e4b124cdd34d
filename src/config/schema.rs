//! Configuration schema definitions.
//!
//! This module defines the configuration structure shared by the gateway and
//! the caller service. All types derive Serde traits for deserialization from
//! config files, and every section has defaults so a minimal file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway listener (serves `/api/data`).
    pub listener: ListenerConfig,

    /// Resource served by the gateway and its fallback.
    pub gateway: GatewaySection,

    /// Circuit breaker guarding the data source.
    pub breaker: CircuitBreakerConfig,

    /// Cache in front of the data source.
    pub cache: CacheConfig,

    /// The protected data source.
    pub data_source: DataSourceConfig,

    /// Service discovery used by the caller service.
    pub discovery: DiscoveryConfig,

    /// Caller service settings.
    pub caller: CallerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// What the gateway serves.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Cache key under which the resource is stored.
    pub resource_key: String,

    /// Body returned when the data source cannot be reached.
    pub fallback_message: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            resource_key: "cachedData".to_string(),
            fallback_message: "service unavailable — returning fallback response".to_string(),
        }
    }
}

/// Circuit breaker parameters.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Breaker name, used in logs and metrics.
    pub name: String,

    /// Failure ratio (0.0 - 1.0] that opens the breaker. Compared with `>=`.
    pub failure_rate_threshold: f64,

    /// Outcomes required in the window before the ratio is evaluated.
    pub minimum_calls: usize,

    /// Number of most recent outcomes kept.
    pub sliding_window_size: usize,

    /// Optional age limit for outcomes in the window.
    pub sliding_window_secs: Option<u64>,

    /// Time spent open before probing, in milliseconds.
    pub wait_duration_ms: u64,

    /// Concurrent probe calls allowed while half-open.
    pub permitted_probes: u32,

    /// Deadline for each protected call, in milliseconds.
    pub call_timeout_ms: u64,
}

impl CircuitBreakerConfig {
    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait_duration_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn window_age(&self) -> Option<Duration> {
        self.sliding_window_secs.map(Duration::from_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "backendService".to_string(),
            failure_rate_threshold: 0.5,
            minimum_calls: 5,
            sliding_window_size: 10,
            sliding_window_secs: None,
            wait_duration_ms: 30_000,
            permitted_probes: 3,
            call_timeout_ms: 2_000,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries older than this read as misses. `None` keeps entries forever.
    pub ttl_secs: Option<u64>,

    /// JSON snapshot loaded at startup and written on shutdown.
    pub persistence_path: Option<String>,
}

/// Kind of protected data source.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    /// Returns `payload`.
    #[default]
    Static,
    /// GETs `upstream_url`.
    Upstream,
}

/// Protected data source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub kind: DataSourceKind,

    /// Payload for the static source.
    pub payload: String,

    /// URL for the upstream source.
    pub upstream_url: Option<String>,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            kind: DataSourceKind::Static,
            payload: "Data from backend".to_string(),
            upstream_url: None,
        }
    }
}

/// Instance selection strategy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    #[default]
    RoundRobin,
    Random,
}

/// A registry entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServiceEntry {
    /// Logical service name (e.g., "backend-service").
    pub name: String,

    /// Instance address (e.g., "127.0.0.1:8080").
    pub address: String,

    /// Health as reported by the registry.
    #[serde(default = "default_healthy")]
    pub healthy: bool,
}

fn default_healthy() -> bool {
    true
}

/// Service discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub strategy: SelectionStrategy,

    /// Skip instances the registry reports unhealthy.
    pub only_healthy: bool,

    /// Outbound request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Registry contents.
    pub services: Vec<ServiceEntry>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::RoundRobin,
            only_healthy: false,
            request_timeout_secs: 5,
            services: Vec::new(),
        }
    }
}

/// Caller service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CallerConfig {
    /// Bind address of the caller service.
    pub bind_address: String,

    /// Logical name of the service to call.
    pub target_service: String,

    /// Path requested on the resolved instance.
    pub target_path: String,
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8090".to_string(),
            target_service: "backend-service".to_string(),
            target_path: "/api/data".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
