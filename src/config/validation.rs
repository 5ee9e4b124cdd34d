//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, timeouts > 0, addresses parse)
//! - Check that the selected data source is fully configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DataSourceKind, GatewayConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    #[error("{field}: invalid address '{value}'")]
    InvalidAddress { field: String, value: String },

    #[error("data_source.upstream_url: {0}")]
    InvalidUpstream(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

fn out_of_range(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::OutOfRange {
        field,
        reason: reason.into(),
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("listener.bind_address", &config.listener.bind_address),
        ("caller.bind_address", &config.caller.bind_address),
    ] {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: field.to_string(),
                value: value.clone(),
            });
        }
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address".to_string(),
            value: config.observability.metrics_address.clone(),
        });
    }

    let breaker = &config.breaker;
    if !(breaker.failure_rate_threshold > 0.0 && breaker.failure_rate_threshold <= 1.0) {
        errors.push(out_of_range(
            "breaker.failure_rate_threshold",
            format!("{} is not in (0.0, 1.0]", breaker.failure_rate_threshold),
        ));
    }
    if breaker.minimum_calls == 0 {
        errors.push(out_of_range("breaker.minimum_calls", "must be at least 1"));
    }
    if breaker.sliding_window_size < breaker.minimum_calls {
        errors.push(out_of_range(
            "breaker.sliding_window_size",
            format!(
                "{} is smaller than minimum_calls ({}), the breaker could never open",
                breaker.sliding_window_size, breaker.minimum_calls
            ),
        ));
    }
    if breaker.sliding_window_secs == Some(0) {
        errors.push(out_of_range("breaker.sliding_window_secs", "must be greater than 0"));
    }
    if breaker.permitted_probes == 0 {
        errors.push(out_of_range("breaker.permitted_probes", "must be at least 1"));
    }
    if breaker.call_timeout_ms == 0 {
        errors.push(out_of_range("breaker.call_timeout_ms", "must be greater than 0"));
    }
    if breaker.name.is_empty() {
        errors.push(ValidationError::Empty("breaker.name"));
    }

    if config.gateway.resource_key.is_empty() {
        errors.push(ValidationError::Empty("gateway.resource_key"));
    }
    if config.cache.ttl_secs == Some(0) {
        errors.push(out_of_range("cache.ttl_secs", "must be greater than 0"));
    }

    if config.data_source.kind == DataSourceKind::Upstream {
        match config.data_source.upstream_url.as_deref() {
            None => errors.push(ValidationError::InvalidUpstream(
                "required when kind = \"upstream\"".to_string(),
            )),
            Some(raw) => match url::Url::parse(raw) {
                Ok(url) if url.scheme() == "http" => {}
                Ok(url) => errors.push(ValidationError::InvalidUpstream(format!(
                    "unsupported scheme '{}'",
                    url.scheme()
                ))),
                Err(e) => errors.push(ValidationError::InvalidUpstream(e.to_string())),
            },
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(out_of_range("timeouts.request_secs", "must be greater than 0"));
    } else if breaker.call_timeout_ms >= config.timeouts.request_secs.saturating_mul(1000) {
        // The breaker deadline has to expire before the request deadline.
        errors.push(out_of_range(
            "breaker.call_timeout_ms",
            format!(
                "{} must be below timeouts.request_secs ({}s)",
                breaker.call_timeout_ms, config.timeouts.request_secs
            ),
        ));
    }
    if config.discovery.request_timeout_secs == 0 {
        errors.push(out_of_range("discovery.request_timeout_secs", "must be greater than 0"));
    }
    if config.caller.target_service.is_empty() {
        errors.push(ValidationError::Empty("caller.target_service"));
    }
    for (i, service) in config.discovery.services.iter().enumerate() {
        if service.name.is_empty() {
            errors.push(ValidationError::Empty("discovery.services.name"));
        }
        if !is_host_port(&service.address) {
            errors.push(ValidationError::InvalidAddress {
                field: format!("discovery.services[{}].address", i),
                value: service.address.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` with a non-empty host and a numeric port.
fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
