//! Response construction.
//!
//! # Responsibilities
//! - Render gateway values as plain text with their source header
//! - Map discovery failures to HTTP status codes
//!
//! # Design Decisions
//! - Gateway responses are always 200; `x-gateway-source` tells fallback apart
//! - No instance → 503, instance unreachable or failing → 502

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::discovery::DiscoveryError;
use crate::gateway::Fetched;

pub const X_GATEWAY_SOURCE: &str = "x-gateway-source";

/// 200 text/plain body with the source header.
pub fn fetched_response(fetched: Fetched) -> Response {
    let mut response = (StatusCode::OK, fetched.value).into_response();
    response.headers_mut().insert(
        X_GATEWAY_SOURCE,
        HeaderValue::from_static(fetched.source.as_str()),
    );
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

/// Status code for a discovery failure.
pub fn discovery_status(err: &DiscoveryError) -> StatusCode {
    match err {
        DiscoveryError::NoInstanceAvailable(_) | DiscoveryError::Registry(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        DiscoveryError::Request { source, .. } if source.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        DiscoveryError::Request { .. } | DiscoveryError::Status { .. } => StatusCode::BAD_GATEWAY,
        DiscoveryError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn discovery_error_response(err: &DiscoveryError) -> Response {
    (discovery_status(err), err.to_string()).into_response()
}
