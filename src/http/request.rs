//! Request identification.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) to every inbound request lacking one
//! - Echo the ID on the response
//! - Let handlers forward the ID on outbound calls
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)
//! - An ID supplied by the caller is kept, so one ID spans both services

use axum::http::HeaderMap;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that sets `x-request-id` when missing.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// The request ID carried in `headers`, if any.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}
