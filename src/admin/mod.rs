//! Administrative API.
//!
//! Operator-facing endpoints for inspecting and resetting the gateway's
//! resilience state. Every route sits behind bearer-key authentication.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/breaker", get(get_breaker))
        .route("/admin/breaker/reset", post(reset_breaker))
        .route("/admin/cache", get(get_cache))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
