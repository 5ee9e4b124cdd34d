use axum::{extract::State, Json};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::http::server::AppState;
use crate::resilience::BreakerSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub resource_key: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        resource_key: state.resource_key.to_string(),
    })
}

pub async fn get_breaker(State(state): State<AppState>) -> Json<BreakerSnapshot> {
    Json(state.gateway.breaker().snapshot())
}

/// Force the breaker back to CLOSED with an empty window.
pub async fn reset_breaker(State(state): State<AppState>) -> Json<BreakerSnapshot> {
    let breaker = state.gateway.breaker();
    breaker.reset();
    tracing::info!(breaker = %breaker.name(), "Breaker reset by operator");
    Json(breaker.snapshot())
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}
