//! Caller service HTTP surface.
//!
//! # Responsibilities
//! - Forward `/api/data` to an instance chosen through discovery
//! - Expose the registry view (`/services`, `/service-instances`)
//!
//! # Design Decisions
//! - No fallback here: discovery and outbound failures map to 5xx
//! - The inbound request ID travels on the outbound call

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::CallerConfig;
use crate::discovery::{DiscoveryClient, ServiceInstance};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::discovery_error_response;
use crate::observability::metrics;

#[derive(Clone)]
pub struct CallerState {
    pub discovery: Arc<DiscoveryClient>,
    pub target_service: Arc<str>,
    pub target_path: Arc<str>,
}

#[derive(Debug, Deserialize)]
pub struct InstancesQuery {
    #[serde(rename = "serviceId")]
    pub service_id: String,
}

/// HTTP server for the discovery caller.
pub struct CallerServer {
    router: Router,
    target_service: Arc<str>,
}

impl CallerServer {
    pub fn new(caller: &CallerConfig, request_timeout: Duration, discovery: Arc<DiscoveryClient>) -> Self {
        let state = CallerState {
            discovery,
            target_service: Arc::from(caller.target_service.as_str()),
            target_path: Arc::from(caller.target_path.as_str()),
        };
        let target_service = state.target_service.clone();

        Self {
            router: Self::build_router(state, request_timeout),
            target_service,
        }
    }

    #[allow(deprecated)]
    fn build_router(state: CallerState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/api/data", get(forward_data))
            .route("/services", get(list_services))
            .route("/service-instances", get(list_instances))
            .route("/health", get(health))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            target_service = %self.target_service,
            "Caller HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Caller received shutdown signal");
            })
            .await?;

        tracing::info!("Caller HTTP server stopped");
        Ok(())
    }
}

async fn forward_data(State(state): State<CallerState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let result = state
        .discovery
        .get_text(&state.target_service, &state.target_path, request_id(&headers))
        .await;

    match result {
        Ok(body) => {
            metrics::record_request("GET", "/api/data", 200, start);
            body.into_response()
        }
        Err(e) => {
            tracing::warn!(service = %state.target_service, error = %e, "Discovery call failed");
            let response = discovery_error_response(&e);
            metrics::record_request("GET", "/api/data", response.status().as_u16(), start);
            response
        }
    }
}

async fn list_services(State(state): State<CallerState>) -> Response {
    match state.discovery.registry().services().await {
        Ok(names) => Json(names).into_response(),
        Err(e) => discovery_error_response(&e),
    }
}

async fn list_instances(
    State(state): State<CallerState>,
    Query(query): Query<InstancesQuery>,
) -> Result<Json<Vec<ServiceInstance>>, Response> {
    state
        .discovery
        .registry()
        .list_instances(&query.service_id)
        .await
        .map(Json)
        .map_err(|e| discovery_error_response(&e))
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
