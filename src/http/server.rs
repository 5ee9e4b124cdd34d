//! Gateway HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble cache, breaker and data source into the gateway
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve until the shutdown signal, then snapshot the cache

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::cache::MemoryCache;
use crate::catalog::{DocumentStore, Product};
use crate::config::schema::AdminConfig;
use crate::config::GatewayConfig;
use crate::gateway::{build_operation, OperationError, ProtectedOperation, ResilientGateway};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::fetched_response;
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, Clock, SystemClock};

/// Errors while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cache snapshot error: {0}")]
    Cache(#[from] std::io::Error),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: ResilientGateway,
    pub cache: MemoryCache,
    pub products: DocumentStore,
    pub resource_key: Arc<str>,
    pub admin: Arc<AdminConfig>,
    pub started_at: Instant,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server using the configured data source.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let operation = build_operation(&config.data_source)?;
        Self::with_operation(config, operation, Arc::new(SystemClock))
    }

    /// Create a server around an explicit data source and clock.
    pub fn with_operation(
        config: GatewayConfig,
        operation: Arc<dyn ProtectedOperation>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServerError> {
        let cache = MemoryCache::from_config(&config.cache, clock.clone())?;
        let breaker = Arc::new(CircuitBreaker::new(config.breaker.clone(), clock));
        let gateway = ResilientGateway::new(
            Arc::new(cache.clone()),
            breaker,
            operation,
            config.gateway.fallback_message.clone(),
        );

        let state = AppState {
            gateway,
            cache,
            products: DocumentStore::new(),
            resource_key: Arc::from(config.gateway.resource_key.as_str()),
            admin: Arc::new(config.admin.clone()),
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/api/data", get(get_data))
            .route("/api/products", post(create_product))
            .route("/api/products/{id}", get(get_product))
            .route("/health", get(health));

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state.clone()));
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            breaker = %self.config.breaker.name,
            resource_key = %self.config.gateway.resource_key,
            "Gateway HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Gateway received shutdown signal");
            })
            .await?;

        if let Err(e) = self.state.cache.save_snapshot() {
            tracing::error!(error = %e, "Failed to save cache snapshot");
        }

        tracing::info!("Gateway HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// `GET /api/data`: always 200, real or fallback content.
async fn get_data(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let fetched = state.gateway.fetch_with_source(&state.resource_key).await;

    tracing::debug!(
        request_id = request_id(&headers).unwrap_or("unknown"),
        source = fetched.source.as_str(),
        "Served data"
    );
    metrics::record_request("GET", "/api/data", 200, start);
    fetched_response(fetched)
}

async fn create_product(
    State(state): State<AppState>,
    Json(product): Json<Product>,
) -> Json<Product> {
    let saved = state.products.save(product);
    tracing::debug!(id = ?saved.id, "Product stored");
    Json(saved)
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.products.find_by_id(&id) {
        Some(product) => Json(product).into_response(),
        None => (StatusCode::NOT_FOUND, "Product not found").into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}
