//! Protected data sources.
//!
//! # Responsibilities
//! - Define the capability the gateway guards (`ProtectedOperation`)
//! - Provide a static source and an HTTP upstream source
//!
//! # Design Decisions
//! - Object-safe trait returning a boxed future, so sources can be swapped at startup
//! - Non-2xx upstream responses are failures; the body is treated as opaque text
//! - No timeout here; the breaker owns the call deadline

use std::sync::Arc;

use axum::body::Body;
use futures_util::future::BoxFuture;
use hyper::{Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::{DataSourceConfig, DataSourceKind};

/// Largest upstream body accepted, in bytes.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Failures of a protected data source.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Data source is misconfigured.
    #[error("invalid data source: {0}")]
    Config(String),

    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Body could not be read or was not UTF-8.
    #[error("invalid body: {0}")]
    Body(String),

    /// The source reported itself unavailable.
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

/// The downstream call the gateway protects.
pub trait ProtectedOperation: Send + Sync {
    /// Produce the current value for `key`.
    fn run<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<String, OperationError>>;
}

/// Returns a fixed payload.
#[derive(Debug, Clone)]
pub struct StaticSource {
    payload: String,
}

impl StaticSource {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl ProtectedOperation for StaticSource {
    fn run<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, Result<String, OperationError>> {
        Box::pin(async move { Ok(self.payload.clone()) })
    }
}

/// Fetches the payload from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamSource {
    client: Client<HttpConnector, Body>,
    uri: Uri,
}

impl UpstreamSource {
    pub fn new(url: &str) -> Result<Self, OperationError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| OperationError::Config(format!("'{}': {}", url, e)))?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { client, uri })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl ProtectedOperation for UpstreamSource {
    fn run<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<String, OperationError>> {
        Box::pin(async move {
            let request = Request::builder()
                .method(Method::GET)
                .uri(self.uri.clone())
                .header("user-agent", "resilient-gateway")
                .body(Body::empty())
                .map_err(|e| OperationError::Config(e.to_string()))?;

            tracing::debug!(uri = %self.uri, key = %key, "Fetching from upstream");

            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| OperationError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(OperationError::Status(status.as_u16()));
            }

            let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
                .await
                .map_err(|e| OperationError::Body(e.to_string()))?;
            String::from_utf8(bytes.to_vec()).map_err(|e| OperationError::Body(e.to_string()))
        })
    }
}

/// Build the configured data source.
pub fn build_operation(
    config: &DataSourceConfig,
) -> Result<Arc<dyn ProtectedOperation>, OperationError> {
    match config.kind {
        DataSourceKind::Static => Ok(Arc::new(StaticSource::new(config.payload.clone()))),
        DataSourceKind::Upstream => {
            let url = config.upstream_url.as_deref().ok_or_else(|| {
                OperationError::Config("upstream_url is required for the upstream source".into())
            })?;
            Ok(Arc::new(UpstreamSource::new(url)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::new("Data from backend");
        assert_eq!(source.run("cachedData").await.unwrap(), "Data from backend");
    }

    #[tokio::test]
    async fn test_upstream_connection_refused() {
        // Port 1 on loopback is never listening in CI.
        let source = UpstreamSource::new("http://127.0.0.1:1/data").unwrap();
        let err = source.run("cachedData").await.unwrap_err();
        assert!(matches!(err, OperationError::Transport(_)));
    }

    #[test]
    fn test_build_requires_upstream_url() {
        let config = DataSourceConfig {
            kind: DataSourceKind::Upstream,
            payload: String::new(),
            upstream_url: None,
        };
        assert!(matches!(build_operation(&config), Err(OperationError::Config(_))));

        let config = DataSourceConfig::default();
        assert!(build_operation(&config).is_ok());
    }
}
