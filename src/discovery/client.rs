//! Discovery client: resolve a logical name, then call the chosen instance.

use std::sync::Arc;
use std::time::Duration;

use crate::config::DiscoveryConfig;
use crate::discovery::registry::{ServiceInstance, ServiceRegistry};
use crate::discovery::selector::{policy_for, SelectionPolicy};
use crate::discovery::DiscoveryError;
use crate::observability::metrics;

/// Path served by the gateway.
pub const DATA_PATH: &str = "/api/data";

/// Resolves service names through a registry and issues outbound calls.
pub struct DiscoveryClient {
    registry: Arc<dyn ServiceRegistry>,
    policy: Box<dyn SelectionPolicy>,
    http: reqwest::Client,
    only_healthy: bool,
}

impl DiscoveryClient {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        policy: Box<dyn SelectionPolicy>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            registry,
            policy,
            http,
            only_healthy: false,
        }
    }

    /// Build from configuration with a timeout-bounded HTTP client.
    pub fn from_config(
        config: &DiscoveryConfig,
        registry: Arc<dyn ServiceRegistry>,
    ) -> Result<Self, DiscoveryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .no_proxy()
            .build()
            .map_err(DiscoveryError::Client)?;

        Ok(Self::new(registry, policy_for(config.strategy), http).with_only_healthy(config.only_healthy))
    }

    /// Skip instances the registry reports unhealthy.
    pub fn with_only_healthy(mut self, only_healthy: bool) -> Self {
        self.only_healthy = only_healthy;
        self
    }

    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// Pick one instance of `service_name`.
    pub async fn resolve(&self, service_name: &str) -> Result<ServiceInstance, DiscoveryError> {
        let mut instances = self.registry.list_instances(service_name).await?;
        if self.only_healthy {
            instances.retain(|i| i.healthy);
        }

        match self.policy.select(service_name, &instances) {
            Some(instance) => {
                tracing::debug!(service = %service_name, address = %instance.address, "Resolved instance");
                metrics::record_resolution(service_name, "resolved");
                Ok(instance.clone())
            }
            None => {
                tracing::warn!(service = %service_name, "No instance available");
                metrics::record_resolution(service_name, "no_instance");
                Err(DiscoveryError::NoInstanceAvailable(service_name.to_string()))
            }
        }
    }

    /// Resolve `service_name` and GET `path` on it, returning the body text.
    ///
    /// Failures propagate; there is no fallback at this layer.
    pub async fn get_text(
        &self,
        service_name: &str,
        path: &str,
        request_id: Option<&str>,
    ) -> Result<String, DiscoveryError> {
        let instance = self.resolve(service_name).await?;
        let url = format!("{}{}", instance.base_url(), path);

        let mut request = self.http.get(&url);
        if let Some(id) = request_id {
            request = request.header("x-request-id", id);
        }

        let response = request.send().await.map_err(|source| DiscoveryError::Request {
            address: instance.address.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                address: instance.address,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| DiscoveryError::Request {
            address: instance.address,
            source,
        })
    }

    /// GET `/api/data` on an instance of `service_name`.
    pub async fn fetch_data(&self, service_name: &str) -> Result<String, DiscoveryError> {
        self.get_text(service_name, DATA_PATH, None).await
    }
}
