//! Service registry view.
//!
//! # Responsibilities
//! - Answer `list_instances(service)` for the discovery client
//! - Hold a refreshable, read-mostly snapshot of the registry contents
//!
//! # Design Decisions
//! - Registration and heartbeats belong to the external provider; this side only reads
//! - The static registry swaps whole snapshots (`arc-swap`), readers never block
//! - No health filtering here; callers decide whether to honour `healthy`

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::ServiceEntry;
use crate::discovery::DiscoveryError;

/// One live instance of a logical service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub service_name: String,
    /// `host:port`
    pub address: String,
    pub healthy: bool,
}

impl ServiceInstance {
    pub fn new(service_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            address: address.into(),
            healthy: true,
        }
    }

    /// `http://host:port`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }
}

impl From<&ServiceEntry> for ServiceInstance {
    fn from(entry: &ServiceEntry) -> Self {
        Self {
            service_name: entry.name.clone(),
            address: entry.address.clone(),
            healthy: entry.healthy,
        }
    }
}

/// Source of live instances for a service name.
pub trait ServiceRegistry: Send + Sync {
    /// All known instances of `service_name`, healthy or not.
    fn list_instances<'a>(
        &'a self,
        service_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ServiceInstance>, DiscoveryError>>;

    /// Names of all registered services.
    fn services(&self) -> BoxFuture<'_, Result<Vec<String>, DiscoveryError>>;
}

type Snapshot = HashMap<String, Vec<ServiceInstance>>;

/// Registry backed by configuration entries, replaceable at runtime.
#[derive(Debug)]
pub struct StaticRegistry {
    snapshot: ArcSwap<Snapshot>,
}

impl StaticRegistry {
    pub fn new(entries: &[ServiceEntry]) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(group(entries)),
        }
    }

    /// Swap in a new set of entries.
    pub fn replace(&self, entries: &[ServiceEntry]) {
        let next = group(entries);
        tracing::info!(
            services = next.len(),
            instances = entries.len(),
            "Registry view refreshed"
        );
        self.snapshot.store(Arc::new(next));
    }

    /// Instances of `service_name` in the current snapshot.
    pub fn instances(&self, service_name: &str) -> Vec<ServiceInstance> {
        self.snapshot
            .load()
            .get(service_name)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::new(&[])
    }
}

fn group(entries: &[ServiceEntry]) -> Snapshot {
    let mut map: Snapshot = HashMap::new();
    for entry in entries {
        map.entry(entry.name.clone())
            .or_default()
            .push(ServiceInstance::from(entry));
    }
    map
}

impl ServiceRegistry for StaticRegistry {
    fn list_instances<'a>(
        &'a self,
        service_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ServiceInstance>, DiscoveryError>> {
        Box::pin(async move { Ok(self.instances(service_name)) })
    }

    fn services(&self) -> BoxFuture<'_, Result<Vec<String>, DiscoveryError>> {
        Box::pin(async move {
            let mut names: Vec<String> = self.snapshot.load().keys().cloned().collect();
            names.sort();
            Ok(names)
        })
    }
}
