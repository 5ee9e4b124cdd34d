//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use resilient_gateway::config::schema::CallerConfig;
use resilient_gateway::config::{DataSourceKind, GatewayConfig, ServiceEntry};
use resilient_gateway::discovery::{DiscoveryClient, StaticRegistry};
use resilient_gateway::{CallerServer, HttpServer, Shutdown};

/// A raw-TCP HTTP backend that counts the requests it answers.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a mock backend that returns a fixed 200 response.
pub async fn start_mock_backend(response: &'static str) -> MockBackend {
    start_programmable_backend(move |_| async move { (200, response.to_string()) }).await
}

/// Start a mock backend whose reply depends on the request number (0-based).
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn(usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let f = Arc::new(f);

    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let f = f.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = f(n).await;
                respond(socket, status, &body).await;
            });
        }
    });

    MockBackend { addr, hits }
}

async fn respond(mut socket: TcpStream, status: u16, body: &str) {
    // Drain the request head so closing the socket does not reset it.
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// An address on loopback with nothing listening.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway config reading from `upstream`, with a small breaker window.
pub fn upstream_config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.data_source.kind = DataSourceKind::Upstream;
    config.data_source.upstream_url = Some(format!("http://{}/data", upstream));
    config.breaker.minimum_calls = 2;
    config.breaker.sliding_window_size = 4;
    config.breaker.call_timeout_ms = 500;
    config.admin.enabled = true;
    config.admin.api_key = "test-key".into();
    config
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// Start a caller service resolving `backend-service` to `instances`.
pub async fn start_caller(instances: &[SocketAddr]) -> (SocketAddr, Shutdown) {
    let entries: Vec<ServiceEntry> = instances
        .iter()
        .map(|addr| ServiceEntry {
            name: "backend-service".into(),
            address: addr.to_string(),
            healthy: true,
        })
        .collect();

    let mut config = GatewayConfig::default();
    config.discovery.services = entries;
    config.discovery.request_timeout_secs = 2;

    let registry = Arc::new(StaticRegistry::new(&config.discovery.services));
    let discovery = Arc::new(DiscoveryClient::from_config(&config.discovery, registry).unwrap());
    let server = CallerServer::new(&CallerConfig::default(), Duration::from_secs(5), discovery);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
