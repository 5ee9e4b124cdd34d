//! End-to-end tests for the gateway HTTP surface.

use resilient_gateway::config::GatewayConfig;
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_origin_then_cache() {
    let backend = common::start_mock_backend("fresh data").await;
    let (gateway, shutdown) = common::start_gateway(common::upstream_config(backend.addr)).await;
    let client = common::client();
    let url = format!("http://{}/api/data", gateway);

    let first = client.get(&url).send().await.expect("Gateway unreachable");
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers()["x-gateway-source"], "origin");
    assert!(first.headers().contains_key("x-request-id"));
    assert_eq!(first.text().await.unwrap(), "fresh data");

    let second = client.get(&url).send().await.unwrap();
    assert_eq!(second.headers()["x-gateway-source"], "cache");
    assert_eq!(second.text().await.unwrap(), "fresh data");

    assert_eq!(backend.hits(), 1, "Cache hit must not reach the upstream");
    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_serves_fallback() {
    let dead = common::dead_address().await;
    let (gateway, shutdown) = common::start_gateway(common::upstream_config(dead)).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/api/data", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-gateway-source"], "fallback");
    assert_eq!(
        res.text().await.unwrap(),
        "service unavailable — returning fallback response"
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_breaker_opens_and_stops_upstream_calls() {
    let backend = common::start_programmable_backend(|_| async { (500, "boom".into()) }).await;
    let (gateway, shutdown) = common::start_gateway(common::upstream_config(backend.addr)).await;
    let client = common::client();
    let url = format!("http://{}/api/data", gateway);

    // minimum_calls = 2: two failures trip the breaker.
    for _ in 0..5 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["x-gateway-source"], "fallback");
    }
    assert_eq!(backend.hits(), 2);

    let breaker: Value = client
        .get(format!("http://{}/admin/breaker", gateway))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(breaker["phase"], "OPEN");

    // Operator reset closes the breaker and the next miss reaches the upstream.
    let reset: Value = client
        .post(format!("http://{}/admin/breaker/reset", gateway))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reset["phase"], "CLOSED");

    client.get(&url).send().await.unwrap();
    assert_eq!(backend.hits(), 3);
    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_requires_key() {
    let (gateway, shutdown) = common::start_gateway(common::upstream_config(
        common::dead_address().await,
    ))
    .await;
    let client = common::client();
    let url = format!("http://{}/admin/status", gateway);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client.get(&url).bearer_auth("wrong").send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client.get(&url).bearer_auth("test-key").send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["resource_key"], "cachedData");

    let cache: Value = client
        .get(format!("http://{}/admin/cache", gateway))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cache["entries"], 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_disabled_by_default() {
    let (gateway, shutdown) = common::start_gateway(GatewayConfig::default()).await;
    let res = common::client()
        .get(format!("http://{}/admin/status", gateway))
        .bearer_auth("CHANGE_ME_IN_PRODUCTION")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    shutdown.trigger();
}

#[tokio::test]
async fn test_static_source_and_health() {
    let (gateway, shutdown) = common::start_gateway(GatewayConfig::default()).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/api/data", gateway))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-42");
    assert_eq!(res.text().await.unwrap(), "Data from backend");

    let res = client.get(format!("http://{}/health", gateway)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    shutdown.trigger();
}

#[tokio::test]
async fn test_product_store() {
    let (gateway, shutdown) = common::start_gateway(GatewayConfig::default()).await;
    let client = common::client();

    let saved: Value = client
        .post(format!("http://{}/api/products", gateway))
        .json(&serde_json::json!({ "name": "keyboard" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = saved["id"].as_str().unwrap().to_string();
    assert_eq!(saved["name"], "keyboard");

    let found: Value = client
        .get(format!("http://{}/api/products/{}", gateway, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found, saved);

    let missing = client
        .get(format!("http://{}/api/products/nope", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    shutdown.trigger();
}
