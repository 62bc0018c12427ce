use estransport_types::models::TransportConfig;
use estransport_types::TransportError;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{Client, Request};
use crate::connection::Connection;
use crate::pool::{ConnectionPool, StatusConnectionPool};
use crate::selector::Selector;

/// Address of a port nothing listens on.
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn config_for(urls: Vec<String>) -> TransportConfig {
    let mut config = TransportConfig::with_urls(urls);
    config.request_timeout_secs = Some(5);
    config
}

fn client_for(urls: Vec<String>) -> Arc<Client> {
    Client::new(config_for(urls)).unwrap()
}

#[tokio::test]
async fn test_perform_reaches_node_and_keeps_it_alive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .and(query_param("level", "indices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "green"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(vec![server.uri()]);
    let request = Request::get("/_cluster/health").with_query("level", "indices");
    let response = client.perform(&request).await.unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "green");
    assert_eq!(client.stats().alive, 1);
}

#[tokio::test]
async fn test_error_status_does_not_mark_dead() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(vec![server.uri()]);
    let response = client.perform(&Request::get("/")).await.unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(client.stats().dead, 0);
}

#[tokio::test]
async fn test_refused_connection_marks_dead() {
    let client = client_for(vec![unreachable_url()]);

    let err = client.perform(&Request::get("/")).await.unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }), "unexpected error: {err:?}");

    let stats = client.stats();
    assert_eq!(stats.dead, 1);
    assert_eq!(stats.connections[0].failures, 1);

    // Sole connection is still handed out while it backs off.
    let err = client.perform(&Request::get("/")).await.unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }));
    assert_eq!(client.stats().connections[0].failures, 2);
}

#[tokio::test]
async fn test_retry_fails_over_to_next_node() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dead = unreachable_url();
    let client = client_for(vec![dead.clone(), server.uri()]);

    let response = client.perform_with_retry(&Request::get("/_search")).await.unwrap();
    assert_eq!(response.status(), 200);

    let stats = client.stats();
    assert_eq!(stats.alive, 1);
    assert_eq!(stats.dead, 1);
    assert!(stats.connections[0].is_dead);
    assert!(stats.connections[0].url.starts_with(&dead));
}

#[tokio::test]
async fn test_retry_on_unavailable_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(vec![server.uri()]);
    let response = client.perform_with_retry(&Request::get("/")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(client.stats().dead, 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_retry_disabled_is_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(vec![server.uri()]);
    config.retry.disabled = true;
    let client = Client::new(config).unwrap();

    let response = client.perform_with_retry(&Request::get("/")).await.unwrap();
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn test_retry_exhaustion_returns_last_error() {
    let mut config = config_for(vec![unreachable_url(), unreachable_url()]);
    config.retry.max_retries = 1;
    let client = Client::new(config).unwrap();

    let err = client.perform_with_retry(&Request::get("/")).await.unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }));
    assert_eq!(client.stats().dead, 2);
}

#[tokio::test]
async fn test_empty_pool_fails_fast() {
    let client = Client::builder(TransportConfig::default())
        .pool_factory(Arc::new(
            |_: Vec<Connection>, selector: Arc<dyn Selector>| -> Arc<dyn ConnectionPool> {
                Arc::new(StatusConnectionPool::new(Vec::new(), selector))
            },
        ))
        .build()
        .unwrap();

    let err = client.perform(&Request::get("/")).await.unwrap_err();
    assert_eq!(err, TransportError::NoConnectionAvailable);

    let err = client.perform_with_retry(&Request::get("/")).await.unwrap_err();
    assert_eq!(err, TransportError::NoConnectionAvailable);
}

#[tokio::test]
async fn test_api_key_and_json_body_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logs/_doc"))
        .and(header("authorization", "ApiKey a2V5"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"message": "hello"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(vec![server.uri()]);
    config.api_key = Some("a2V5".to_string());
    let client = Client::new(config).unwrap();

    let request = Request::post("logs/_doc").with_json(&json!({"message": "hello"})).unwrap();
    let response = client.perform(&request).await.unwrap();
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_discovery_lifecycle() {
    let mut config = TransportConfig::default();
    config.discovery.enabled = true;
    config.discovery.interval_secs = 3600;
    config.discovery.on_start = false;

    let client = Client::new(config).unwrap();
    assert!(client.is_discovery_scheduled());
    assert!(!client.start_discovery(), "second start must be a no-op");

    client.shutdown().await;
    assert!(!client.is_discovery_scheduled());

    assert!(client.start_discovery());
    assert!(client.stop_discovery());
    assert!(!client.stop_discovery());
}

#[test]
fn test_discovery_not_scheduled_without_runtime() {
    let mut config = TransportConfig::default();
    config.discovery.enabled = true;

    let client = Client::new(config).unwrap();
    assert!(!client.is_discovery_scheduled());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = TransportConfig::with_urls(["ftp://es-1:21"]);
    assert!(matches!(Client::new(config), Err(crate::Error::Config(_))));
}
