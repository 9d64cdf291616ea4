//! Shared fixtures for infra integration tests: a fake Kubernetes API and
//! fake upstream agent metrics APIs, both served by wiremock.

#![allow(dead_code)]

use std::time::Duration;

use agentmetrics_domain::constants::UPSTREAM_METRICS_PATH;
use agentmetrics_domain::UpstreamScheme;
use agentmetrics_infra::{
    SecretDirectory, SecretDirectoryConfig, SemaphoreClient, SemaphoreClientConfig,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NAMESPACE: &str = "semaphore";
pub const SA_TOKEN: &str = "sa-token";

/// Secret object as the API server returns it.
pub fn secret_json(name: &str, endpoint: &str, token: &str) -> Value {
    json!({
        "metadata": {
            "name": name,
            "labels": {"semaphore-agent/autoscaled": "true"}
        },
        "type": "Opaque",
        "data": {
            "endpoint": STANDARD.encode(endpoint),
            "token": STANDARD.encode(token),
        }
    })
}

/// Metrics body the upstream API returns.
pub fn metrics_json(idle: u64, occupied: u64, queued: u64, running: u64) -> Value {
    json!({
        "Jobs": {"Queued": queued, "Running": running},
        "Agents": {"Idle": idle, "Occupied": occupied}
    })
}

/// `host:port` of a mock server, the form secrets store endpoints in.
pub fn endpoint_of(server: &MockServer) -> String {
    server.address().to_string()
}

/// Mount a secret list answering the autoscaled selector.
pub async fn mount_secret_list(k8s: &MockServer, secrets: &[Value]) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/namespaces/{NAMESPACE}/secrets")))
        .and(query_param("labelSelector", "semaphore-agent/autoscaled=true"))
        .and(header("Authorization", format!("Bearer {SA_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "SecretList",
            "apiVersion": "v1",
            "items": secrets,
        })))
        .mount(k8s)
        .await;
}

/// Mount a single secret fetch, returning how many times it may be hit.
pub async fn mount_secret(k8s: &MockServer, secret: Value, expected_calls: u64) {
    let name = secret["metadata"]["name"].as_str().unwrap_or_default().to_string();
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/namespaces/{NAMESPACE}/secrets/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret))
        .expect(expected_calls)
        .mount(k8s)
        .await;
}

/// Start an upstream answering `token` with `body` and `status`.
pub async fn upstream(token: &str, status: u16, body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(UPSTREAM_METRICS_PATH))
        .and(header("Authorization", format!("Token {token}").as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

pub fn secret_directory(k8s: &MockServer) -> SecretDirectory {
    SecretDirectory::new(SecretDirectoryConfig {
        api_url: k8s.uri(),
        namespace: NAMESPACE.into(),
        bearer_token: Some(SA_TOKEN.into()),
        ca_pem: None,
        timeout: Duration::from_secs(2),
    })
    .expect("secret directory should build")
}

pub fn plain_http_client() -> SemaphoreClient {
    SemaphoreClient::new(SemaphoreClientConfig {
        scheme: UpstreamScheme::Http,
        timeout: Duration::from_secs(2),
    })
    .expect("semaphore client should build")
}
