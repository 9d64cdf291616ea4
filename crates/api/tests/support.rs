//! Shared fixtures for router tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use agentmetrics_core::{CredentialDirectory, MetricsSource, RecordResolver};
use agentmetrics_domain::{AdapterError, AgentType, RawMetrics, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

/// In-memory directory of fixed records.
pub struct FixedDirectory {
    records: Vec<AgentType>,
}

impl FixedDirectory {
    pub fn new(records: Vec<AgentType>) -> Arc<Self> {
        Arc::new(Self { records })
    }
}

#[async_trait]
impl CredentialDirectory for FixedDirectory {
    async fn list_record_names(&self, _label_selector: &str) -> Result<Vec<String>> {
        Ok(self.records.iter().map(|record| record.name.clone()).collect())
    }

    async fn get_record(&self, name: &str) -> Result<AgentType> {
        self.records
            .iter()
            .find(|record| record.name == name)
            .cloned()
            .ok_or_else(|| AdapterError::DirectoryUnavailable(format!("no record {name}")))
    }
}

#[async_trait]
impl RecordResolver for FixedDirectory {
    async fn resolve(&self, name: &str) -> Result<AgentType> {
        self.get_record(name).await
    }
}

/// Upstream answering per endpoint; unknown endpoints are unreachable.
#[derive(Default)]
pub struct FixedSource {
    responses: HashMap<String, RawMetrics>,
}

impl FixedSource {
    pub fn with(mut self, endpoint: &str, metrics: RawMetrics) -> Self {
        self.responses.insert(endpoint.to_string(), metrics);
        self
    }
}

#[async_trait]
impl MetricsSource for FixedSource {
    async fn fetch(&self, endpoint: &str, _token: &str) -> Result<RawMetrics> {
        self.responses
            .get(endpoint)
            .copied()
            .ok_or_else(|| AdapterError::UpstreamUnreachable(endpoint.to_string()))
    }
}

/// Send a GET through the router and decode the body.
pub async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request should build"))
        .await
        .expect("router is infallible");

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, body.to_vec())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    let json = serde_json::from_slice(&body).expect("body should be JSON");
    (status, json)
}
