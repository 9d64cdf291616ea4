//! Client for the self-hosted agent metrics endpoint
//!
//! One request per agent type per cycle:
//! `GET {scheme}://{endpoint}/api/v1/self_hosted_agents/metrics` with
//! `Authorization: Token {token}`. Only a 200 response is decoded.

use std::time::Duration;

use agentmetrics_core::MetricsSource;
use agentmetrics_domain::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, UPSTREAM_METRICS_PATH};
use agentmetrics_domain::{AdapterError, RawMetrics, Result, UpstreamScheme};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::errors::InfraError;
use crate::http::{HttpClient, HttpClientConfig};

/// Configuration for [`SemaphoreClient`]
#[derive(Debug, Clone)]
pub struct SemaphoreClientConfig {
    /// `http` for local mocks, `https` in production.
    pub scheme: UpstreamScheme,
    /// Socket-level timeout; the aggregator applies its own deadline on top.
    pub timeout: Duration,
}

impl Default for SemaphoreClientConfig {
    fn default() -> Self {
        Self {
            scheme: UpstreamScheme::Https,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Upstream metrics client implementing [`MetricsSource`]
#[derive(Clone)]
pub struct SemaphoreClient {
    http: HttpClient,
    scheme: UpstreamScheme,
}

impl SemaphoreClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: SemaphoreClientConfig) -> Result<Self> {
        // A failed fetch is retried by the next poll cycle, not here.
        let http = HttpClient::new(HttpClientConfig {
            timeout: config.timeout,
            attempts: 1,
            ..HttpClientConfig::default()
        })?;
        Ok(Self { http, scheme: config.scheme })
    }

    /// Metrics URL for an agent type's `host[:port]` endpoint.
    pub fn metrics_url(&self, endpoint: &str) -> Result<Url> {
        let raw = format!("{}://{}{}", self.scheme, endpoint.trim_end_matches('/'), UPSTREAM_METRICS_PATH);
        Url::parse(&raw).map_err(|err| {
            AdapterError::UpstreamUnreachable(format!("invalid endpoint '{endpoint}': {err}"))
        })
    }
}

#[async_trait]
impl MetricsSource for SemaphoreClient {
    #[instrument(skip(self, token), fields(endpoint = %endpoint))]
    async fn fetch(&self, endpoint: &str, token: &str) -> Result<RawMetrics> {
        let url = self.metrics_url(endpoint)?;

        let request =
            self.http.request(Method::GET, url).header(AUTHORIZATION, format!("Token {token}"));
        let response = self.http.send(request).await?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "Upstream rejected metrics request");
            return Err(AdapterError::UpstreamRejected { status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|err| {
            let infra: InfraError = err.into();
            match AdapterError::from(infra) {
                AdapterError::UpstreamUnreachable(msg) => AdapterError::UpstreamMalformed(msg),
                other => other,
            }
        })?;

        let metrics: RawMetrics = serde_json::from_slice(&body).map_err(InfraError::from)?;
        Ok(metrics)
    }
}
