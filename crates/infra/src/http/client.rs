use std::time::Duration;

use agentmetrics_domain::AdapterError;
use reqwest::{Certificate, Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("agentmetrics-adapter/", env!("CARGO_PKG_VERSION"));

/// Settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout, connect included.
    pub timeout: Duration,
    /// Total attempts for a request; `1` disables retries.
    pub attempts: usize,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Extra PEM root to trust, such as the cluster CA.
    pub ca_pem: Option<Vec<u8>>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            attempts: 1,
            retry_delay: Duration::from_millis(200),
            ca_pem: None,
        }
    }
}

/// reqwest client that repeats a request after a transport failure or a
/// server error, up to a fixed number of attempts.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    attempts: usize,
    retry_delay: Duration,
}

impl HttpClient {
    /// # Errors
    /// Returns `AdapterError::Config` for an unparsable CA bundle, or the
    /// mapped reqwest error if the client cannot be built.
    pub fn new(config: HttpClientConfig) -> Result<Self, AdapterError> {
        let mut builder =
            ReqwestClient::builder().timeout(config.timeout).user_agent(USER_AGENT).no_proxy();

        if let Some(pem) = config.ca_pem {
            let certificate = Certificate::from_pem(&pem)
                .map_err(|err| AdapterError::Config(format!("invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder.build().map_err(|err| AdapterError::from(InfraError::from(err)))?;

        Ok(Self { client, attempts: config.attempts.max(1), retry_delay: config.retry_delay })
    }

    /// Start a request on the shared connection pool.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder`, repeating on connection failures and 5xx responses.
    ///
    /// The last response is returned whatever its status; classifying it is
    /// up to the caller.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, AdapterError> {
        let mut attempt = 1;
        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| AdapterError::Internal("request body is not cloneable".into()))?
                .build()
                .map_err(|err| AdapterError::from(InfraError::from(err)))?;
            let url = redact_query(request.url());
            let last = attempt >= self.attempts;

            match self.client.execute(request).await {
                Ok(response) if last || !response.status().is_server_error() => {
                    debug!(attempt, %url, status = %response.status(), "HTTP response");
                    return Ok(response);
                }
                Ok(response) => {
                    debug!(attempt, %url, status = %response.status(), "Server error, retrying");
                }
                Err(err) if last || !is_transient(&err) => {
                    debug!(attempt, %url, error = %err, "HTTP request failed");
                    return Err(AdapterError::from(InfraError::from(err)));
                }
                Err(err) => {
                    debug!(attempt, %url, error = %err, "Transport error, retrying");
                }
            }

            attempt += 1;
            if !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// URL without its query string, for logs.
fn redact_query(url: &url::Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
