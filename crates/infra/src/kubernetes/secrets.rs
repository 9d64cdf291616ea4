//! Kubernetes secret directory
//!
//! Lists secrets by label selector and decodes the `endpoint` and `token`
//! fields of one secret into an [`AgentType`]. Talks to the API server over
//! plain REST with the pod's service-account token.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use agentmetrics_core::CredentialDirectory;
use agentmetrics_domain::constants::{SECRET_FIELD_ENDPOINT, SECRET_FIELD_TOKEN};
use agentmetrics_domain::{AdapterError, AgentType, KubernetesConfig, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::errors::InfraError;
use crate::http::{HttpClient, HttpClientConfig};

/// Connection settings for [`SecretDirectory`]
#[derive(Clone)]
pub struct SecretDirectoryConfig {
    pub api_url: String,
    pub namespace: String,
    /// Bearer token sent to the API server, if any.
    pub bearer_token: Option<String>,
    /// PEM bundle trusted for the API server certificate.
    pub ca_pem: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl std::fmt::Debug for SecretDirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretDirectoryConfig")
            .field("api_url", &self.api_url)
            .field("namespace", &self.namespace)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("ca_pem", &self.ca_pem.as_ref().map(Vec::len))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SecretDirectoryConfig {
    /// Settings for a pod running inside the cluster: token and CA are read
    /// from the service-account mount.
    ///
    /// # Errors
    /// Returns `AdapterError::Config` if the token or CA file cannot be read.
    pub fn in_cluster(kubernetes: &KubernetesConfig, namespace: &str) -> Result<Self> {
        let bearer_token = read_file(&kubernetes.token_path)?.trim().to_string();
        let ca_pem = read_file(&kubernetes.ca_path)?.into_bytes();

        Ok(Self {
            api_url: kubernetes.api_url.clone(),
            namespace: namespace.to_string(),
            bearer_token: Some(bearer_token),
            ca_pem: Some(ca_pem),
            timeout: Duration::from_secs(10),
        })
    }
}

fn read_file(path: &str) -> Result<String> {
    std::fs::read_to_string(Path::new(path)).map_err(|err| {
        let infra: InfraError = err.into();
        match AdapterError::from(infra) {
            AdapterError::Config(msg) => AdapterError::Config(format!("{path}: {msg}")),
            other => other,
        }
    })
}

#[derive(Debug, Deserialize)]
struct SecretList {
    #[serde(default)]
    items: Vec<Secret>,
}

#[derive(Debug, Deserialize)]
struct Secret {
    metadata: ObjectMeta,
    #[serde(default)]
    data: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
}

impl Secret {
    /// Decode the required fields into a record named after the secret.
    fn into_agent_type(self) -> Result<AgentType> {
        let name = self.metadata.name;
        let endpoint = decode_field(&name, &self.data, SECRET_FIELD_ENDPOINT)?;
        let token = decode_field(&name, &self.data, SECRET_FIELD_TOKEN)?;
        Ok(AgentType::new(name, endpoint, token))
    }
}

fn decode_field(name: &str, data: &BTreeMap<String, String>, field: &str) -> Result<String> {
    let encoded = data
        .get(field)
        .ok_or_else(|| AdapterError::malformed(name, format!("missing field '{field}'")))?;

    let bytes = STANDARD.decode(encoded.trim()).map_err(|err| {
        AdapterError::malformed(name, format!("field '{field}' is not base64: {err}"))
    })?;

    let value = String::from_utf8(bytes)
        .map_err(|_| AdapterError::malformed(name, format!("field '{field}' is not UTF-8")))?;

    if value.trim().is_empty() {
        return Err(AdapterError::malformed(name, format!("field '{field}' is empty")));
    }
    Ok(value)
}

/// [`CredentialDirectory`] over namespaced Kubernetes secrets
#[derive(Clone)]
pub struct SecretDirectory {
    http: HttpClient,
    base_url: Url,
    namespace: String,
    bearer_token: Option<String>,
}

impl SecretDirectory {
    /// # Errors
    /// Returns `AdapterError::Config` for an unparsable API URL or CA bundle.
    pub fn new(config: SecretDirectoryConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url).map_err(|err| {
            AdapterError::Config(format!("invalid Kubernetes API URL '{}': {err}", config.api_url))
        })?;

        let http = HttpClient::new(HttpClientConfig {
            timeout: config.timeout,
            attempts: 2,
            ca_pem: config.ca_pem,
            ..HttpClientConfig::default()
        })?;

        info!(
            api_url = %base_url,
            namespace = %config.namespace,
            "Kubernetes secret directory configured"
        );

        Ok(Self {
            http,
            base_url,
            namespace: config.namespace,
            bearer_token: config.bearer_token,
        })
    }

    fn secrets_url(&self, name: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                AdapterError::Config(format!("Kubernetes API URL cannot be a base: {}", self.base_url))
            })?;
            segments.pop_if_empty().extend([
                "api",
                "v1",
                "namespaces",
                self.namespace.as_str(),
                "secrets",
            ]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let request = self.authorized(self.http.request(Method::GET, url));
        let response = self.http.send(request).await.map_err(unavailable)?;
        let response = check_status(response)?;
        response.json::<T>().await.map_err(|err| {
            AdapterError::DirectoryUnavailable(format!("invalid Kubernetes API response: {err}"))
        })
    }
}

fn unavailable(err: AdapterError) -> AdapterError {
    match err {
        AdapterError::DirectoryUnavailable(_) => err,
        other => AdapterError::DirectoryUnavailable(other.to_string()),
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(AdapterError::DirectoryUnavailable(format!(
        "Kubernetes API returned {} for {}",
        status.as_u16(),
        response.url().path()
    )))
}

#[async_trait]
impl CredentialDirectory for SecretDirectory {
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    async fn list_record_names(&self, label_selector: &str) -> Result<Vec<String>> {
        let mut url = self.secrets_url(None)?;
        url.query_pairs_mut().append_pair("labelSelector", label_selector);

        let list: SecretList = self.get_json(url).await?;
        let names: Vec<String> = list.items.into_iter().map(|secret| secret.metadata.name).collect();

        debug!(count = names.len(), "Listed agent type secrets");
        Ok(names)
    }

    #[instrument(skip(self), fields(namespace = %self.namespace))]
    async fn get_record(&self, name: &str) -> Result<AgentType> {
        let secret: Secret = self.get_json(self.secrets_url(Some(name))?).await?;
        secret.into_agent_type()
    }
}
