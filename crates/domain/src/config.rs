//! Adapter configuration structures
//!
//! Loading (environment, files) lives in `agentmetrics-infra::config`; this
//! module only defines the shape, defaults and validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AGENT_TYPE_NAME, DEFAULT_BIND_ADDRESS, DEFAULT_CACHE_MAX_CAPACITY,
    DEFAULT_CACHE_TTL_SECS, DEFAULT_KUBERNETES_API_URL, DEFAULT_NAMESPACE,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE_ACCOUNT_CA_PATH,
    DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH,
};
use crate::errors::{AdapterError, Result};
use crate::impl_name_conversions;

/// Where agent type credentials come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectoryMode {
    /// Labeled secrets in a Kubernetes namespace.
    #[default]
    Kubernetes,
    /// One fixed record taken from the environment.
    SingleTenant,
}

impl_name_conversions!(DirectoryMode {
    Kubernetes => "kubernetes",
    SingleTenant => "single-tenant",
});

/// Scheme used to reach the upstream metrics API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamScheme {
    Http,
    #[default]
    Https,
}

impl_name_conversions!(UpstreamScheme {
    Http => "http",
    Https => "https",
});

/// Top-level adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Where agent type credentials come from.
    pub mode: DirectoryMode,
    /// Namespace holding the agent type secrets.
    pub namespace: String,
    pub kubernetes: KubernetesConfig,
    /// Present only in single-tenant mode.
    pub single_tenant: Option<SingleTenantConfig>,
    pub upstream: UpstreamConfig,
    pub poll: PollConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            mode: DirectoryMode::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            kubernetes: KubernetesConfig::default(),
            single_tenant: None,
            upstream: UpstreamConfig::default(),
            poll: PollConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Access to the Kubernetes API from inside the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    pub api_url: String,
    /// Service account token file.
    pub token_path: String,
    /// Cluster CA bundle.
    pub ca_path: String,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_KUBERNETES_API_URL.to_string(),
            token_path: DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH.to_string(),
            ca_path: DEFAULT_SERVICE_ACCOUNT_CA_PATH.to_string(),
        }
    }
}

/// Single-tenant credentials (`SEMAPHORE_ENDPOINT` / `SEMAPHORE_TOKEN`)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleTenantConfig {
    #[serde(default = "default_agent_type_name")]
    /// Value of the `agent_type` label on served metrics.
    pub agent_type: String,
    /// Organization `host[:port]`.
    pub endpoint: String,
    pub token: String,
}

impl std::fmt::Debug for SingleTenantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleTenantConfig")
            .field("agent_type", &self.agent_type)
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

fn default_agent_type_name() -> String {
    DEFAULT_AGENT_TYPE_NAME.to_string()
}

/// Upstream metrics API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub scheme: UpstreamScheme,
}

/// Poll loop timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Wait between published cycles.
    pub interval_seconds: u64,
    /// Deadline for one upstream fetch.
    pub request_timeout_seconds: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl PollConfig {
    /// [`PollConfig::interval_seconds`] as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// [`PollConfig::request_timeout_seconds`] as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Credential cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached record.
    pub ttl_seconds: u64,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: DEFAULT_CACHE_TTL_SECS, max_capacity: DEFAULT_CACHE_MAX_CAPACITY }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Metrics API listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` to bind.
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: DEFAULT_BIND_ADDRESS.to_string() }
    }
}

impl AdapterConfig {
    /// Reject values the adapter cannot run with.
    ///
    /// # Errors
    /// Returns `AdapterError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(AdapterError::Config("namespace must not be empty".into()));
        }
        if self.poll.interval_seconds == 0 {
            return Err(AdapterError::Config("poll interval must be greater than zero".into()));
        }
        if self.poll.request_timeout_seconds == 0 {
            return Err(AdapterError::Config("request timeout must be greater than zero".into()));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(AdapterError::Config("cache TTL must be greater than zero".into()));
        }
        if self.cache.max_capacity == 0 {
            return Err(AdapterError::Config("cache capacity must be greater than zero".into()));
        }
        if self.server.bind_address.trim().is_empty() {
            return Err(AdapterError::Config("bind address must not be empty".into()));
        }

        if self.mode == DirectoryMode::SingleTenant {
            let tenant = self.single_tenant.as_ref().ok_or_else(|| {
                AdapterError::Config(
                    "single-tenant mode requires SEMAPHORE_ENDPOINT and SEMAPHORE_TOKEN".into(),
                )
            })?;
            if tenant.endpoint.trim().is_empty() || tenant.token.trim().is_empty() {
                return Err(AdapterError::Config(
                    "single-tenant endpoint and token must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AdapterConfig::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.poll.interval(), Duration::from_secs(10));
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.max_capacity, 50);
        assert_eq!(config.upstream.scheme, UpstreamScheme::Https);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_interval_and_capacity() {
        let mut config = AdapterConfig::default();
        config.poll.interval_seconds = 0;
        assert!(matches!(config.validate(), Err(AdapterError::Config(_))));

        let mut config = AdapterConfig::default();
        config.cache.max_capacity = 0;
        assert!(matches!(config.validate(), Err(AdapterError::Config(_))));
    }

    #[test]
    fn single_tenant_mode_requires_credentials() {
        let mut config = AdapterConfig::default();
        config.mode = DirectoryMode::SingleTenant;
        assert!(matches!(config.validate(), Err(AdapterError::Config(_))));

        config.single_tenant = Some(SingleTenantConfig {
            agent_type: "default".into(),
            endpoint: "org.example.com".into(),
            token: "t0k3n".into(),
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: AdapterConfig = toml::from_str(
            r#"
            namespace = "semaphore"
            mode = "single-tenant"

            [single_tenant]
            endpoint = "org.example.com"
            token = "abc"

            [upstream]
            scheme = "http"

            [poll]
            interval_seconds = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.namespace, "semaphore");
        assert_eq!(config.mode, DirectoryMode::SingleTenant);
        assert_eq!(config.upstream.scheme, UpstreamScheme::Http);
        assert_eq!(config.poll.interval_seconds, 30);
        assert_eq!(config.poll.request_timeout_seconds, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.single_tenant.unwrap().agent_type, "default");
    }

    #[test]
    fn mode_names_round_trip_through_strings() {
        assert_eq!("single-tenant".parse::<DirectoryMode>().unwrap(), DirectoryMode::SingleTenant);
        assert_eq!(UpstreamScheme::Http.to_string(), "http");
    }
}
