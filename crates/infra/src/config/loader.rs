//! Configuration loader
//!
//! Loads adapter configuration from environment variables, optionally on
//! top of a configuration file.
//!
//! ## Loading Strategy
//! 1. Start from defaults, or from the file named by `AGENT_METRICS_CONFIG`
//! 2. Apply environment variable overrides
//! 3. Validate the result
//!
//! ## Environment Variables
//! - `KUBERNETES_NAMESPACE`: Namespace holding agent type secrets
//! - `AGENT_METRICS_MODE`: `kubernetes` or `single-tenant`
//! - `SEMAPHORE_ENDPOINT` / `SEMAPHORE_TOKEN`: Single-tenant credentials
//! - `SEMAPHORE_AGENT_TYPE`: Single-tenant record name
//! - `SEMAPHORE_API_SCHEME`: `https` or `http`
//! - `AGENT_METRICS_POLL_INTERVAL_SECONDS`: Poll interval
//! - `AGENT_METRICS_REQUEST_TIMEOUT_SECONDS`: Per-fetch deadline
//! - `AGENT_METRICS_CACHE_TTL_SECONDS`: Credential cache TTL
//! - `AGENT_METRICS_CACHE_MAX_CAPACITY`: Credential cache capacity
//! - `AGENT_METRICS_BIND_ADDRESS`: HTTP listen address
//! - `KUBERNETES_API_URL`, `KUBERNETES_TOKEN_PATH`, `KUBERNETES_CA_PATH`:
//!   API server access
//!
//! ## File Formats
//! JSON and TOML, detected by file extension.

use std::path::Path;
use std::str::FromStr;

use agentmetrics_domain::{AdapterConfig, AdapterError, Result, SingleTenantConfig};

pub const ENV_CONFIG_PATH: &str = "AGENT_METRICS_CONFIG";
pub const ENV_NAMESPACE: &str = "KUBERNETES_NAMESPACE";
pub const ENV_MODE: &str = "AGENT_METRICS_MODE";
pub const ENV_ENDPOINT: &str = "SEMAPHORE_ENDPOINT";
pub const ENV_TOKEN: &str = "SEMAPHORE_TOKEN";
pub const ENV_AGENT_TYPE: &str = "SEMAPHORE_AGENT_TYPE";
pub const ENV_SCHEME: &str = "SEMAPHORE_API_SCHEME";
pub const ENV_POLL_INTERVAL: &str = "AGENT_METRICS_POLL_INTERVAL_SECONDS";
pub const ENV_REQUEST_TIMEOUT: &str = "AGENT_METRICS_REQUEST_TIMEOUT_SECONDS";
pub const ENV_CACHE_TTL: &str = "AGENT_METRICS_CACHE_TTL_SECONDS";
pub const ENV_CACHE_MAX_CAPACITY: &str = "AGENT_METRICS_CACHE_MAX_CAPACITY";
pub const ENV_BIND_ADDRESS: &str = "AGENT_METRICS_BIND_ADDRESS";
pub const ENV_KUBERNETES_API_URL: &str = "KUBERNETES_API_URL";
pub const ENV_KUBERNETES_TOKEN_PATH: &str = "KUBERNETES_TOKEN_PATH";
pub const ENV_KUBERNETES_CA_PATH: &str = "KUBERNETES_CA_PATH";

/// Load configuration: file (if `AGENT_METRICS_CONFIG` is set), then
/// environment overrides, then validation.
///
/// # Errors
/// Returns `AdapterError::Config` if the file cannot be read or parsed, an
/// environment value is invalid, or the final configuration fails
/// validation.
pub fn load() -> Result<AdapterConfig> {
    let mut config = match env_lookup(ENV_CONFIG_PATH) {
        Some(path) => load_from_file(Path::new(&path))?,
        None => AdapterConfig::default(),
    };

    apply_overrides(&mut config, env_lookup)?;
    config.validate()?;

    tracing::info!(
        mode = %config.mode,
        namespace = %config.namespace,
        scheme = %config.upstream.scheme,
        interval_secs = config.poll.interval_seconds,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from defaults and environment variables only.
///
/// # Errors
/// Returns `AdapterError::Config` for invalid values or a configuration
/// that fails validation.
pub fn load_from_env() -> Result<AdapterConfig> {
    let mut config = AdapterConfig::default();
    apply_overrides(&mut config, env_lookup)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a JSON or TOML file. Missing fields take their
/// defaults. The result is not validated.
///
/// # Errors
/// Returns `AdapterError::Config` if the file is missing, unreadable, or
/// invalid.
pub fn load_from_file(path: &Path) -> Result<AdapterConfig> {
    if !path.exists() {
        return Err(AdapterError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AdapterError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AdapterConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AdapterError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AdapterError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AdapterError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Apply overrides from `lookup` (normally the process environment).
///
/// Unset or blank variables leave the current value untouched.
///
/// # Errors
/// Returns `AdapterError::Config` naming the variable with an invalid value.
pub fn apply_overrides<F>(config: &mut AdapterConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(namespace) = get(ENV_NAMESPACE) {
        config.namespace = namespace;
    }
    if let Some(mode) = get(ENV_MODE) {
        config.mode = parse_named(ENV_MODE, &mode)?;
    }
    if let Some(scheme) = get(ENV_SCHEME) {
        config.upstream.scheme = parse_named(ENV_SCHEME, &scheme)?;
    }
    if let Some(value) = get(ENV_POLL_INTERVAL) {
        config.poll.interval_seconds = parse_number(ENV_POLL_INTERVAL, &value)?;
    }
    if let Some(value) = get(ENV_REQUEST_TIMEOUT) {
        config.poll.request_timeout_seconds = parse_number(ENV_REQUEST_TIMEOUT, &value)?;
    }
    if let Some(value) = get(ENV_CACHE_TTL) {
        config.cache.ttl_seconds = parse_number(ENV_CACHE_TTL, &value)?;
    }
    if let Some(value) = get(ENV_CACHE_MAX_CAPACITY) {
        config.cache.max_capacity = parse_number(ENV_CACHE_MAX_CAPACITY, &value)?;
    }
    if let Some(address) = get(ENV_BIND_ADDRESS) {
        config.server.bind_address = address;
    }
    if let Some(url) = get(ENV_KUBERNETES_API_URL) {
        config.kubernetes.api_url = url;
    }
    if let Some(path) = get(ENV_KUBERNETES_TOKEN_PATH) {
        config.kubernetes.token_path = path;
    }
    if let Some(path) = get(ENV_KUBERNETES_CA_PATH) {
        config.kubernetes.ca_path = path;
    }

    let endpoint = get(ENV_ENDPOINT);
    let token = get(ENV_TOKEN);
    let agent_type = get(ENV_AGENT_TYPE);
    if endpoint.is_some() || token.is_some() || agent_type.is_some() {
        let current = config.single_tenant.take();
        let (current_endpoint, current_token, current_name) = match current {
            Some(SingleTenantConfig { endpoint, token, agent_type }) => {
                (Some(endpoint), Some(token), Some(agent_type))
            }
            None => (None, None, None),
        };

        config.single_tenant = match (endpoint.or(current_endpoint), token.or(current_token)) {
            (Some(endpoint), Some(token)) => Some(SingleTenantConfig {
                agent_type: agent_type.or(current_name).unwrap_or_else(default_agent_type_name),
                endpoint,
                token,
            }),
            _ => None,
        };
    }

    Ok(())
}

fn default_agent_type_name() -> String {
    agentmetrics_domain::constants::DEFAULT_AGENT_TYPE_NAME.to_string()
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_named<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    value.trim().parse().map_err(|e| AdapterError::Config(format!("{key}: {e}")))
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| AdapterError::Config(format!("Invalid value for {key} ('{value}'): {e}")))
}
