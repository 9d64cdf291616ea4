//! Application context - dependency injection container

use std::sync::Arc;

use agentmetrics_core::{
    Aggregator, CollectionService, CredentialDirectory, FixedInterval, MetricStore, MetricsSource,
    RecordResolver,
};
use agentmetrics_domain::{AdapterConfig, AdapterError, DirectoryMode, Result};
use agentmetrics_infra::{
    config, CredentialCache, CredentialCacheConfig, PollScheduler, PollSchedulerConfig,
    SecretDirectory, SecretDirectoryConfig, SemaphoreClient, SemaphoreClientConfig,
    StaticDirectory,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::server::ServerState;

/// Type alias for credential directory port trait object
type DynCredentialDirectory = dyn CredentialDirectory + 'static;

/// Type alias for record resolver port trait object
type DynRecordResolver = dyn RecordResolver + 'static;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: AdapterConfig,
    pub store: MetricStore,
    pub service: Arc<CollectionService>,

    scheduler: Mutex<PollScheduler>,
}

impl AppContext {
    /// Load configuration from the environment and build the context.
    ///
    /// # Errors
    /// Returns `AdapterError::Config` for missing or invalid settings, and
    /// `AdapterError::Cache` if the credential cache cannot be built.
    pub fn new() -> Result<Self> {
        let config = config::load()?;
        Self::new_with_config(config)
    }

    /// Build the context for an already loaded configuration.
    ///
    /// # Errors
    /// See [`AppContext::new`].
    pub fn new_with_config(config: AdapterConfig) -> Result<Self> {
        config.validate()?;

        let (directory, resolver) = build_directory(&config)?;
        let source = Arc::new(SemaphoreClient::new(SemaphoreClientConfig {
            scheme: config.upstream.scheme,
            timeout: config.poll.request_timeout(),
        })?);

        Ok(Self::with_components(config, directory, resolver, source))
    }

    /// Assemble the context from explicit ports.
    pub fn with_components(
        config: AdapterConfig,
        directory: Arc<DynCredentialDirectory>,
        resolver: Arc<DynRecordResolver>,
        source: Arc<dyn MetricsSource>,
    ) -> Self {
        let store = MetricStore::new();
        let aggregator = Aggregator::new(source, config.poll.request_timeout());
        let service =
            Arc::new(CollectionService::new(directory, resolver, aggregator, store.clone()));

        let scheduler = PollScheduler::new(
            Arc::clone(&service),
            Arc::new(FixedInterval::new(config.poll.interval())),
            PollSchedulerConfig {
                interval: config.poll.interval(),
                ..PollSchedulerConfig::default()
            },
        );

        Self { config, store, service, scheduler: Mutex::new(scheduler) }
    }

    /// State handed to the HTTP router.
    pub fn server_state(&self) -> ServerState {
        ServerState::new(self.store.clone())
    }

    /// Start the background poll loop.
    ///
    /// # Errors
    /// Returns `AdapterError::InvalidInput` if the loop is already running.
    pub async fn start(&self) -> Result<()> {
        self.scheduler.lock().await.start().await.map_err(AdapterError::from)
    }

    /// Whether the poll loop task is alive.
    pub async fn is_polling(&self) -> bool {
        self.scheduler.lock().await.is_running()
    }

    /// Stop the poll loop if it is running.
    ///
    /// # Errors
    /// Returns `AdapterError::Internal` if the loop does not exit in time.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");

        let mut scheduler = self.scheduler.lock().await;
        if !scheduler.is_running() {
            warn!("Poll scheduler was not running at shutdown");
            return Ok(());
        }
        scheduler.stop().await.map_err(AdapterError::from)
    }
}

fn build_directory(
    config: &AdapterConfig,
) -> Result<(Arc<DynCredentialDirectory>, Arc<DynRecordResolver>)> {
    match config.mode {
        DirectoryMode::Kubernetes => {
            let settings =
                SecretDirectoryConfig::in_cluster(&config.kubernetes, &config.namespace)?;
            let directory: Arc<DynCredentialDirectory> =
                Arc::new(SecretDirectory::new(settings)?);
            let resolver: Arc<DynRecordResolver> = Arc::new(CredentialCache::new(
                Arc::clone(&directory),
                CredentialCacheConfig::from(&config.cache),
            )?);

            info!(namespace = %config.namespace, "Using Kubernetes secret directory");
            Ok((directory, resolver))
        }
        DirectoryMode::SingleTenant => {
            let tenant = config.single_tenant.as_ref().ok_or_else(|| {
                AdapterError::Config(
                    "single-tenant mode requires SEMAPHORE_ENDPOINT and SEMAPHORE_TOKEN".into(),
                )
            })?;
            let record = Arc::new(StaticDirectory::from_config(tenant)?);
            let directory: Arc<DynCredentialDirectory> = record.clone();
            let resolver: Arc<DynRecordResolver> = record;

            info!(agent_type = %tenant.agent_type, "Using single-tenant directory");
            Ok((directory, resolver))
        }
    }
}

#[cfg(test)]
mod tests {
    use agentmetrics_domain::SingleTenantConfig;

    use super::*;

    #[test]
    fn single_tenant_context_builds_without_cluster_files() {
        let config = AdapterConfig {
            mode: DirectoryMode::SingleTenant,
            single_tenant: Some(SingleTenantConfig {
                agent_type: "default".into(),
                endpoint: "org.example.com".into(),
                token: "secret".into(),
            }),
            ..AdapterConfig::default()
        };

        let context = AppContext::new_with_config(config).unwrap();
        assert!(context.store.is_empty());
    }

    #[test]
    fn kubernetes_mode_fails_fast_without_service_account() {
        let mut config = AdapterConfig::default();
        config.kubernetes.token_path = "/nonexistent/token".into();
        config.kubernetes.ca_path = "/nonexistent/ca.crt".into();

        let err = AppContext::new_with_config(config).err().unwrap();
        assert!(matches!(err, AdapterError::Config(msg) if msg.contains("/nonexistent/token")));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AdapterConfig::default();
        config.cache.ttl_seconds = 0;
        assert!(matches!(AppContext::new_with_config(config), Err(AdapterError::Config(_))));
    }

    #[tokio::test]
    async fn shutdown_without_start_is_a_no_op() {
        let config = AdapterConfig {
            mode: DirectoryMode::SingleTenant,
            single_tenant: Some(SingleTenantConfig {
                agent_type: "default".into(),
                endpoint: "127.0.0.1:9".into(),
                token: "secret".into(),
            }),
            ..AdapterConfig::default()
        };
        let context = AppContext::new_with_config(config).unwrap();

        assert!(!context.is_polling().await);
        context.shutdown().await.unwrap();
    }
}
