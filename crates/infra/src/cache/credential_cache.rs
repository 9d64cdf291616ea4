//! Credential record caching with moka
//!
//! Sits between the poll loop and the credential directory so each record is
//! fetched from the directory at most once per TTL window.
//!
//! # Behavior
//!
//! - **TTL**: entries expire a fixed time after insertion (default 5 minutes)
//! - **Capacity**: bounded; moka may evict early under pressure, which only
//!   costs an extra directory call
//! - **Errors**: never cached, so a malformed or unreachable record is
//!   retried on the next cycle
//! - **Concurrency**: two callers missing on the same name may both call the
//!   directory; the last insert wins

use std::sync::Arc;
use std::time::Duration;

use agentmetrics_core::{CredentialDirectory, RecordResolver};
use agentmetrics_domain::constants::{DEFAULT_CACHE_MAX_CAPACITY, DEFAULT_CACHE_TTL_SECS};
use agentmetrics_domain::{AdapterError, AgentType, CacheConfig, Result};
use async_trait::async_trait;
use moka::future::Cache;

/// Credential cache configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCacheConfig {
    /// Time-to-live for cache entries
    pub ttl: Duration,

    /// Maximum number of cached records
    pub max_capacity: u64,
}

impl Default for CredentialCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_capacity: DEFAULT_CACHE_MAX_CAPACITY,
        }
    }
}

impl From<&CacheConfig> for CredentialCacheConfig {
    fn from(config: &CacheConfig) -> Self {
        Self { ttl: config.ttl(), max_capacity: config.max_capacity }
    }
}

impl CredentialCacheConfig {
    /// Create config with custom TTL (useful for testing)
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, max_capacity: DEFAULT_CACHE_MAX_CAPACITY }
    }

    /// Log configuration at startup
    pub fn log_config(&self) {
        tracing::info!(
            ttl_seconds = self.ttl.as_secs(),
            max_capacity = self.max_capacity,
            "Credential cache configuration loaded"
        );
    }

    fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(AdapterError::Cache("TTL must be greater than zero".into()));
        }
        if self.max_capacity == 0 {
            return Err(AdapterError::Cache("max capacity must be greater than zero".into()));
        }
        Ok(())
    }
}

/// TTL cache in front of a [`CredentialDirectory`], implementing
/// [`RecordResolver`]
pub struct CredentialCache {
    directory: Arc<dyn CredentialDirectory>,
    cache: Cache<String, AgentType>,
}

impl CredentialCache {
    /// # Errors
    /// Returns `AdapterError::Cache` for a zero TTL or capacity; the adapter
    /// cannot run without a working cache.
    pub fn new(
        directory: Arc<dyn CredentialDirectory>,
        config: CredentialCacheConfig,
    ) -> Result<Self> {
        config.validate()?;
        config.log_config();

        let cache =
            Cache::builder().time_to_live(config.ttl).max_capacity(config.max_capacity).build();

        Ok(Self { directory, cache })
    }

    /// Cached record for `name`, without falling back to the directory.
    pub async fn get(&self, name: &str) -> Option<AgentType> {
        self.cache.get(name).await
    }

    /// Drop one entry so the next resolve refetches it.
    pub async fn invalidate(&self, name: &str) {
        self.cache.invalidate(name).await;
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl RecordResolver for CredentialCache {
    async fn resolve(&self, name: &str) -> Result<AgentType> {
        if let Some(record) = self.cache.get(name).await {
            tracing::debug!(agent_type = %name, "Credential cache hit");
            return Ok(record);
        }

        tracing::debug!(agent_type = %name, "Credential cache miss");
        let record = self.directory.get_record(name).await?;
        self.cache.insert(name.to_string(), record.clone()).await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingDirectory {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CredentialDirectory for CountingDirectory {
        async fn list_record_names(&self, _label_selector: &str) -> Result<Vec<String>> {
            Ok(vec!["s1".into()])
        }

        async fn get_record(&self, name: &str) -> Result<AgentType> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AdapterError::malformed(name, "missing field 'token'"));
            }
            Ok(AgentType::new(name, "org.example.com", "token"))
        }
    }

    fn cache_with(directory: Arc<CountingDirectory>, ttl: Duration) -> CredentialCache {
        CredentialCache::new(directory, CredentialCacheConfig::with_ttl(ttl)).unwrap()
    }

    #[tokio::test]
    async fn resolve_before_expiry_hits_cache() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = cache_with(directory.clone(), Duration::from_secs(60));

        let first = cache.resolve("s1").await.unwrap();
        let second = cache.resolve("s1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolve_after_expiry_refetches() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = cache_with(directory.clone(), Duration::from_millis(100));

        cache.resolve("s1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        cache.resolve("s1").await.unwrap();

        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let directory = Arc::new(CountingDirectory { fail: true, ..Default::default() });
        let cache = cache_with(directory.clone(), Duration::from_secs(60));

        assert!(cache.resolve("s1").await.is_err());
        assert!(cache.resolve("s1").await.is_err());
        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
        assert!(cache.get("s1").await.is_none());
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = cache_with(directory.clone(), Duration::from_secs(60));

        cache.resolve("s1").await.unwrap();
        cache.invalidate("s1").await;
        cache.resolve("s1").await.unwrap();

        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_ttl_or_capacity_is_rejected() {
        let directory: Arc<dyn CredentialDirectory> = Arc::new(CountingDirectory::default());

        let zero_ttl = CredentialCacheConfig::with_ttl(Duration::ZERO);
        let err = CredentialCache::new(directory.clone(), zero_ttl).err().unwrap();
        assert!(matches!(err, AdapterError::Cache(_)));

        let config = CredentialCacheConfig { ttl: Duration::from_secs(1), max_capacity: 0 };
        assert!(matches!(CredentialCache::new(directory, config), Err(AdapterError::Cache(_))));
    }

    #[test]
    fn converts_from_domain_cache_config() {
        let config = CredentialCacheConfig::from(&CacheConfig::default());
        assert_eq!(config, CredentialCacheConfig::default());
    }
}
