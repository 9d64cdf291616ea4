//! Poll scheduler driving the collection cycle.
//!
//! Runs [`CollectionService::run_cycle`] immediately on start and then once
//! per interval for the lifetime of the process. A failed listing or an idle
//! cycle never stops the loop; the wait before the next attempt comes from
//! the configured [`RetryPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use agentmetrics_core::{CollectionService, FixedInterval};
//! use agentmetrics_infra::scheduling::{PollScheduler, PollSchedulerConfig};
//!
//! # async fn example(service: Arc<CollectionService>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scheduler = PollScheduler::new(
//!     service,
//!     Arc::new(FixedInterval::new(Duration::from_secs(10))),
//!     PollSchedulerConfig::default(),
//! );
//!
//! scheduler.start().await?;
//! // ... serve reads ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use agentmetrics_core::{CollectionService, CycleOutcome, RetryPolicy};
use agentmetrics_domain::constants::DEFAULT_POLL_INTERVAL_SECS;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for poll scheduler
#[derive(Debug, Clone)]
pub struct PollSchedulerConfig {
    /// Wait after a published cycle
    pub interval: Duration,
    /// How long `stop` waits for the loop to exit
    pub join_timeout: Duration,
}

impl Default for PollSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Background poll loop with explicit lifecycle
pub struct PollScheduler {
    service: Arc<CollectionService>,
    retry: Arc<dyn RetryPolicy>,
    config: PollSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl PollScheduler {
    pub fn new(
        service: Arc<CollectionService>,
        retry: Arc<dyn RetryPolicy>,
        config: PollSchedulerConfig,
    ) -> Self {
        Self {
            service,
            retry,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Token cancelled when the scheduler stops; child tasks may share it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Start the scheduler
    ///
    /// Spawns a background task that runs the first cycle right away.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting poll scheduler");

        // Fresh token so the scheduler can be restarted after stop
        self.cancellation_token = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let retry = Arc::clone(&self.retry);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::poll_loop(service, retry, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Poll scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running, or if the task does not
    /// finish within the join timeout
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping poll scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })??;
        }

        info!("Poll scheduler stopped");
        Ok(())
    }

    /// Check if scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle that
    /// hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn poll_loop(
        service: Arc<CollectionService>,
        retry: Arc<dyn RetryPolicy>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut consecutive_idle: u32 = 0;

        loop {
            let started = Instant::now();
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Poll loop cancelled mid-cycle");
                    break;
                }
                result = service.run_cycle() => result,
            };

            let delay = match result {
                Ok(outcome @ CycleOutcome::Published { .. }) => {
                    consecutive_idle = 0;
                    info!(
                        ?outcome,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "Poll cycle published"
                    );
                    interval
                }
                Ok(outcome) => {
                    consecutive_idle = consecutive_idle.saturating_add(1);
                    let delay = retry.delay_for(consecutive_idle);
                    warn!(
                        ?outcome,
                        attempt = consecutive_idle,
                        retry_in_ms = delay.as_millis() as u64,
                        "Poll cycle produced nothing to publish"
                    );
                    delay
                }
                Err(err) => {
                    consecutive_idle = consecutive_idle.saturating_add(1);
                    let delay = retry.delay_for(consecutive_idle);
                    error!(
                        error = %err,
                        error_type = err.label(),
                        attempt = consecutive_idle,
                        retry_in_ms = delay.as_millis() as u64,
                        "Listing agent types failed"
                    );
                    delay
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Poll loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for PollScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() && self.is_running() {
            warn!("PollScheduler dropped while running; cancelling");
        }
        self.cancellation_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use agentmetrics_core::{
        Aggregator, CredentialDirectory, FixedInterval, MetricStore, MetricsSource,
        RecordResolver, Selector,
    };
    use agentmetrics_domain::{AdapterError, AgentType, RawMetrics, Result};
    use async_trait::async_trait;

    use super::*;

    struct ScriptedDirectory {
        list_calls: AtomicUsize,
        fail_listing: bool,
    }

    #[async_trait]
    impl CredentialDirectory for ScriptedDirectory {
        async fn list_record_names(&self, _label_selector: &str) -> Result<Vec<String>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_listing {
                return Err(AdapterError::DirectoryUnavailable("api down".into()));
            }
            Ok(vec!["s1".into()])
        }

        async fn get_record(&self, name: &str) -> Result<AgentType> {
            Ok(AgentType::new(name, "s1.example.com", "token"))
        }
    }

    #[async_trait]
    impl RecordResolver for ScriptedDirectory {
        async fn resolve(&self, name: &str) -> Result<AgentType> {
            self.get_record(name).await
        }
    }

    struct StaticSource;

    #[async_trait]
    impl MetricsSource for StaticSource {
        async fn fetch(&self, _endpoint: &str, _token: &str) -> Result<RawMetrics> {
            Ok(RawMetrics::new(2, 2, 1, 1))
        }
    }

    fn scheduler(
        fail_listing: bool,
        interval: Duration,
    ) -> (PollScheduler, Arc<ScriptedDirectory>) {
        let directory =
            Arc::new(ScriptedDirectory { list_calls: AtomicUsize::new(0), fail_listing });
        let service = CollectionService::new(
            directory.clone(),
            directory.clone(),
            Aggregator::new(Arc::new(StaticSource), Duration::from_secs(1)),
            MetricStore::new(),
        );
        let scheduler = PollScheduler::new(
            Arc::new(service),
            Arc::new(FixedInterval::new(interval)),
            PollSchedulerConfig { interval, join_timeout: Duration::from_secs(2) },
        );
        (scheduler, directory)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scheduler_lifecycle() {
        let (mut scheduler, _) = scheduler(false, Duration::from_secs(60));

        assert!(!scheduler.is_running());

        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
        assert!(scheduler.cancellation_token().is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_double_start_fails() {
        let (mut scheduler, _) = scheduler(false, Duration::from_secs(60));

        scheduler.start().await.unwrap();
        assert!(matches!(scheduler.start().await, Err(SchedulerError::AlreadyRunning)));

        scheduler.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_without_start_fails() {
        let (mut scheduler, _) = scheduler(false, Duration::from_secs(60));
        assert!(matches!(scheduler.stop().await, Err(SchedulerError::NotRunning)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_cycle_runs_immediately_and_publishes() {
        let (mut scheduler, directory) = scheduler(false, Duration::from_secs(60));
        let store = scheduler.service.store().clone();

        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.stop().await.unwrap();

        assert_eq!(directory.list_calls.load(Ordering::SeqCst), 1);
        let values = store.read("agents_total", &Selector::everything());
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn listing_failures_keep_retrying() {
        let (mut scheduler, directory) = scheduler(true, Duration::from_millis(20));

        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(scheduler.is_running());
        scheduler.stop().await.unwrap();

        assert!(directory.list_calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restart_after_stop() {
        let (mut scheduler, directory) = scheduler(false, Duration::from_secs(60));

        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop().await.unwrap();
        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop().await.unwrap();

        assert_eq!(directory.list_calls.load(Ordering::SeqCst), 2);
    }
}
