//! Per-cycle fan-out over agent types

use std::sync::Arc;
use std::time::{Duration, Instant};

use agentmetrics_domain::{AdapterError, AgentType, ExportedValue, RawMetrics, Result};
use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::ports::MetricsSource;

/// Fetches metrics for every agent type of one cycle and builds the
/// exported value set.
///
/// Fetches run concurrently, each bounded by `request_timeout`. A failing
/// agent type is logged and left out; it never fails the cycle.
pub struct Aggregator {
    source: Arc<dyn MetricsSource>,
    request_timeout: Duration,
}

impl Aggregator {
    /// `request_timeout` bounds each fetch.
    pub fn new(source: Arc<dyn MetricsSource>, request_timeout: Duration) -> Self {
        Self { source, request_timeout }
    }

    /// Values for every agent type that could be fetched, grouped by agent
    /// type in input order and then by [`MetricKind::ALL`] order.
    ///
    /// [`MetricKind::ALL`]: agentmetrics_domain::MetricKind::ALL
    pub async fn collect_cycle(&self, agent_types: &[AgentType]) -> Vec<ExportedValue> {
        let started = Instant::now();
        let results =
            join_all(agent_types.iter().map(|agent_type| self.fetch_one(agent_type))).await;

        let collected_at = Utc::now();
        let mut values = Vec::with_capacity(agent_types.len() * 7);
        let mut failed = 0usize;

        for (agent_type, result) in agent_types.iter().zip(results) {
            match result {
                Ok(metrics) => {
                    info!(agent_type = %agent_type.name, "{metrics}");
                    values.extend(ExportedValue::all_for_agent_type(
                        &agent_type.name,
                        &metrics,
                        collected_at,
                    ));
                }
                Err(err) => {
                    failed += 1;
                    warn!(
                        agent_type = %agent_type.name,
                        error = %err,
                        error_type = err.label(),
                        "Skipping agent type for this cycle"
                    );
                }
            }
        }

        debug!(
            count = agent_types.len(),
            failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "Collection cycle fetched"
        );

        values
    }

    async fn fetch_one(&self, agent_type: &AgentType) -> Result<RawMetrics> {
        let fetch = self.source.fetch(&agent_type.endpoint, &agent_type.token);
        match tokio::time::timeout(self.request_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::UpstreamUnreachable(format!(
                "request to {} timed out after {:?}",
                agent_type.endpoint, self.request_timeout
            ))),
        }
    }
}
