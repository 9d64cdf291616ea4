//! One complete poll cycle: list, resolve, collect, publish

use std::sync::Arc;

use agentmetrics_domain::constants::AUTOSCALED_LABEL_SELECTOR;
use agentmetrics_domain::{AgentType, ExportedValue, MetricKind, Result};
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::aggregator::Aggregator;
use crate::ports::{CredentialDirectory, RecordResolver};
use crate::store::MetricStore;

/// What a cycle did, for the scheduler's retry decision and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The directory listed nothing; the store is untouched.
    NoRecords,
    /// Names were listed but no agent type produced values; every metric
    /// kind now holds an empty snapshot.
    NothingCollected { listed: usize, resolved: usize },
    /// Every metric kind was replaced with this cycle's values.
    Published { listed: usize, resolved: usize, collected: usize, values: usize },
}

impl CycleOutcome {
    /// Whether the scheduler should treat this cycle as an idle/failed one.
    pub fn is_idle(&self) -> bool {
        !matches!(self, Self::Published { .. })
    }
}

/// Drives the collection pipeline for one cycle.
pub struct CollectionService {
    directory: Arc<dyn CredentialDirectory>,
    resolver: Arc<dyn RecordResolver>,
    aggregator: Aggregator,
    store: MetricStore,
    label_selector: String,
}

impl CollectionService {
    /// Service listing with the autoscaled-label selector.
    pub fn new(
        directory: Arc<dyn CredentialDirectory>,
        resolver: Arc<dyn RecordResolver>,
        aggregator: Aggregator,
        store: MetricStore,
    ) -> Self {
        Self {
            directory,
            resolver,
            aggregator,
            store,
            label_selector: AUTOSCALED_LABEL_SELECTOR.to_string(),
        }
    }

    /// Override the discovery selector (defaults to the autoscaled label).
    #[must_use]
    pub fn with_label_selector(mut self, label_selector: impl Into<String>) -> Self {
        self.label_selector = label_selector.into();
        self
    }

    /// Store this service publishes into.
    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    /// Run one cycle.
    ///
    /// Once names are listed, every metric kind is replaced, even with an
    /// empty list, so an agent type that stops answering is never served from
    /// an older cycle.
    ///
    /// # Errors
    /// Only a failed directory listing is returned. Per-record failures are
    /// logged and skipped.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let names = self.directory.list_record_names(&self.label_selector).await?;
        if names.is_empty() {
            info!(selector = %self.label_selector, "No agent types found");
            return Ok(CycleOutcome::NoRecords);
        }

        let agent_types = self.resolve_all(&names).await;
        let values = self.aggregator.collect_cycle(&agent_types).await;

        let collected = values.len() / MetricKind::ALL.len();
        let total = values.len();
        self.publish(values);

        if total == 0 {
            warn!(
                listed = names.len(),
                resolved = agent_types.len(),
                "No metrics collected, published empty snapshots"
            );
            return Ok(CycleOutcome::NothingCollected {
                listed: names.len(),
                resolved: agent_types.len(),
            });
        }

        debug!(listed = names.len(), resolved = agent_types.len(), collected, "Cycle published");
        Ok(CycleOutcome::Published {
            listed: names.len(),
            resolved: agent_types.len(),
            collected,
            values: total,
        })
    }

    async fn resolve_all(&self, names: &[String]) -> Vec<AgentType> {
        let results = join_all(names.iter().map(|name| self.resolver.resolve(name))).await;

        names
            .iter()
            .zip(results)
            .filter_map(|(name, result)| match result {
                Ok(agent_type) => Some(agent_type),
                Err(err) => {
                    warn!(
                        agent_type = %name,
                        error = %err,
                        error_type = err.label(),
                        "Skipping unresolvable agent type"
                    );
                    None
                }
            })
            .collect()
    }

    /// Replace the snapshot of every metric kind with this cycle's values.
    fn publish(&self, values: Vec<ExportedValue>) {
        for kind in MetricKind::ALL {
            let for_kind: Vec<ExportedValue> =
                values.iter().filter(|value| value.metric_name == kind.as_str()).cloned().collect();
            self.store.replace(kind.as_str(), for_kind);
        }
    }
}
