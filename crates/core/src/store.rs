//! In-memory metric store
//!
//! Holds the most recent snapshot for each metric name. Writers replace a
//! whole snapshot in one step, so readers see either the previous list or
//! the new one and never a mix of both.

use std::sync::Arc;

use agentmetrics_domain::ExportedValue;
use dashmap::DashMap;

use crate::selector::LabelMatcher;

/// Snapshot store keyed by metric name.
///
/// Cloning is cheap and shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    snapshots: Arc<DashMap<String, Arc<[ExportedValue]>>>,
}

impl MetricStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the snapshot for `metric_name`.
    pub fn replace(&self, metric_name: impl Into<String>, values: Vec<ExportedValue>) {
        self.snapshots.insert(metric_name.into(), Arc::from(values));
    }

    /// The current snapshot, if the metric has ever been published.
    pub fn snapshot(&self, metric_name: &str) -> Option<Arc<[ExportedValue]>> {
        self.snapshots.get(metric_name).map(|entry| Arc::clone(entry.value()))
    }

    /// Values of `metric_name` selected by `matcher`, in publish order.
    ///
    /// An unknown metric yields an empty list. The snapshot is cloned out of
    /// the map before filtering so no shard lock is held while matching.
    pub fn read<M>(&self, metric_name: &str, matcher: &M) -> Vec<ExportedValue>
    where
        M: LabelMatcher + ?Sized,
    {
        let Some(snapshot) = self.snapshot(metric_name) else {
            return Vec::new();
        };

        if matcher.is_empty() {
            return snapshot.to_vec();
        }

        snapshot.iter().filter(|value| matcher.matches(*value)).cloned().collect()
    }

    /// Names of every published metric, sorted.
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.snapshots.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// `true` until the first metric is published.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
