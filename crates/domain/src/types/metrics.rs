//! Upstream metrics schema and the values exported to consumers

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::labels::Labeled;
use crate::constants::LABEL_AGENT_TYPE;
use crate::impl_name_conversions;

/// Metrics body returned by the upstream API for one agent type.
///
/// Decoded verbatim: `{"Jobs":{"Queued":..,"Running":..},"Agents":{"Idle":..,"Occupied":..}}`.
/// Derived quantities are computed on demand and never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawMetrics {
    pub jobs: JobMetrics,
    pub agents: AgentMetrics,
}

/// Job counts for one agent type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobMetrics {
    pub queued: u64,
    pub running: u64,
}

impl JobMetrics {
    /// Queued plus running.
    pub fn total(&self) -> u64 {
        self.queued.saturating_add(self.running)
    }
}

/// Agent counts for one agent type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentMetrics {
    pub idle: u64,
    pub occupied: u64,
}

impl AgentMetrics {
    /// Idle plus occupied.
    pub fn total(&self) -> u64 {
        self.idle.saturating_add(self.occupied)
    }

    /// `floor(100 * occupied / total)`, and `0` for an empty pool.
    pub fn occupied_percentage(&self) -> u64 {
        let total = self.total();
        if total == 0 {
            return 0;
        }

        self.occupied.saturating_mul(100) / total
    }
}

impl RawMetrics {
    /// Build from the four upstream counters.
    pub fn new(idle: u64, occupied: u64, queued: u64, running: u64) -> Self {
        Self { jobs: JobMetrics { queued, running }, agents: AgentMetrics { idle, occupied } }
    }
}

impl fmt::Display for RawMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agents/occupied={} agents/idle={} jobs/queued={} jobs/running={}",
            self.agents.occupied, self.agents.idle, self.jobs.queued, self.jobs.running
        )
    }
}

/// The fixed, ordered set of metrics served per agent type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    AgentsTotal,
    AgentsIdle,
    AgentsOccupied,
    AgentsOccupiedPercentage,
    JobsTotal,
    JobsQueued,
    JobsRunning,
}

impl_name_conversions!(MetricKind {
    AgentsTotal => "agents_total",
    AgentsIdle => "agents_idle",
    AgentsOccupied => "agents_occupied",
    AgentsOccupiedPercentage => "agents_occupied_percentage",
    JobsTotal => "jobs_total",
    JobsQueued => "jobs_queued",
    JobsRunning => "jobs_running",
});

impl MetricKind {
    /// Every kind, in export order.
    pub const ALL: [Self; 7] = [
        Self::AgentsTotal,
        Self::AgentsIdle,
        Self::AgentsOccupied,
        Self::AgentsOccupiedPercentage,
        Self::JobsTotal,
        Self::JobsQueued,
        Self::JobsRunning,
    ];

    /// Compute this metric from an upstream body.
    pub fn value(&self, metrics: &RawMetrics) -> u64 {
        match self {
            Self::AgentsTotal => metrics.agents.total(),
            Self::AgentsIdle => metrics.agents.idle,
            Self::AgentsOccupied => metrics.agents.occupied,
            Self::AgentsOccupiedPercentage => metrics.agents.occupied_percentage(),
            Self::JobsTotal => metrics.jobs.total(),
            Self::JobsQueued => metrics.jobs.queued,
            Self::JobsRunning => metrics.jobs.running,
        }
    }
}

/// One served data point: a metric for one agent type at one instant.
///
/// Serializes in the external metrics API shape, with the value rendered as
/// a decimal quantity string.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedValue {
    pub metric_name: String,
    #[serde(default)]
    pub metric_labels: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    #[serde_as(as = "DisplayFromStr")]
    pub value: u64,
}

impl ExportedValue {
    /// Build the value of `kind` for the agent type `agent_type`.
    pub fn for_agent_type(
        kind: MetricKind,
        agent_type: &str,
        metrics: &RawMetrics,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            metric_name: kind.as_str().to_string(),
            metric_labels: BTreeMap::from([(
                LABEL_AGENT_TYPE.to_string(),
                agent_type.to_string(),
            )]),
            timestamp,
            value: kind.value(metrics),
        }
    }

    /// All kinds for one agent type, in [`MetricKind::ALL`] order.
    pub fn all_for_agent_type(
        agent_type: &str,
        metrics: &RawMetrics,
        timestamp: DateTime<Utc>,
    ) -> Vec<Self> {
        MetricKind::ALL
            .iter()
            .map(|kind| Self::for_agent_type(*kind, agent_type, metrics, timestamp))
            .collect()
    }
}

impl Labeled for ExportedValue {
    fn has(&self, key: &str) -> bool {
        self.metric_labels.has(key)
    }

    fn get(&self, key: &str) -> Option<&str> {
        Labeled::get(&self.metric_labels, key)
    }
}
