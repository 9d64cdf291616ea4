//! Port interfaces for metrics collection
//!
//! These traits define the boundaries between the collection logic and the
//! infrastructure that talks to the credential directory and the upstream
//! metrics API.

use agentmetrics_domain::{AgentType, RawMetrics, Result};
use async_trait::async_trait;

/// Directory holding one credential entry per agent type
#[async_trait]
pub trait CredentialDirectory: Send + Sync {
    /// Names of every entry matching `label_selector`.
    ///
    /// Fails with `AdapterError::DirectoryUnavailable` on transport or API
    /// errors.
    async fn list_record_names(&self, label_selector: &str) -> Result<Vec<String>>;

    /// Fetch and decode one entry.
    ///
    /// Fails with `AdapterError::MalformedRecord` when a required field is
    /// missing or undecodable, `AdapterError::DirectoryUnavailable` on
    /// transport errors.
    async fn get_record(&self, name: &str) -> Result<AgentType>;
}

/// Name-to-record resolution, usually backed by a cache in front of a
/// [`CredentialDirectory`]
#[async_trait]
pub trait RecordResolver: Send + Sync {
    /// Record for `name`, with the same failures as
    /// [`CredentialDirectory::get_record`].
    async fn resolve(&self, name: &str) -> Result<AgentType>;
}

/// Upstream source of per-agent-type metrics
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch the current metrics for the agent type behind `endpoint`,
    /// authenticating with `token`.
    async fn fetch(&self, endpoint: &str, token: &str) -> Result<RawMetrics>;
}
