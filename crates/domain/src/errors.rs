//! Error types used throughout the adapter

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the metrics adapter.
///
/// Variants mirror the failure taxonomy of the collection pipeline. Only
/// directory listing failures pause a whole poll cycle; every per-record
/// variant (see [`AdapterError::is_per_record`]) drops a single agent type
/// from one cycle and nothing else.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AdapterError {
    /// The credential directory could not be queried (transport or API
    /// failure). Transient; retried on the next cycle.
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// A directory entry lacks a required field or carries an undecodable
    /// one.
    #[error("Malformed record '{name}': {reason}")]
    MalformedRecord { name: String, reason: String },

    /// The upstream metrics endpoint could not be reached.
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// The upstream metrics endpoint answered with a non-200 status.
    #[error("Upstream rejected request with status {status}")]
    UpstreamRejected { status: u16 },

    /// The upstream response body did not match the metrics schema.
    #[error("Upstream response malformed: {0}")]
    UpstreamMalformed(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdapterError {
    /// Errors that only skip the affected record for the current cycle.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            Self::MalformedRecord { .. }
                | Self::UpstreamUnreachable(_)
                | Self::UpstreamRejected { .. }
                | Self::UpstreamMalformed(_)
        )
    }

    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectoryUnavailable(_) => "directory_unavailable",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::UpstreamUnreachable(_) => "upstream_unreachable",
            Self::UpstreamRejected { .. } => "upstream_rejected",
            Self::UpstreamMalformed(_) => "upstream_malformed",
            Self::Cache(_) => "cache",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }

    /// Shorthand for building a [`AdapterError::MalformedRecord`].
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord { name: name.into(), reason: reason.into() }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;
