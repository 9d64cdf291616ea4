//! Domain types and models

pub mod agent_type;
pub mod labels;
pub mod metrics;

pub use agent_type::AgentType;
pub use labels::Labeled;
pub use metrics::{AgentMetrics, ExportedValue, JobMetrics, MetricKind, RawMetrics};
