//! # Agent Metrics Core
//!
//! Pure collection logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the credential directory and upstream metrics API
//! - The label selector engine and the snapshot metric store
//! - The per-cycle aggregator and collection service
//! - Retry policies for the poll loop
//!
//! ## Architecture Principles
//! - Only depends on `agentmetrics-domain`
//! - No HTTP, Kubernetes or cache code
//! - All external dependencies via traits

pub mod collection;
pub mod ports;
pub mod retry;
pub mod selector;
pub mod store;

pub use collection::{Aggregator, CollectionService, CycleOutcome};
pub use ports::{CredentialDirectory, MetricsSource, RecordResolver};
pub use retry::{ExponentialBackoff, FixedInterval, RetryPolicy};
pub use selector::{LabelMatcher, Requirement, Selector};
pub use store::MetricStore;
