//! Poll-cycle collection: fan-out fetches and publishing into the store

pub mod aggregator;
pub mod service;

pub use aggregator::Aggregator;
pub use service::{CollectionService, CycleOutcome};
