//! HTTP surface serving the external metrics API from the metric store.
//!
//! Reads never reach upstream APIs; they only see the snapshot published by
//! the most recent successful poll cycle.

pub mod error;
pub mod handlers;
pub mod responses;
pub mod routes;

use agentmetrics_core::MetricStore;

pub use error::ApiError;
pub use routes::router;

/// Shared state for every handler
#[derive(Clone, Default)]
pub struct ServerState {
    store: MetricStore,
}

impl ServerState {
    /// State reading from `store`.
    pub fn new(store: MetricStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }
}
