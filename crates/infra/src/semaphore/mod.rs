//! Upstream self-hosted agent metrics API

pub mod client;

pub use client::{SemaphoreClient, SemaphoreClientConfig};
