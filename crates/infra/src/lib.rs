//! # Agent Metrics Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP client and the upstream agent metrics client
//! - Kubernetes secret and single-tenant credential directories
//! - The moka-backed credential cache
//! - The background poll scheduler
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `agentmetrics-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod cache;
pub mod config;
pub mod errors;
pub mod http;
pub mod kubernetes;
pub mod scheduling;
pub mod semaphore;

// Re-export commonly used items
pub use cache::{CredentialCache, CredentialCacheConfig};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientConfig};
pub use kubernetes::{SecretDirectory, SecretDirectoryConfig, StaticDirectory};
pub use scheduling::{PollScheduler, PollSchedulerConfig, SchedulerError, SchedulerResult};
pub use semaphore::{SemaphoreClient, SemaphoreClientConfig};
