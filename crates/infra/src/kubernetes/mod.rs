//! Credential directories
//!
//! - [`SecretDirectory`]: labeled secrets read through the Kubernetes API
//! - [`StaticDirectory`]: one fixed record for single-tenant deployments

pub mod secrets;
pub mod static_directory;

pub use secrets::{SecretDirectory, SecretDirectoryConfig};
pub use static_directory::StaticDirectory;
