//! Credential caching with moka

pub mod credential_cache;

pub use credential_cache::{CredentialCache, CredentialCacheConfig};
