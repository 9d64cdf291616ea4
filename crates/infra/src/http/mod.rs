//! HTTP client shared by the upstream and Kubernetes adapters

pub mod client;

pub use client::{HttpClient, HttpClientConfig};
