//! # Agent Metrics API
//!
//! Application layer - process bootstrap and the HTTP surface.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - The external metrics API router
//! - Tracing initialisation and shutdown signal handling
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Serves reads from the metric store; never touches upstream APIs

pub mod context;
pub mod server;
pub mod utils;

// Re-export for convenience
pub use context::AppContext;
pub use server::{router, ServerState};
