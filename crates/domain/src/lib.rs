//! # Agent Metrics Domain
//!
//! Domain types for the external metrics adapter.
//!
//! This crate contains:
//! - Credential records (`AgentType`) and the upstream metrics schema
//! - Exported metric values and the `Labeled` capability used by selectors
//! - Configuration structures
//! - The error taxonomy and Result definition
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
