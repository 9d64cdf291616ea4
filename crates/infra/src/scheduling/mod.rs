//! Background scheduling for the poll loop
//!
//! The scheduler follows the usual runtime rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Structured tracing on every cycle

pub mod error;
pub mod poll_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use poll_scheduler::{PollScheduler, PollSchedulerConfig};
