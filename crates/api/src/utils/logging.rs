//! Tracing initialisation for the adapter binary.
//!
//! `RUST_LOG` controls filtering (default `info`); `LOG_FORMAT=json` switches
//! the console output to one JSON object per event.

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
const DEFAULT_FILTER: &str = "info";

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` (case-insensitive) selects the text format.
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }

    pub fn from_env() -> Self {
        Self::from_value(std::env::var(ENV_LOG_FORMAT).ok().as_deref())
    }
}

/// Filter from `RUST_LOG`, falling back to `info` when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns an error if a global subscriber is already set.
pub fn init_tracing() -> anyhow::Result<()> {
    let format = LogFormat::from_env();
    let registry = tracing_subscriber::registry().with(env_filter());

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init()?,
    }

    tracing::debug!(?format, "Tracing initialised");
    Ok(())
}
