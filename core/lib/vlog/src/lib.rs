//! Structured logging for the sieve workspace.
//!
//! Thin wrapper around `tracing`/`tracing-subscriber`: call [`init`] once at
//! process start, then log through the re-exported `tracing` macros
//! (`vlog::info!`, `vlog::warn!`, `vlog::error!`, `vlog::debug!`). Keeping
//! this as its own crate (rather than each binary configuring `tracing`
//! itself) means every `core/bin/*` entry point gets the same format and
//! level-from-env behavior for free.

pub use tracing::{debug, error, info, trace, warn};

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// Level filtering follows the usual `RUST_LOG` convention (falling back to
/// `info` if unset or unparsable); `format` chooses between human-readable
/// and newline-delimited JSON output.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match format {
        LogFormat::Plain => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}
