//! Logging setup.
//!
//! Console logging always; a daily-rolling file as well when a log directory
//! is configured.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "chaincompass=info,tower_http=info,warn";
const LOG_FILE_PREFIX: &str = "chaincompass.log";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialise the global tracing subscriber.
///
/// Returns a [`WorkerGuard`] when file logging is enabled. It must be held
/// for the lifetime of the process; dropping it flushes and closes the file.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer().with_target(true).with_filter(filter());

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry().with(console_layer).try_init()?;
        return Ok(None);
    };

    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(non_blocking_file)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    info!("Logging to {}", log_dir.join(LOG_FILE_PREFIX).display());

    Ok(Some(guard))
}
