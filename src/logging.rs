//! Logging setup
//!
//! The terminal belongs to the TUI, so tracing output goes to a daily log
//! file under the platform data directory instead of stdout.

use std::path::PathBuf;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "feelya.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing_subscriber::util::TryInitError),
}

/// Where log files live.
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("feelya")
        .join("logs")
}

/// Install the global subscriber. Keep the returned guard alive for the
/// whole process or buffered lines are lost on exit.
pub fn init(filter: &str) -> Result<WorkerGuard, LoggingError> {
    let dir = log_directory();
    std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;

    tracing::info!(
        "feelya v{} logging to {}",
        env!("CARGO_PKG_VERSION"),
        dir.display()
    );
    Ok(guard)
}
