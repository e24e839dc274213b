//! Logging infrastructure for prima.
//!
//! Structured logging to the console plus daily-rotating files in the app
//! data directory. A separate `error.log` keeps warnings and errors easy to
//! find when a remote call misbehaves.
//!
//! ```no_run
//! use prima::logging;
//!
//! // Initialize once at startup
//! logging::init().expect("Failed to initialize logging");
//!
//! tracing::info!("client started");
//! ```

use crate::config;
use crate::error::{PrimaError, Result, ResultExt as _};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Gets the log directory path based on platform conventions.
pub fn get_log_dir() -> Result<PathBuf> {
    let log_dir = config::base_dir()?.join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Initializes the logging system with console and file output.
///
/// Creates two log files, both rotating daily with 10 old files kept:
/// - `prima.log`: all levels
/// - `error.log`: warnings and errors only
///
/// The default level is INFO; override with `RUST_LOG`.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or file appenders
/// fail to build.
pub fn init() -> Result<()> {
    let log_dir = get_log_dir()?;

    let all_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("prima")
        .filename_suffix("log")
        .build(&log_dir)
        .map_err(|e| PrimaError::Other(format!("Failed to create log file appender: {e}")))?;

    let error_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("error")
        .filename_suffix("log")
        .build(&log_dir)
        .map_err(|e| PrimaError::Other(format!("Failed to create error log appender: {e}")))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| PrimaError::Config(format!("Invalid log filter: {e}")))?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true);

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .init();

    tracing::debug!("Logging initialized, log directory: {:?}", log_dir);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_dir() {
        let log_dir = get_log_dir().expect("Failed to get log dir");
        assert!(log_dir.ends_with("prima/logs") || log_dir.ends_with("prima\\logs"));
    }
}
