//! Logging for the chat bridge.
//!
//! Inside the host the log file is the only useful sink; console output is
//! kept for the development server.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::{BridgeError, Result};

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `RUST_LOG` directives plus the configured level.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(parse_level(level).into())
}

/// Resolve the log file path; relative paths land in `base_dir`.
pub fn log_file_path(config: &LoggingConfig, base_dir: &Path) -> PathBuf {
    let file = Path::new(&config.file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base_dir.join(file)
    }
}

/// Install the global subscriber: an appending log file plus the console.
///
/// A plugin may be loaded more than once per process; a second call returns
/// [`BridgeError::Logging`] and leaves the first subscriber in place.
pub fn init(config: &LoggingConfig, base_dir: &Path) -> Result<()> {
    let path = log_file_path(config, base_dir);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(&path)?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .with_thread_names(true);
    let console_layer = fmt::layer().with_writer(std::io::stdout).with_target(true);

    tracing_subscriber::registry()
        .with(level_filter(&config.level))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| BridgeError::Logging(e.to_string()))
}

/// Console-only logging for the development server and tests.
pub fn init_console_only(level: &str) {
    let installed = tracing_subscriber::registry()
        .with(level_filter(level))
        .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true))
        .try_init();
    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}
