//! Logging system.
//!
//! Structured logging via the `tracing` crate. Level, format and output
//! destination are configurable; the `LODGEN_LOG` environment variable
//! takes precedence over the configuration file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::AppError;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stderr, stdout, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (if output is "file")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, terminal outputs only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
        }
    }
}

/// Default log file location under the platform data directory.
pub fn default_log_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "lodgen")
        .map(|dirs| dirs.data_dir().join("lodgen.log"))
        .unwrap_or_else(|| PathBuf::from("lodgen.log"))
}

/// Initialize the logging system.
///
/// Priority order (highest to lowest): `LODGEN_LOG` environment filter,
/// configuration (already merged with CLI flags by the caller), defaults.
pub fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = build_env_filter(config)?;
    let base_subscriber = Registry::default().with(filter);

    let format = config.format.as_str();
    if format != "json" && format != "text" {
        return Err(AppError::Config(format!(
            "invalid log format: {} (must be 'json' or 'text')",
            config.format
        )));
    }

    match config.output.as_str() {
        "file" => {
            let log_file = config.file.clone().unwrap_or_else(default_log_file);
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Config(format!("failed to create log directory: {}", e))
                })?;
            }
            let writer = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .map_err(|e| {
                    AppError::Config(format!("failed to open log file {:?}: {}", log_file, e))
                })?;
            if format == "json" {
                base_subscriber
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_timer(ChronoUtc::rfc_3339())
                            .with_writer(writer),
                    )
                    .init();
            } else {
                base_subscriber
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_timer(ChronoUtc::rfc_3339())
                            .with_ansi(false)
                            .with_writer(writer),
                    )
                    .init();
            }
        }
        "stdout" => {
            if format == "json" {
                base_subscriber
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_timer(ChronoUtc::rfc_3339())
                            .with_writer(std::io::stdout),
                    )
                    .init();
            } else {
                base_subscriber
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_timer(ChronoUtc::rfc_3339())
                            .with_ansi(config.color)
                            .with_writer(std::io::stdout),
                    )
                    .init();
            }
        }
        "stderr" => {
            if format == "json" {
                base_subscriber
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_timer(ChronoUtc::rfc_3339())
                            .with_writer(std::io::stderr),
                    )
                    .init();
            } else {
                base_subscriber
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_timer(ChronoUtc::rfc_3339())
                            .with_ansi(config.color)
                            .with_writer(std::io::stderr),
                    )
                    .init();
            }
        }
        other => {
            return Err(AppError::Config(format!(
                "invalid log output: {} (must be 'stdout', 'stderr', or 'file')",
                other
            )));
        }
    }

    Ok(())
}

/// Build the environment filter from `LODGEN_LOG` or the configured level.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, AppError> {
    if let Ok(filter) = EnvFilter::try_from_env("LODGEN_LOG") {
        return Ok(filter);
    }

    let level = config.level.as_str();
    match level {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(EnvFilter::new(level)),
        other => Err(AppError::Config(format!(
            "invalid log level: {} (must be trace, debug, info, warn, error, or off)",
            other
        ))),
    }
}
