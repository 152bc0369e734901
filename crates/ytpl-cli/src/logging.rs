//! Structured logging using tracing.
//!
//! Provides:
//! - Human-readable console output on stderr, overridable through `RUST_LOG`
//! - JSON file output with rotation in the platform data directory
//!
//! Console output is the live trace of a run; the JSON report is the durable
//! record.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown at the configured level.
const OWN_TARGETS: [&str; 2] = ["ytpl_core", "ytpl_cli"];

/// Logging configuration options.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where log files are stored.
    pub log_directory: PathBuf,
    /// Log file name prefix (`ytpl` -> `ytpl.2024-01-15`).
    pub log_file_prefix: String,
    /// Maximum log level for console output.
    pub console_level: Level,
    /// Maximum log level for file output.
    pub file_level: Level,
    /// How often to rotate log files.
    pub rotation: LogRotation,
    /// Whether to include ANSI color codes in console output.
    pub console_ansi: bool,
    /// Whether to include the target module in console output.
    pub include_target: bool,
}

/// Log rotation frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    /// Create a new log file every hour.
    Hourly,
    /// Create a new log file every day.
    Daily,
    /// Never rotate (single log file).
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LoggingConfig {
    /// Verbose console output with module targets.
    #[must_use]
    pub fn development() -> Self {
        Self {
            log_directory: default_log_directory(),
            log_file_prefix: "ytpl".to_string(),
            console_level: Level::DEBUG,
            file_level: Level::TRACE,
            rotation: LogRotation::Daily,
            console_ansi: true,
            include_target: true,
        }
    }

    /// Informational console output only.
    #[must_use]
    pub fn production() -> Self {
        Self {
            log_directory: default_log_directory(),
            log_file_prefix: "ytpl".to_string(),
            console_level: Level::INFO,
            file_level: Level::DEBUG,
            rotation: LogRotation::Daily,
            console_ansi: true,
            include_target: false,
        }
    }

    /// Development config for `--verbose`, production otherwise.
    #[must_use]
    pub fn for_verbosity(verbose: bool) -> Self {
        if verbose {
            Self::development()
        } else {
            Self::production()
        }
    }

    /// Set the log directory.
    #[must_use]
    pub fn with_log_directory(mut self, path: PathBuf) -> Self {
        self.log_directory = path;
        self
    }

    /// Set the console log level.
    #[must_use]
    pub const fn with_console_level(mut self, level: Level) -> Self {
        self.console_level = level;
        self
    }

    /// Set the log rotation frequency.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Guard that keeps file logging active. Drop it to flush the log file.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize console and file logging.
///
/// The returned guard must be kept alive for the duration of the run.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    if !config.log_directory.exists() {
        std::fs::create_dir_all(&config.log_directory).map_err(|e| {
            LoggingError::DirectoryCreationFailed {
                path: config.log_directory.clone(),
                reason: e.to_string(),
            }
        })?;
    }

    let file_appender = RollingFileAppender::new(
        config.rotation.into(),
        &config.log_directory,
        &config.log_file_prefix,
    );
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.console_ansi)
        .with_target(config.include_target)
        .without_time()
        .with_filter(console_filter(config.console_level)?);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(own_filter(config.file_level)?);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize console logging only.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_console(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.console_ansi)
        .with_target(config.include_target)
        .without_time()
        .with_filter(console_filter(config.console_level)?);

    tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(LoggingGuard { _file_guard: None })
}

/// Initialize logging, falling back to console only when file logging fails.
pub fn init_with_fallback(config: &LoggingConfig) -> Option<LoggingGuard> {
    match init(config) {
        Ok(guard) => Some(guard),
        Err(LoggingError::AlreadyInitialized(_)) => None,
        Err(e) => {
            let guard = init_console(config).ok();
            tracing::warn!("File logging disabled: {}", e);
            guard
        }
    }
}

/// Get the default log directory.
#[must_use]
pub fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytpl")
        .join("logs")
}

/// Console filter: `RUST_LOG` when set, else warnings from dependencies and
/// `level` for our own crates.
fn console_filter(level: Level) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => own_filter(level),
    }
}

fn own_filter(level: Level) -> Result<EnvFilter, LoggingError> {
    let directive = level_to_directive(level);
    let directives = OWN_TARGETS
        .iter()
        .fold("warn".to_string(), |directives, target| {
            format!("{directives},{target}={directive}")
        });
    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
        filter: directives,
        reason: e.to_string(),
    })
}

/// Convert a tracing Level to a filter directive string.
const fn level_to_directive(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to create the log directory.
    #[error("Failed to create log directory {path}: {reason}")]
    DirectoryCreationFailed {
        /// The path that could not be created.
        path: PathBuf,
        /// The reason for the failure.
        reason: String,
    },

    /// A filter directive was rejected.
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected filter.
        filter: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}
