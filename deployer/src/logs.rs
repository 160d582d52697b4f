//! Logging configuration

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::errors::DeployError;

/// Verbosity of the deployer's own logs.
///
/// Accepts the Actions spelling `warning` next to `warn`. `RUNNER_DEBUG=1`
/// in a workflow selects [`LogLevel::Debug`]; `RUST_LOG` overrides all of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&LevelFilter::from(*self), f)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            other => {
                return Err(format!(
                    "Unknown log level '{}', expected one of trace, debug, info, warning, error",
                    other
                ))
            }
        };
        Ok(level)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

/// Logging options
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Log level
    pub log_level: LogLevel,

    /// Write logs to stdout
    pub stdout: bool,

    /// Also write logs to this file
    pub log_file: Option<PathBuf>,

    /// Enable JSON format
    pub json_format: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            stdout: true,
            log_file: None,
            json_format: false,
        }
    }
}

/// Initialize logging.
///
/// The returned guard flushes the log file when dropped and must live as long
/// as the program logs.
pub fn init_logging(options: &LogOptions) -> Result<Option<WorkerGuard>, DeployError> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(options.log_level).into())
        .from_env_lossy();

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if options.stdout {
        if options.json_format {
            layers.push(layer_fmt::layer().json().boxed());
        } else {
            layers.push(layer_fmt::layer().boxed());
        }
    }

    let mut guard = None;
    if let Some(path) = &options.log_file {
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| DeployError::ConfigError(format!("Invalid log file: {}", path.display())))?;

        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(layer_fmt::layer().with_ansi(false).with_writer(writer).boxed());
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| DeployError::ConfigError(e.to_string()))?;

    Ok(guard)
}
