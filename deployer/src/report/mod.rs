//! Observability sink and failure reporter
//!
//! The controller announces everything the caller should see through a
//! [`Reporter`]: leveled messages, named outputs and at most one terminal
//! failure per attempt. How those reach the outside world is up to the
//! implementation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Delimiter for multi-line entries of an outputs file
const OUTPUT_DELIMITER: &str = "ghadelimiter";

/// Sink for user-facing deployment messages and outputs
#[async_trait]
pub trait Reporter: Send + Sync {
    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str);

    /// Publish a named output value
    async fn set_output(&self, name: &str, value: &str);

    /// Report the terminal failure of the attempt
    fn set_failed(&self, message: &str);
}

/// Render one entry of an outputs file.
///
/// Single-line values are written as `name=value`. Values spanning lines use
/// `name<<DELIMITER`, with a delimiter that does not occur in the value, so
/// they cannot inject extra outputs.
pub fn format_output(name: &str, value: &str) -> String {
    if !value.contains(['\n', '\r']) {
        return format!("{}={}\n", name, value);
    }

    let mut delimiter = OUTPUT_DELIMITER.to_string();
    let mut attempt = 0;
    while value.contains(&delimiter) {
        attempt += 1;
        delimiter = format!("{}_{}", OUTPUT_DELIMITER, attempt);
    }
    format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
}

/// Reporter that forwards to `tracing` and appends outputs to an
/// outputs file (`GITHUB_OUTPUT` convention) when one is configured.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    output_file: Option<PathBuf>,
}

impl TracingReporter {
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    async fn append_output(&self, path: &Path, name: &str, value: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(format_output(name, value).as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl Reporter for TracingReporter {
    fn debug(&self, message: &str) {
        debug!("{}", message);
    }

    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }

    async fn set_output(&self, name: &str, value: &str) {
        info!(output = name, "{}={}", name, value);
        if let Some(path) = &self.output_file {
            if let Err(e) = self.append_output(path, name, value).await {
                error!("Unable to write output '{}' to {}: {}", name, path.display(), e);
            }
        }
    }

    fn set_failed(&self, message: &str) {
        error!(failed = true, "{}", message);
    }
}

/// Everything a [`RecordingReporter`] has seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Debug(String),
    Info(String),
    Warning(String),
    Error(String),
    Output { name: String, value: String },
    Failed(String),
}

/// Reporter that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReportEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, event: ReportEvent) {
        self.lock().push(event);
    }

    /// All events in order
    pub fn events(&self) -> Vec<ReportEvent> {
        self.lock().clone()
    }

    fn collect(&self, pick: impl Fn(&ReportEvent) -> Option<&String>) -> Vec<String> {
        self.lock().iter().filter_map(|e| pick(e).cloned()).collect()
    }

    pub fn debugs(&self) -> Vec<String> {
        self.collect(|e| match e {
            ReportEvent::Debug(m) => Some(m),
            _ => None,
        })
    }

    pub fn infos(&self) -> Vec<String> {
        self.collect(|e| match e {
            ReportEvent::Info(m) => Some(m),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<String> {
        self.collect(|e| match e {
            ReportEvent::Warning(m) => Some(m),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.collect(|e| match e {
            ReportEvent::Error(m) => Some(m),
            _ => None,
        })
    }

    pub fn failures(&self) -> Vec<String> {
        self.collect(|e| match e {
            ReportEvent::Failed(m) => Some(m),
            _ => None,
        })
    }

    /// Last value published for `name`
    pub fn output(&self, name: &str) -> Option<String> {
        self.lock().iter().rev().find_map(|e| match e {
            ReportEvent::Output { name: n, value } if n == name => Some(value.clone()),
            _ => None,
        })
    }

    pub fn last_info(&self) -> Option<String> {
        self.infos().pop()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    fn debug(&self, message: &str) {
        self.push(ReportEvent::Debug(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(ReportEvent::Info(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(ReportEvent::Warning(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(ReportEvent::Error(message.to_string()));
    }

    async fn set_output(&self, name: &str, value: &str) {
        self.push(ReportEvent::Output {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn set_failed(&self, message: &str) {
        self.push(ReportEvent::Failed(message.to_string()));
    }
}
