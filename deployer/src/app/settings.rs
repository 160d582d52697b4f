//! Settings resolution
//!
//! Settings come from an optional JSON file, then the Actions environment
//! (`INPUT_*`, `GITHUB_*`, `ACTIONS_*`), then `--key=value` flags. Later
//! sources win. Empty values are treated as unset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::debug;
use url::Url;

use crate::app::options::{
    Credentials, DeployOptions, DeploymentTarget, Endpoints, PollConfig, DEFAULT_ARTIFACT_NAME,
    DEFAULT_ERROR_COUNT, DEFAULT_REPORTING_INTERVAL,
};
use crate::deploy::client::MAX_TIMEOUT;
use crate::errors::DeployError;
use crate::logs::{LogLevel, LogOptions};

/// Environment variables feeding each setting, in priority order
const ENV_KEYS: &[(&str, &[&str])] = &[
    ("artifact_name", &["INPUT_ARTIFACT_NAME"]),
    ("token", &["INPUT_TOKEN", "GITHUB_TOKEN"]),
    ("timeout", &["INPUT_TIMEOUT"]),
    ("error_count", &["INPUT_ERROR_COUNT"]),
    ("reporting_interval", &["INPUT_REPORTING_INTERVAL"]),
    ("preview", &["INPUT_PREVIEW"]),
    ("build_version", &["GITHUB_SHA"]),
    ("repository", &["GITHUB_REPOSITORY"]),
    ("run_id", &["GITHUB_RUN_ID"]),
    ("runtime_url", &["ACTIONS_RUNTIME_URL"]),
    ("runtime_token", &["ACTIONS_RUNTIME_TOKEN"]),
    ("api_url", &["GITHUB_API_URL"]),
    ("server_url", &["GITHUB_SERVER_URL"]),
    ("oidc_token", &["INPUT_OIDC_TOKEN"]),
    ("output_file", &["GITHUB_OUTPUT"]),
    ("log_level", &["INPUT_LOG_LEVEL"]),
];

/// CLI keys handled by the binary itself
const RESERVED_CLI_KEYS: &[&str] = &["settings", "version"];

/// Deployer settings
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Name of the uploaded artifact
    pub artifact_name: String,

    /// Token with `pages: write`
    #[serde(deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,

    /// Requested deadline in milliseconds
    pub timeout: Option<u64>,

    /// Failed status probes tolerated in a row
    pub error_count: u32,

    /// Milliseconds between status probes
    pub reporting_interval: u64,

    /// Create a preview deployment
    pub preview: bool,

    /// Commit or version being deployed
    pub build_version: Option<String>,

    /// Repository as `owner/name`
    pub repository: Option<String>,

    /// Workflow run that uploaded the artifact
    pub run_id: Option<String>,

    /// Actions runtime URL
    pub runtime_url: Option<String>,

    /// Actions runtime token
    #[serde(deserialize_with = "deserialize_secret")]
    pub runtime_token: Option<SecretString>,

    /// GitHub REST API URL
    pub api_url: String,

    /// GitHub web server URL
    pub server_url: String,

    /// OIDC token forwarded to the Pages API
    #[serde(deserialize_with = "deserialize_secret")]
    pub oidc_token: Option<SecretString>,

    /// File receiving `name=value` outputs
    pub output_file: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,

    /// Log as JSON
    pub log_json: bool,

    /// Also log to this file
    pub log_file: Option<PathBuf>,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_server_url() -> String {
    "https://github.com".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            token: None,
            timeout: None,
            error_count: DEFAULT_ERROR_COUNT,
            reporting_interval: DEFAULT_REPORTING_INTERVAL.as_millis() as u64,
            preview: false,
            build_version: None,
            repository: None,
            run_id: None,
            runtime_url: None,
            runtime_token: None,
            api_url: default_api_url(),
            server_url: default_server_url(),
            oidc_token: None,
            output_file: None,
            log_level: LogLevel::Info,
            log_json: false,
            log_file: None,
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, DeployError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DeployError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> DeployError {
    DeployError::ConfigError(format!("Invalid value for '{}': {}", key, value))
}

impl Settings {
    /// Resolve settings from a settings file (`--settings=path`), the
    /// environment and CLI flags
    pub async fn load(
        env: &HashMap<String, String>,
        cli: &HashMap<String, String>,
    ) -> Result<Self, DeployError> {
        let mut settings = match cli.get("settings") {
            Some(path) => Self::read_file(Path::new(path)).await?,
            None => Self::default(),
        };
        settings.apply_env(env)?;
        settings.apply_cli(cli)?;
        Ok(settings)
    }

    /// Read settings from a JSON file. Unknown keys are rejected.
    pub async fn read_file(path: &Path) -> Result<Self, DeployError> {
        let contents = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&contents).map_err(|e| {
            DeployError::ConfigError(format!("Invalid settings file {}: {}", path.display(), e))
        })
    }

    /// Overlay values from environment variables
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), DeployError> {
        if env.get("RUNNER_DEBUG").map(String::as_str) == Some("1") {
            self.log_level = LogLevel::Debug;
        }

        for (key, names) in ENV_KEYS {
            let value = names
                .iter()
                .filter_map(|name| env.get(*name))
                .find(|value| !value.is_empty());
            if let Some(value) = value {
                self.set(key, value)?;
            }
        }
        Ok(())
    }

    /// Overlay values from `--key=value` flags
    pub fn apply_cli(&mut self, cli: &HashMap<String, String>) -> Result<(), DeployError> {
        for (key, value) in cli {
            if RESERVED_CLI_KEYS.contains(&key.as_str()) || value.is_empty() {
                continue;
            }
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Set a single setting from its textual form
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), DeployError> {
        match key {
            "artifact_name" => self.artifact_name = value.to_string(),
            "token" => self.token = Some(SecretString::from(value.to_string())),
            "timeout" => self.timeout = Some(parse_number(key, value)?),
            "error_count" => self.error_count = parse_number(key, value)?,
            "reporting_interval" => self.reporting_interval = parse_number(key, value)?,
            "preview" => self.preview = parse_bool(key, value)?,
            "build_version" => self.build_version = Some(value.to_string()),
            "repository" => self.repository = Some(value.to_string()),
            "run_id" => self.run_id = Some(value.to_string()),
            "runtime_url" => self.runtime_url = Some(value.to_string()),
            "runtime_token" => self.runtime_token = Some(SecretString::from(value.to_string())),
            "api_url" => self.api_url = value.to_string(),
            "server_url" => self.server_url = value.to_string(),
            "oidc_token" => self.oidc_token = Some(SecretString::from(value.to_string())),
            "output_file" => self.output_file = Some(PathBuf::from(value)),
            "log_level" => {
                self.log_level = value
                    .parse()
                    .map_err(DeployError::ConfigError)?
            }
            "log_json" => self.log_json = parse_bool(key, value)?,
            "log_file" => self.log_file = Some(PathBuf::from(value)),
            _ => {
                return Err(DeployError::ConfigError(format!(
                    "Unknown setting: {}",
                    key
                )))
            }
        }
        Ok(())
    }

    /// Logging options derived from the settings
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: self.log_level,
            stdout: true,
            log_file: self.log_file.clone(),
            json_format: self.log_json,
        }
    }

    /// Validate and convert into deployment options
    pub fn into_options(self) -> Result<DeployOptions, DeployError> {
        let token = required(self.token, "token", "INPUT_TOKEN or GITHUB_TOKEN")?;
        let runtime_token = required(self.runtime_token, "runtime_token", "ACTIONS_RUNTIME_TOKEN")?;
        let build_version = required(self.build_version, "build_version", "GITHUB_SHA")?;
        let repository = required(self.repository, "repository", "GITHUB_REPOSITORY")?;
        let run_id = required(self.run_id, "run_id", "GITHUB_RUN_ID")?;
        let runtime_url = required(self.runtime_url, "runtime_url", "ACTIONS_RUNTIME_URL")?;

        if repository.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(DeployError::ConfigError(format!(
                "Invalid repository '{}', expected 'owner/name'",
                repository
            )));
        }
        Url::parse(&runtime_url)?;
        Url::parse(&self.api_url)?;
        Url::parse(&self.server_url)?;

        let options = DeployOptions {
            target: DeploymentTarget {
                build_version,
                repository,
                run_id,
                server_url: self.server_url,
                preview: self.preview,
            },
            poll: PollConfig {
                artifact_name: self.artifact_name,
                error_count: self.error_count,
                reporting_interval: Duration::from_millis(self.reporting_interval),
                max_timeout: MAX_TIMEOUT,
                timeout: self.timeout.map(Duration::from_millis),
            },
            endpoints: Endpoints {
                api_url: self.api_url,
                runtime_url,
            },
            credentials: Credentials {
                token,
                runtime_token,
                oidc_token: self.oidc_token,
            },
            output_file: self.output_file,
        };

        debug!("all variables are set");
        Ok(options)
    }
}

fn required<T>(value: Option<T>, key: &str, source: &str) -> Result<T, DeployError> {
    value.ok_or_else(|| {
        DeployError::ConfigError(format!("Missing required setting '{}' ({})", key, source))
    })
}
