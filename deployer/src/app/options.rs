//! Deployment options handed to the controller

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::deploy::client::MAX_TIMEOUT;

/// Default deadline when the caller does not request one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(600_000);

/// Default delay between two status probes
pub const DEFAULT_REPORTING_INTERVAL: Duration = Duration::from_millis(5_000);

/// Default number of tolerated failed status probes
pub const DEFAULT_ERROR_COUNT: u32 = 10;

/// Default artifact name
pub const DEFAULT_ARTIFACT_NAME: &str = "github-pages";

/// Complete configuration of one deployment attempt
#[derive(Debug)]
pub struct DeployOptions {
    /// What is deployed and where
    pub target: DeploymentTarget,

    /// Polling behaviour
    pub poll: PollConfig,

    /// Service locations
    pub endpoints: Endpoints,

    /// Tokens
    pub credentials: Credentials,

    /// File receiving `name=value` outputs
    pub output_file: Option<PathBuf>,
}

/// Identity of the deployment
#[derive(Debug, Clone)]
pub struct DeploymentTarget {
    /// Commit or version being deployed
    pub build_version: String,

    /// Repository as `owner/name`
    pub repository: String,

    /// Workflow run that uploaded the artifact
    pub run_id: String,

    /// GitHub web server URL
    pub server_url: String,

    /// Request a preview deployment
    pub preview: bool,
}

/// Polling configuration
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Name of the uploaded artifact to deploy
    pub artifact_name: String,

    /// Failed status probes tolerated in a row before giving up
    pub error_count: u32,

    /// Time between two status probes. Zero probes back-to-back.
    pub reporting_interval: Duration,

    /// Hard upper bound for the deadline
    pub max_timeout: Duration,

    /// Deadline requested by the caller
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            error_count: DEFAULT_ERROR_COUNT,
            reporting_interval: DEFAULT_REPORTING_INTERVAL,
            max_timeout: MAX_TIMEOUT,
            timeout: None,
        }
    }
}

impl PollConfig {
    /// Requested deadline, or the default when none was given
    pub fn requested_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Whether the requested deadline is above the ceiling
    pub fn timeout_exceeds_ceiling(&self) -> bool {
        self.requested_timeout() > self.max_timeout
    }

    /// Deadline the supervisor enforces
    pub fn effective_timeout(&self) -> Duration {
        self.requested_timeout().min(self.max_timeout)
    }
}

/// Service base URLs
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// GitHub REST API, e.g. `https://api.github.com`
    pub api_url: String,

    /// Actions runtime serving the artifact manifest
    pub runtime_url: String,
}

/// Tokens used by the deployment
#[derive(Debug)]
pub struct Credentials {
    /// Token allowed to write Pages
    pub token: SecretString,

    /// Token for the Actions runtime
    pub runtime_token: SecretString,

    /// OIDC token forwarded to the Pages API
    pub oidc_token: Option<SecretString>,
}
