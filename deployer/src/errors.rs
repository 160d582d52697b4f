//! Error types for the Pages deployer

use thiserror::Error;

use crate::deploy::classify::ClassifiedError;

/// Main error type for the Pages deployer
#[derive(Error, Debug)]
pub enum DeployError {
    /// A non-2xx response from a Pages or artifact endpoint, already turned
    /// into an actionable message.
    #[error("{0}")]
    Classified(#[from] ClassifiedError),

    #[error(
        "Failed to create deployment with build version {build_version}. No uploaded artifact named \
         '{artifact_name}' was found! Please check if there are any errors at build step, or uploaded \
         artifact name is correct."
    )]
    ArtifactNotFound {
        artifact_name: String,
        build_version: String,
    },

    /// Raw non-2xx response as seen by the HTTP layer.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Invalid deployment state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeployError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeployError::Status { status, .. } => Some(*status),
            DeployError::Classified(err) => Some(err.status),
            DeployError::HttpError(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
