//! Maps failed Pages API responses to actionable errors

use std::fmt;

use http::StatusCode;
use pages_api::ErrorResponse;
use thiserror::Error;

const GITHUB_DOT_COM: &str = "https://github.com";

/// What the caller needs to know to build a message
#[derive(Debug, Clone)]
pub struct ClassifyContext {
    /// Build version being deployed
    pub build_version: String,

    /// Repository as `owner/name`
    pub repository: String,

    /// GitHub web server URL, used for the settings hint
    pub server_url: String,
}

/// Category of a failed deployment request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// 400: the payload was rejected
    BadRequest { message: String },

    /// 403: the token cannot write Pages
    Forbidden,

    /// 404: Pages is not enabled for the repository
    PagesNotEnabled { settings_url: String, enterprise: bool },

    /// 5xx: outage or server fault
    ServerError,

    /// Anything else
    Other { message: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::BadRequest { message } | FailureKind::Other { message } => {
                write!(f, "Responded with: {}", message)
            }
            FailureKind::Forbidden => {
                write!(f, "Ensure GITHUB_TOKEN has permission \"pages: write\".")
            }
            FailureKind::PagesNotEnabled {
                settings_url,
                enterprise,
            } => {
                write!(f, "Ensure GitHub Pages has been enabled: {}", settings_url)?;
                if *enterprise {
                    write!(
                        f,
                        "\nNote: This action does not support GitHub Enterprise Server 3.6 or older."
                    )?;
                }
                Ok(())
            }
            FailureKind::ServerError => write!(
                f,
                "Server error, is githubstatus.com reporting a Pages outage? Please re-run the deployment at a later time."
            ),
        }
    }
}

/// A failed response turned into a human-actionable error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to create deployment (status: {status}) with build version {build_version}. {kind}")]
pub struct ClassifiedError {
    pub status: u16,
    pub build_version: String,
    pub kind: FailureKind,
}

/// Classify a failed response. `message` is the server's explanation as
/// returned by [`response_message`].
pub fn classify(status: u16, message: &str, ctx: &ClassifyContext) -> ClassifiedError {
    let kind = match status {
        400 => FailureKind::BadRequest {
            message: message.to_string(),
        },
        403 => FailureKind::Forbidden,
        404 => {
            let server_url = ctx.server_url.trim_end_matches('/');
            FailureKind::PagesNotEnabled {
                settings_url: format!("{}/{}/settings/pages", server_url, ctx.repository),
                enterprise: server_url != GITHUB_DOT_COM,
            }
        }
        500..=599 => FailureKind::ServerError,
        _ => FailureKind::Other {
            message: message.to_string(),
        },
    };

    ClassifiedError {
        status,
        build_version: ctx.build_version.clone(),
        kind,
    }
}

/// Extract the explanation from a response body.
///
/// JSON bodies yield their `message` field; other bodies are used verbatim.
/// Falls back to the canonical reason phrase of the status.
pub fn response_message(status: u16, body: &str) -> String {
    let reason = || {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown status")
            .to_string()
    };

    let body = body.trim();
    if body.is_empty() {
        return reason();
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => serde_json::from_value::<ErrorResponse>(value)
            .ok()
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(reason),
        Err(_) => body.to_string(),
    }
}
