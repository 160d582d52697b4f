//! API models

use serde::{Deserialize, Deserializer, Serialize};

/// Artifact manifest of a workflow run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactManifest {
    #[serde(default)]
    pub value: Vec<ArtifactEntry>,
}

/// A single uploaded artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub url: String,
    /// Declared size in bytes. The runtime reports it as a string.
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
}

/// Pages deployment creation request
///
/// Optional keys are omitted entirely when unset: the API keys off their
/// presence, not their value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeploymentRequest {
    pub artifact_url: String,
    pub pages_build_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<bool>,
}

/// Pages deployment creation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeploymentResponse {
    pub status_url: String,
    pub page_url: String,
    #[serde(default)]
    pub preview_url: Option<String>,
}

/// Pages deployment status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatusResponse {
    pub status: String,
}

/// Error body returned by the GitHub API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSize {
        Number(u64),
        Text(String),
    }

    match Option::<RawSize>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawSize::Number(n)) => Ok(Some(n)),
        Some(RawSize::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawSize::Text(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
