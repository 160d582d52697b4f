//! Locates the uploaded artifact to deploy

use pages_api::{ArtifactEntry, ArtifactManifest};
use tracing::debug;

use crate::deploy::classify::{classify, ClassifyContext};
use crate::errors::DeployError;
use crate::http::pages::PagesApi;

const SIGNED_CONTENT_SUFFIX: &str = "&%24expand=SignedContent";

/// Artifact picked from the run's manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub url: String,

    /// Declared size in bytes, when the manifest carries one
    pub size: Option<u64>,
}

impl ResolvedArtifact {
    /// Download URL asking for signed, expanded content
    pub fn signed_content_url(&self) -> String {
        format!("{}{}", self.url, SIGNED_CONTENT_SUFFIX)
    }
}

/// First manifest entry named exactly `artifact_name`
pub fn select_artifact<'a>(
    manifest: &'a ArtifactManifest,
    artifact_name: &str,
) -> Option<&'a ArtifactEntry> {
    manifest.value.iter().find(|entry| entry.name == artifact_name)
}

/// Resolve `artifact_name` among the artifacts uploaded by `run_id`
pub async fn resolve<A: PagesApi + ?Sized>(
    api: &A,
    artifact_name: &str,
    run_id: &str,
    ctx: &ClassifyContext,
) -> Result<ResolvedArtifact, DeployError> {
    let manifest = api.list_artifacts(run_id).await.map_err(|e| match e {
        DeployError::Status { status, message } => classify(status, &message, ctx).into(),
        other => other,
    })?;

    debug!(
        "Artifact manifest lists {} artifact(s): {:?}",
        manifest.value.len(),
        manifest.value.iter().map(|e| e.name.as_str()).collect::<Vec<_>>()
    );

    let entry = select_artifact(&manifest, artifact_name).ok_or_else(|| {
        DeployError::ArtifactNotFound {
            artifact_name: artifact_name.to_string(),
            build_version: ctx.build_version.clone(),
        }
    })?;

    Ok(ResolvedArtifact {
        url: entry.url.clone(),
        size: entry.size,
    })
}
