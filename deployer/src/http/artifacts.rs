//! Actions runtime artifact API

use pages_api::ArtifactManifest;
use secrecy::SecretString;
use url::Url;

use crate::errors::DeployError;
use crate::http::client::HttpClient;

const ARTIFACTS_API_VERSION: &str = "6.0-preview";

/// Manifest URL of the artifacts uploaded by a workflow run
pub fn artifacts_url(runtime_url: &str, run_id: &str) -> Result<Url, DeployError> {
    let base = if runtime_url.ends_with('/') {
        Url::parse(runtime_url)?
    } else {
        Url::parse(&format!("{}/", runtime_url))?
    };

    let mut url = base.join(&format!("_apis/pipelines/workflows/{}/artifacts", run_id))?;
    url.query_pairs_mut()
        .append_pair("api-version", ARTIFACTS_API_VERSION);
    Ok(url)
}

impl HttpClient {
    /// List the artifacts uploaded by a workflow run
    pub async fn list_artifacts(
        &self,
        runtime_url: &str,
        run_id: &str,
        token: &SecretString,
    ) -> Result<ArtifactManifest, DeployError> {
        let url = artifacts_url(runtime_url, run_id)?;
        self.get(url.as_str(), token).await
    }
}
