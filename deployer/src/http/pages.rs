//! Pages deployment API

use async_trait::async_trait;
use pages_api::{
    ArtifactManifest, CreateDeploymentRequest, CreateDeploymentResponse, DeploymentStatusResponse,
};
use secrecy::SecretString;

use crate::app::options::Endpoints;
use crate::errors::DeployError;
use crate::http::client::HttpClient;

/// Remote operations the deployment controller relies on.
///
/// Non-2xx responses surface as [`DeployError::Status`].
#[async_trait]
pub trait PagesApi: Send + Sync {
    /// Fetch the artifact manifest of a workflow run
    async fn list_artifacts(&self, run_id: &str) -> Result<ArtifactManifest, DeployError>;

    /// Create a Pages deployment
    async fn create_deployment(
        &self,
        request: &CreateDeploymentRequest,
    ) -> Result<CreateDeploymentResponse, DeployError>;

    /// Fetch the status of a deployment
    async fn deployment_status(
        &self,
        status_url: &str,
    ) -> Result<DeploymentStatusResponse, DeployError>;

    /// Abort a deployment
    async fn cancel_deployment(&self, cancel_url: &str) -> Result<(), DeployError>;
}

/// [`PagesApi`] backed by GitHub over HTTP
pub struct PagesClient {
    http: HttpClient,
    endpoints: Endpoints,
    repository: String,
    token: SecretString,
    runtime_token: SecretString,
}

impl PagesClient {
    pub fn new(
        http: HttpClient,
        endpoints: Endpoints,
        repository: String,
        token: SecretString,
        runtime_token: SecretString,
    ) -> Self {
        Self {
            http,
            endpoints,
            repository,
            token,
            runtime_token,
        }
    }

    /// Endpoint creating deployments for the repository
    pub fn deployments_url(&self) -> String {
        format!(
            "{}/repos/{}/pages/deployments",
            self.endpoints.api_url.trim_end_matches('/'),
            self.repository
        )
    }
}

#[async_trait]
impl PagesApi for PagesClient {
    async fn list_artifacts(&self, run_id: &str) -> Result<ArtifactManifest, DeployError> {
        self.http
            .list_artifacts(&self.endpoints.runtime_url, run_id, &self.runtime_token)
            .await
    }

    async fn create_deployment(
        &self,
        request: &CreateDeploymentRequest,
    ) -> Result<CreateDeploymentResponse, DeployError> {
        self.http
            .post(&self.deployments_url(), &self.token, request)
            .await
    }

    async fn deployment_status(
        &self,
        status_url: &str,
    ) -> Result<DeploymentStatusResponse, DeployError> {
        self.http.get(status_url, &self.token).await
    }

    async fn cancel_deployment(&self, cancel_url: &str) -> Result<(), DeployError> {
        self.http.post_empty(cancel_url, &self.token).await
    }
}
