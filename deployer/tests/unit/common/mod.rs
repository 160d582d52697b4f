//! Shared fixtures for the deployment tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deploy_pages::app::options::{DeploymentTarget, PollConfig};
use deploy_pages::deploy::MAX_TIMEOUT;
use deploy_pages::errors::DeployError;
use deploy_pages::http::pages::PagesApi;
use deploy_pages::report::RecordingReporter;
use pages_api::{
    ArtifactEntry, ArtifactManifest, CreateDeploymentRequest, CreateDeploymentResponse,
    DeploymentStatusResponse,
};

pub const REPOSITORY: &str = "actions/is-awesome";
pub const STATUS_URL: &str =
    "https://api.github.com/repos/actions/is-awesome/pages/deployments/valid-build-version";

/// Scripted reply of the fake API
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Status(u16, &'static str),
}

impl<T: Clone> Reply<T> {
    fn get(&self) -> Result<T, DeployError> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Status(status, message) => Err(DeployError::Status {
                status: *status,
                message: message.to_string(),
            }),
        }
    }
}

/// In-memory Pages API counting every call
pub struct FakePagesApi {
    pub manifest: Reply<ArtifactManifest>,
    pub create: Reply<CreateDeploymentResponse>,
    pub statuses: Mutex<VecDeque<Reply<String>>>,
    pub status_fallback: Reply<String>,
    pub cancel: Reply<()>,

    pub manifest_calls: AtomicUsize,
    pub create_requests: Mutex<Vec<CreateDeploymentRequest>>,
    pub status_calls: AtomicUsize,
    pub cancel_urls: Mutex<Vec<String>>,
}

impl Default for FakePagesApi {
    fn default() -> Self {
        Self {
            manifest: Reply::Ok(manifest(vec![
                entry("another-artifact", "https://another-artifact.com", None),
                entry("github-pages", "https://fake-artifact.com", None),
            ])),
            create: Reply::Ok(CreateDeploymentResponse {
                status_url: STATUS_URL.to_string(),
                page_url: "https://actions.github.io/is-awesome".to_string(),
                preview_url: None,
            }),
            statuses: Mutex::new(VecDeque::new()),
            status_fallback: Reply::Ok("succeed".to_string()),
            cancel: Reply::Ok(()),
            manifest_calls: AtomicUsize::new(0),
            create_requests: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            cancel_urls: Mutex::new(Vec::new()),
        }
    }
}

impl FakePagesApi {
    /// Status replies in order; `fallback` answers once they run out
    pub fn with_statuses(mut self, statuses: Vec<Reply<String>>, fallback: Reply<String>) -> Self {
        self.statuses = Mutex::new(statuses.into());
        self.status_fallback = fallback;
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_requests.lock().unwrap().len()
    }

    pub fn last_create_request(&self) -> CreateDeploymentRequest {
        self.create_requests.lock().unwrap().last().cloned().unwrap()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_urls.lock().unwrap().len()
    }

    pub fn total_calls(&self) -> usize {
        self.manifest_calls.load(Ordering::SeqCst)
            + self.create_calls()
            + self.status_calls()
            + self.cancel_calls()
    }
}

#[async_trait]
impl PagesApi for FakePagesApi {
    async fn list_artifacts(&self, _run_id: &str) -> Result<ArtifactManifest, DeployError> {
        self.manifest_calls.fetch_add(1, Ordering::SeqCst);
        self.manifest.get()
    }

    async fn create_deployment(
        &self,
        request: &CreateDeploymentRequest,
    ) -> Result<CreateDeploymentResponse, DeployError> {
        self.create_requests.lock().unwrap().push(request.clone());
        self.create.get()
    }

    async fn deployment_status(
        &self,
        status_url: &str,
    ) -> Result<DeploymentStatusResponse, DeployError> {
        assert_eq!(status_url, STATUS_URL);
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        let status = next.unwrap_or_else(|| self.status_fallback.clone()).get()?;
        Ok(DeploymentStatusResponse { status })
    }

    async fn cancel_deployment(&self, cancel_url: &str) -> Result<(), DeployError> {
        self.cancel_urls.lock().unwrap().push(cancel_url.to_string());
        self.cancel.get()
    }
}

pub fn entry(name: &str, url: &str, size: Option<u64>) -> ArtifactEntry {
    ArtifactEntry {
        name: name.to_string(),
        url: url.to_string(),
        size,
    }
}

pub fn manifest(entries: Vec<ArtifactEntry>) -> ArtifactManifest {
    ArtifactManifest { value: entries }
}

pub fn target(build_version: &str) -> DeploymentTarget {
    DeploymentTarget {
        build_version: build_version.to_string(),
        repository: REPOSITORY.to_string(),
        run_id: "123".to_string(),
        server_url: "https://github.com".to_string(),
        preview: false,
    }
}

pub fn poll() -> PollConfig {
    PollConfig {
        artifact_name: "github-pages".to_string(),
        error_count: 10,
        reporting_interval: Duration::from_millis(50),
        max_timeout: MAX_TIMEOUT,
        timeout: None,
    }
}

pub fn reporter() -> Arc<RecordingReporter> {
    Arc::new(RecordingReporter::new())
}
