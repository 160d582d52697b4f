//! Create, probe and cancel a Pages deployment

use std::sync::Arc;
use std::time::Duration;

use pages_api::CreateDeploymentRequest;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::app::options::{DeploymentTarget, PollConfig};
use crate::authn::identity_token::IdentityToken;
use crate::deploy::classify::{classify, ClassifyContext};
use crate::deploy::fsm::{DeploymentEvent, DeploymentFsm, DeploymentRecord, DeploymentState};
use crate::deploy::resolver::{self, ResolvedArtifact};
use crate::errors::DeployError;
use crate::http::pages::PagesApi;
use crate::report::Reporter;

/// Hard ceiling for the supervision deadline
pub const MAX_TIMEOUT: Duration = Duration::from_millis(600_000);

/// Largest artifact the service is known to accept
pub const ONE_GIGABYTE: u64 = 1_073_741_824;

/// Human form of [`ONE_GIGABYTE`]
pub const SIZE_LIMIT_DESCRIPTION: &str = "1 GB";

/// Client for one deployment attempt
pub struct DeploymentClient<A: PagesApi> {
    api: Arc<A>,
    reporter: Arc<dyn Reporter>,
    target: DeploymentTarget,
    poll: PollConfig,
    fsm: DeploymentFsm,
    timeout: Duration,
}

impl<A: PagesApi> DeploymentClient<A> {
    pub fn new(
        api: Arc<A>,
        reporter: Arc<dyn Reporter>,
        target: DeploymentTarget,
        poll: PollConfig,
    ) -> Self {
        let timeout = poll.effective_timeout();
        Self {
            api,
            reporter,
            target,
            poll,
            fsm: DeploymentFsm::new(),
            timeout,
        }
    }

    /// Deadline enforced while supervising
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    pub fn state(&self) -> &DeploymentState {
        self.fsm.state()
    }

    pub fn record(&self) -> Option<&DeploymentRecord> {
        self.fsm.record()
    }

    pub(crate) fn pending_mut(&mut self) -> Option<&mut DeploymentRecord> {
        self.fsm.pending_mut()
    }

    /// Apply a state transition
    pub fn transition(&mut self, event: DeploymentEvent) -> Result<(), DeployError> {
        self.fsm.process(event)
    }

    fn classify_context(&self) -> ClassifyContext {
        ClassifyContext {
            build_version: self.target.build_version.clone(),
            repository: self.target.repository.clone(),
            server_url: self.target.server_url.clone(),
        }
    }

    /// Resolve the artifact and create the deployment.
    ///
    /// Failures are fatal and leave the client without a deployment.
    pub async fn create(
        &mut self,
        identity_token: Option<&SecretString>,
    ) -> Result<&DeploymentRecord, DeployError> {
        if self.fsm.record().is_some() {
            return Err(DeployError::InvalidState(format!(
                "A deployment for {} was already created",
                self.target.build_version
            )));
        }

        let ctx = self.classify_context();
        let artifact = resolver::resolve(
            self.api.as_ref(),
            &self.poll.artifact_name,
            &self.target.run_id,
            &ctx,
        )
        .await?;
        debug!("Resolved artifact '{}' at {}", self.poll.artifact_name, artifact.url);

        self.warn_on_artifact_size(&artifact);
        self.warn_on_timeout_ceiling();

        if let Some(token) = identity_token {
            inspect_identity_token(token);
        }

        let request = CreateDeploymentRequest {
            artifact_url: artifact.signed_content_url(),
            pages_build_version: self.target.build_version.clone(),
            oidc_token: identity_token.map(|t| t.expose_secret().to_string()),
            preview: self.target.preview.then_some(true),
        };

        let response = self
            .api
            .create_deployment(&request)
            .await
            .map_err(|e| match e {
                DeployError::Status { status, message } => classify(status, &message, &ctx).into(),
                other => other,
            })?;

        let record = DeploymentRecord::new(
            response.status_url,
            response.page_url,
            response.preview_url,
        );
        debug!(
            "Deployment status URL: {}, page URL: {}",
            record.status_url(),
            record.page_url()
        );
        self.fsm.process(DeploymentEvent::Created(record))?;

        self.reporter.info(&format!(
            "Created deployment for {}",
            self.target.build_version
        ));

        self.fsm
            .record()
            .ok_or_else(|| DeployError::Internal("Created deployment is missing".to_string()))
    }

    fn warn_on_artifact_size(&self, artifact: &ResolvedArtifact) {
        if let Some(size) = artifact.size {
            if size > ONE_GIGABYTE {
                self.reporter.warning(&format!(
                    "Uploaded artifact size of {} bytes exceeds the allowed size of {}. Deployment might fail.",
                    size, SIZE_LIMIT_DESCRIPTION
                ));
            }
        }
    }

    fn warn_on_timeout_ceiling(&self) {
        if self.poll.timeout_exceeds_ceiling() {
            self.reporter.warning(&format!(
                "Warning: timeout value is greater than the allowed maximum - timeout set to the maximum of {} milliseconds.",
                self.poll.max_timeout.as_millis()
            ));
        }
    }

    /// Probe the deployment status once
    pub async fn check(&self) -> Result<String, DeployError> {
        let record = self.fsm.record().ok_or_else(|| {
            DeployError::InvalidState("No deployment to check".to_string())
        })?;

        let response = self.api.deployment_status(record.status_url()).await?;
        Ok(response.status)
    }

    /// Cancel the deployment, if any. Failures are logged, never returned.
    pub async fn cancel(&self) {
        let Some(record) = self.fsm.record() else {
            self.reporter.debug("No deployment to cancel");
            return;
        };

        match self.api.cancel_deployment(&record.cancel_url()).await {
            Ok(()) => self.reporter.info(&format!(
                "Canceled deployment with ID {}",
                self.target.build_version
            )),
            Err(e) => self
                .reporter
                .error(&format!("Canceling Pages deployment failed: {}", e)),
        }
    }
}

fn inspect_identity_token(token: &SecretString) {
    match IdentityToken::from_raw(token.expose_secret()) {
        Ok(identity) => {
            debug!(
                "Identity token subject: {}, repository: {:?}, ref: {:?}, environment: {:?}",
                identity.claims.sub,
                identity.claims.repository,
                identity.claims.git_ref,
                identity.claims.environment
            );
            if identity.is_expired() {
                warn!(
                    "Identity token expired at {:?}, the deployment may be rejected",
                    identity.expires_at()
                );
            }
        }
        Err(e) => debug!("Identity token not inspected: {}", e),
    }
}
