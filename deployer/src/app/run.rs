//! Runs one deployment attempt end to end

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info};

use crate::app::options::{DeployOptions, DeploymentTarget, PollConfig};
use crate::deploy::{Deployment, PollOutcome};
use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::http::pages::{PagesApi, PagesClient};
use crate::report::Reporter;

/// Deploy with the GitHub-backed Pages client
pub async fn run(
    options: DeployOptions,
    reporter: Arc<dyn Reporter>,
) -> Result<PollOutcome, DeployError> {
    let DeployOptions {
        target,
        poll,
        endpoints,
        credentials,
        output_file: _,
    } = options;

    let api = PagesClient::new(
        HttpClient::new()?,
        endpoints,
        target.repository.clone(),
        credentials.token,
        credentials.runtime_token,
    );

    run_deployment(
        Arc::new(api),
        target,
        poll,
        credentials.oidc_token.as_ref(),
        reporter,
    )
    .await
}

/// Create the deployment, publish its URLs and supervise it.
///
/// A failed creation is reported once and returned; supervision failures are
/// reported by the supervisor and surface as a non-success outcome.
pub async fn run_deployment<A: PagesApi>(
    api: Arc<A>,
    target: DeploymentTarget,
    poll: PollConfig,
    identity_token: Option<&SecretString>,
    reporter: Arc<dyn Reporter>,
) -> Result<PollOutcome, DeployError> {
    info!(
        "Deploying {} of {} (artifact '{}')",
        target.build_version, target.repository, poll.artifact_name
    );

    let mut deployment = Deployment::new(api, reporter.clone(), target, poll);

    match deployment.create(identity_token).await {
        Ok(record) => {
            reporter.set_output("page_url", record.page_url()).await;
            if let Some(preview_url) = record.preview_url() {
                reporter.set_output("preview_url", preview_url).await;
            }
        }
        Err(e) => {
            reporter.set_failed(&e.to_string());
            deployment.cancel().await;
            return Err(e);
        }
    }

    let outcome = deployment.check().await;
    debug!("Deployment finished in state '{}'", deployment.state());
    Ok(outcome)
}
