//! Deployment controller tying the client and the supervisor together

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::app::options::{DeploymentTarget, PollConfig};
use crate::deploy::client::DeploymentClient;
use crate::deploy::fsm::{DeploymentRecord, DeploymentState};
use crate::deploy::supervisor::{PollOutcome, PollSupervisor};
use crate::errors::DeployError;
use crate::http::pages::PagesApi;
use crate::report::Reporter;

/// One deployment attempt: create, supervise, cancel
pub struct Deployment<A: PagesApi> {
    client: DeploymentClient<A>,
    supervisor: PollSupervisor,
}

impl<A: PagesApi> Deployment<A> {
    pub fn new(
        api: Arc<A>,
        reporter: Arc<dyn Reporter>,
        target: DeploymentTarget,
        poll: PollConfig,
    ) -> Self {
        let supervisor = PollSupervisor::new(&poll);
        Self {
            client: DeploymentClient::new(api, reporter, target, poll),
            supervisor,
        }
    }

    /// Resolve the artifact and create the deployment
    pub async fn create(
        &mut self,
        identity_token: Option<&SecretString>,
    ) -> Result<&DeploymentRecord, DeployError> {
        self.client.create(identity_token).await
    }

    /// Supervise the deployment until it reaches a terminal state
    pub async fn check(&mut self) -> PollOutcome {
        self.supervisor.run(&mut self.client).await
    }

    /// Best-effort cancellation
    pub async fn cancel(&self) {
        self.client.cancel().await
    }

    /// Deadline enforced by [`Deployment::check`]
    pub fn timeout(&self) -> Duration {
        self.client.timeout()
    }

    pub fn state(&self) -> &DeploymentState {
        self.client.state()
    }

    pub fn client(&self) -> &DeploymentClient<A> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut DeploymentClient<A> {
        &mut self.client
    }
}
