//! Supervises a created deployment until it settles
//!
//! Probes the status at a fixed interval. A probe returning anything other
//! than [`IN_PROGRESS_STATUS`] ends supervision with that status. Failed
//! probes are tolerated up to the configured count, and the deadline is
//! measured from the first supervision pass.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::options::PollConfig;
use crate::deploy::client::DeploymentClient;
use crate::deploy::fsm::DeploymentEvent;
use crate::http::pages::PagesApi;

/// Status reported while the service is still deploying
pub const IN_PROGRESS_STATUS: &str = "deployment_in_progress";

pub const NOT_FOUND_MESSAGE: &str = "Deployment not found.";
pub const UNKNOWN_STATUS_MESSAGE: &str = "Unable to get deployment status.";
pub const TIMEOUT_MESSAGE: &str = "Timeout reached, aborting!";
pub const TOO_MANY_ERRORS_MESSAGE: &str = "Too many errors, aborting!";

/// How supervision ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The service reported a final status
    Succeeded(String),

    /// No deployment was created
    NotFound,

    /// The deployment is not awaiting a status
    NotPending,

    /// Too many failed probes
    TooManyErrors(String),

    /// The deadline passed
    TimedOut,
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Succeeded(_))
    }
}

/// Poll supervisor
#[derive(Debug, Clone)]
pub struct PollSupervisor {
    reporting_interval: Duration,
    error_count: u32,
}

impl PollSupervisor {
    pub fn new(poll: &PollConfig) -> Self {
        Self {
            reporting_interval: poll.reporting_interval,
            error_count: poll.error_count,
        }
    }

    /// Drive the deployment to a terminal state.
    ///
    /// Every terminal failure is reported exactly once through the client's
    /// reporter.
    pub async fn run<A: PagesApi>(&self, client: &mut DeploymentClient<A>) -> PollOutcome {
        let reporter = client.reporter().clone();

        if client.record().is_none() {
            reporter.set_failed(NOT_FOUND_MESSAGE);
            return PollOutcome::NotFound;
        }

        let Some(record) = client.pending_mut() else {
            reporter.set_failed(UNKNOWN_STATUS_MESSAGE);
            return PollOutcome::NotPending;
        };
        let started_at = *record.started_at.get_or_insert_with(Instant::now);

        let timeout = client.timeout();
        let mut errors: u32 = 0;

        debug!(
            "Supervising deployment every {:?}, deadline {:?}, {} error(s) tolerated",
            self.reporting_interval, timeout, self.error_count
        );

        loop {
            match client.check().await {
                Ok(status) if status == IN_PROGRESS_STATUS => {
                    errors = 0;
                    if let Some(record) = client.pending_mut() {
                        record.last_status = Some(status.clone());
                    }
                    reporter.info(&format!("Current status: {}", status));
                }
                Ok(status) => {
                    if let Err(e) = client.transition(DeploymentEvent::Resolved(status.clone())) {
                        warn!("{}", e);
                    }
                    reporter.set_output("status", &status).await;
                    reporter.info("Reported success!");
                    return PollOutcome::Succeeded(status);
                }
                Err(e) => {
                    errors += 1;
                    reporter.warning(&format!(
                        "Getting Pages deployment status failed ({}/{}): {}",
                        errors, self.error_count, e
                    ));

                    if errors > self.error_count {
                        let reason = match e.status() {
                            Some(code) => format!("Failed with status code: {}", code),
                            None => format!("Failed with error: {}", e),
                        };
                        reporter.error(TOO_MANY_ERRORS_MESSAGE);
                        self.abort(client, &reason).await;
                        return PollOutcome::TooManyErrors(reason);
                    }
                }
            }

            if started_at.elapsed() > timeout {
                reporter.error(TIMEOUT_MESSAGE);
                self.abort(client, TIMEOUT_MESSAGE).await;
                return PollOutcome::TimedOut;
            }

            tokio::time::sleep(self.reporting_interval).await;
        }
    }

    async fn abort<A: PagesApi>(&self, client: &mut DeploymentClient<A>, reason: &str) {
        if let Err(e) = client.transition(DeploymentEvent::Failed(reason.to_string())) {
            warn!("{}", e);
        }
        client.reporter().set_failed(reason);
        client.cancel().await;
    }
}
