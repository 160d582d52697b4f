//! Finite State Machine for a single Pages deployment attempt

use std::fmt;

use tokio::time::Instant;

use crate::errors::DeployError;

/// Remote deployment as returned by the create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRecord {
    status_url: String,
    page_url: String,
    preview_url: Option<String>,

    /// Deadline origin, captured on the first supervision pass
    pub started_at: Option<Instant>,

    /// Most recent status reported by the service
    pub last_status: Option<String>,
}

impl DeploymentRecord {
    pub fn new(status_url: String, page_url: String, preview_url: Option<String>) -> Self {
        Self {
            status_url,
            page_url,
            preview_url,
            started_at: None,
            last_status: None,
        }
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    /// Endpoint that aborts the deployment
    pub fn cancel_url(&self) -> String {
        format!("{}/cancel", self.status_url.trim_end_matches('/'))
    }
}

/// Deployment state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeploymentState {
    /// Nothing was created
    #[default]
    Absent,

    /// Created and awaiting a final status
    Pending(DeploymentRecord),

    /// The service reported a final status
    Resolved {
        record: DeploymentRecord,
        status: String,
    },

    /// Supervision gave up
    Failed {
        record: DeploymentRecord,
        reason: String,
    },
}

impl DeploymentState {
    fn name(&self) -> &'static str {
        match self {
            DeploymentState::Absent => "absent",
            DeploymentState::Pending(_) => "pending",
            DeploymentState::Resolved { .. } => "resolved",
            DeploymentState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deployment event
#[derive(Debug, Clone)]
pub enum DeploymentEvent {
    /// The create call succeeded
    Created(DeploymentRecord),

    /// A final status was observed
    Resolved(String),

    /// Supervision ended without a final status
    Failed(String),
}

/// Deployment FSM
#[derive(Debug, Clone, Default)]
pub struct DeploymentFsm {
    state: DeploymentState,
}

impl DeploymentFsm {
    /// Create a new FSM with no deployment
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    /// The created deployment, whatever its state
    pub fn record(&self) -> Option<&DeploymentRecord> {
        match &self.state {
            DeploymentState::Absent => None,
            DeploymentState::Pending(record)
            | DeploymentState::Resolved { record, .. }
            | DeploymentState::Failed { record, .. } => Some(record),
        }
    }

    /// The pending deployment, for bookkeeping during supervision
    pub fn pending_mut(&mut self) -> Option<&mut DeploymentRecord> {
        match &mut self.state {
            DeploymentState::Pending(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DeploymentState::Pending(_))
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<(), DeployError> {
        let current = std::mem::take(&mut self.state);

        let next = match (current, event) {
            (DeploymentState::Absent, DeploymentEvent::Created(record)) => {
                DeploymentState::Pending(record)
            }
            (DeploymentState::Pending(mut record), DeploymentEvent::Resolved(status)) => {
                record.last_status = Some(status.clone());
                DeploymentState::Resolved { record, status }
            }
            (DeploymentState::Pending(record), DeploymentEvent::Failed(reason)) => {
                DeploymentState::Failed { record, reason }
            }

            // Invalid transitions
            (state, event) => {
                let message = format!("Invalid transition: {} -> {:?}", state, event);
                self.state = state;
                return Err(DeployError::InvalidState(message));
            }
        };

        self.state = next;
        Ok(())
    }
}
