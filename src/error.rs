//! Error types for the remediation orchestrator.
//!
//! Only failures the caller can act on surface here. Malformed auxiliary data
//! (unreadable token payloads, unparsable response bodies) degrades to
//! documented defaults instead, and business failures reported by the
//! execution gateway are recorded on the step, not raised.

use crate::client::ClientError;
use crate::state_machine::StateMachineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The classifier could not be reached or answered with an error status.
    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Step {index} not found in phase {phase} of task {task_id}")]
    StepNotFound {
        task_id: String,
        phase: String,
        index: usize,
    },

    #[error("Step {key} is already executing")]
    StepAlreadyExecuting { key: String },

    #[error("Step {key} was cancelled")]
    StepCancelled { key: String },

    #[error("No Tokio runtime available to schedule step {key}")]
    RuntimeUnavailable { key: String },

    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    /// The HTTP collaborators could not be set up.
    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type RemediationResult<T> = Result<T, RemediationError>;
