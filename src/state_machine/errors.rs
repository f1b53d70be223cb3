use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid transition from {from:?} on event {event}")]
    InvalidTransition { from: Option<String>, event: String },

    #[error("Step {key} is executing and cannot accept {event}")]
    StepInFlight { key: String, event: String },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
