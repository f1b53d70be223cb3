// Per-step execution states and the approval-gate transition table.
//
// Gateway outcomes are recorded directly by the orchestrator; only human
// approval input is validated here.

pub mod errors;
pub mod events;
pub mod states;
pub mod step_state_machine;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::ApprovalEvent;
pub use states::StepExecutionStatus;
pub use step_state_machine::StepStateMachine;
