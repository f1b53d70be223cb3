//! # Step & Group Model
//!
//! Value types for classified remediation tasks: steps, the fixed phase
//! groups they belong to, and the per-attempt execution records the
//! orchestrator keeps for them.

pub mod execution;
pub mod phase;
pub mod step;
pub mod task;

pub use execution::{ExecutionType, StepExecution, StepKey, StepResultPayload};
pub use phase::{PhaseGroups, PhaseName};
pub use step::Step;
pub use task::{Task, TaskSummary};

pub use crate::state_machine::StepExecutionStatus;
