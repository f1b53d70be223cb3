//! # Orchestration
//!
//! The step execution core: response normalization, the execution table,
//! collaborator contracts, lifecycle events and the `StepOrchestrator` that
//! ties them together.

pub mod events;
pub mod execution_table;
pub mod response_normalizer;
pub mod step_orchestrator;
pub mod types;

pub use events::{EventPublisher, OrchestrationEvent};
pub use execution_table::ExecutionTable;
pub use response_normalizer::{extract_message, normalize, NormalizedOutcome};
pub use step_orchestrator::{OrchestratorSettings, StepOrchestrator};
pub use types::{
    ClassificationRequest, ExecutionGateway, GatewayRequest, RawStepResult, RequestContext,
    SubmissionOutcome, TaskClassifier, TaskLister,
};
