#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Remediation Core
//!
//! Step execution orchestrator for phased operational remediation tasks.
//!
//! ## Overview
//!
//! An external classifier turns a free-text query into a task whose steps are
//! grouped into four fixed phases: `prechecks`, `procedure`, `postchecks` and
//! `rollback`. This crate drives those steps through an external execution
//! gateway. It decides which step runs next, stops a chain on failure, keeps
//! one execution record per (task, phase, index) slot and attaches a role
//! label derived from the bearer token to every call.
//!
//! ## Module Organization
//!
//! - [`models`] - Steps, phase groups, tasks and execution records
//! - [`state_machine`] - Execution statuses and approval-gate transitions
//! - [`auth`] - Role label resolution from bearer tokens
//! - [`orchestration`] - Response normalization and the step orchestrator
//! - [`client`] - reqwest-backed collaborators
//! - [`config`] - File and environment configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//! - [`utils`] - Serde helpers for collaborator payloads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use remediation_core::config::RemediationConfig;
//! use remediation_core::orchestration::{StepOrchestrator, SubmissionOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RemediationConfig::load()?;
//! let orchestrator = StepOrchestrator::from_config(&config)?;
//!
//! match orchestrator
//!     .submit_task("restart the order service", &config.auth.user_id, None)
//!     .await?
//! {
//!     SubmissionOutcome::Ready(task) => {
//!         orchestrator.wait_for_scheduled().await;
//!         for record in orchestrator.records_for_task(&task.task_id) {
//!             println!("{} {}", record.step_id, record.status);
//!         }
//!     }
//!     SubmissionOutcome::DisambiguationRequired { candidates, .. } => {
//!         println!("{} candidate tasks", candidates.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod utils;

pub use auth::RoleResolver;
pub use client::{ClientError, HttpRemediationClient};
pub use config::RemediationConfig;
pub use error::{RemediationError, RemediationResult};
pub use models::{
    ExecutionType, PhaseGroups, PhaseName, Step, StepExecution, StepExecutionStatus, StepKey,
    Task, TaskSummary,
};
pub use orchestration::{
    ExecutionGateway, OrchestrationEvent, StepOrchestrator, SubmissionOutcome, TaskClassifier,
    TaskLister,
};
pub use state_machine::ApprovalEvent;
