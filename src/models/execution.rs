use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::phase::PhaseName;
use super::step::Step;
use super::task::Task;
use crate::state_machine::StepExecutionStatus;

/// Identity of one execution slot: (task, phase, step index).
///
/// Stable even when two steps carry identical content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepKey {
    pub task_id: String,
    pub phase: PhaseName,
    pub index: usize,
}

impl StepKey {
    pub fn new(task_id: impl Into<String>, phase: PhaseName, index: usize) -> Self {
        Self {
            task_id: task_id.into(),
            phase,
            index,
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-step-{}", self.task_id, self.phase, self.index)
    }
}

/// Classification tag carried on every execution record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    Validation,
    PermissionCheck,
    ApiExecution,
    Verification,
}

impl ExecutionType {
    /// Map a classifier `stepType` tag onto an execution type
    pub fn from_step_type(step_type: &str) -> Self {
        let tag = step_type.trim().to_ascii_lowercase();
        match tag.as_str() {
            "validation" | "precheck" | "prechecks" => Self::Validation,
            "verification" | "postcheck" | "postchecks" => Self::Verification,
            t if t.starts_with("permission") => Self::PermissionCheck,
            _ => Self::ApiExecution,
        }
    }
}

/// Outcome payload of a successful step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResultPayload {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// Execution record for one (task, phase, index) attempt.
///
/// Written once per attempt after the gateway responds; a later attempt on
/// the same key replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecution {
    pub step_id: String,
    pub request_id: String,
    pub step_name: String,
    pub status: StepExecutionStatus,
    #[serde(rename = "type")]
    pub execution_type: ExecutionType,
    pub requires_approval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResultPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StepExecution {
    /// Bare record for a step, carrying identity and descriptor fields only
    pub fn for_step(task: &Task, key: &StepKey, step: &Step, status: StepExecutionStatus) -> Self {
        Self {
            step_id: key.to_string(),
            request_id: task.task_id.clone(),
            step_name: step.description.clone(),
            status,
            execution_type: step.execution_type(),
            requires_approval: !step.auto_executable,
            started_at: None,
            completed_at: None,
            result: None,
            error_message: None,
        }
    }

    /// True when the step finished and the gateway reported success
    pub fn succeeded(&self) -> bool {
        self.status == StepExecutionStatus::Completed
            && self.result.as_ref().is_some_and(|r| r.success)
    }
}
