use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::execution::StepKey;
use super::phase::{PhaseGroups, PhaseName};
use super::step::Step;
use crate::constants::UNKNOWN_TASK_ID;
use crate::utils::serde::null_as_default;

/// A classified remediation task.
///
/// Created once per query and replaced wholesale on re-submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_name: String,
    /// Entities the classifier extracted from the query (case id, service, ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_entities: HashMap<String, Option<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: PhaseGroups,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub warnings: Vec<String>,
    /// User that submitted the query; set by the orchestrator, not the classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

impl Task {
    pub fn new(task_id: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            task_name: task_name.into(),
            extracted_entities: HashMap::new(),
            steps: PhaseGroups::default(),
            warnings: Vec::new(),
            requested_by: None,
        }
    }

    pub fn with_phase(mut self, phase: PhaseName, steps: Vec<Step>) -> Self {
        let slot = match phase {
            PhaseName::Prechecks => &mut self.steps.prechecks,
            PhaseName::Procedure => &mut self.steps.procedure,
            PhaseName::Postchecks => &mut self.steps.postchecks,
            PhaseName::Rollback => &mut self.steps.rollback,
        };
        *slot = Some(steps);
        self
    }

    pub fn with_entity(mut self, key: impl Into<String>, value: Option<&str>) -> Self {
        self.extracted_entities
            .insert(key.into(), value.map(str::to_string));
        self
    }

    /// False when the classifier could not settle on a concrete task
    pub fn is_resolved(&self) -> bool {
        let id = self.task_id.trim();
        !id.is_empty() && id != UNKNOWN_TASK_ID
    }

    pub fn phase_steps(&self, phase: PhaseName) -> &[Step] {
        self.steps.get(phase)
    }

    pub fn step(&self, phase: PhaseName, index: usize) -> Option<&Step> {
        self.steps.step(phase, index)
    }

    pub fn step_key(&self, phase: PhaseName, index: usize) -> StepKey {
        StepKey::new(&self.task_id, phase, index)
    }
}

/// Catalogue entry offered when a query needs disambiguation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub task_id: String,
    pub task_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}
