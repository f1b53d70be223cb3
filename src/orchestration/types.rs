//! # Orchestration Types
//!
//! Wire shapes exchanged with the external collaborators, the collaborator
//! traits themselves, and the outcome of a task submission.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ClientError;
use crate::models::{PhaseName, Task, TaskSummary};

/// Context block attached to every classification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub reason: String,
    pub priority: String,
    pub requested_by: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of a classification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub user_id: String,
    pub query: String,
    pub context: RequestContext,
    pub environment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Sent as a header, never in the body
    #[serde(skip)]
    pub idempotency_key: String,
}

/// Body of an execution gateway request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub request_id: String,
    pub step_index: String,
    pub step_number: u32,
    pub step_name: String,
    pub phase: PhaseName,
    pub task_id: String,
    pub extracted_entities: HashMap<String, Option<String>>,
    pub user_id: String,
    pub auth_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    pub skip_approval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_parameters: Option<Map<String, Value>>,
}

/// Raw gateway answer, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStepResult {
    pub success: bool,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl RawStepResult {
    pub fn success(status_code: u16, response_body: Option<&str>) -> Self {
        Self {
            success: true,
            status_code,
            response_body: response_body.map(str::to_string),
            error_message: None,
        }
    }

    pub fn failure(status_code: u16, error_message: Option<&str>) -> Self {
        Self {
            success: false,
            status_code,
            response_body: None,
            error_message: error_message.map(str::to_string),
        }
    }
}

/// Result of `submit_task`
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// A concrete task was resolved and auto-execution has begun
    Ready(Arc<Task>),
    /// The classifier could not settle on a task; nothing was executed
    DisambiguationRequired {
        query: String,
        candidates: Vec<TaskSummary>,
    },
}

impl SubmissionOutcome {
    pub fn task(&self) -> Option<&Arc<Task>> {
        match self {
            Self::Ready(task) => Some(task),
            Self::DisambiguationRequired { .. } => None,
        }
    }

    pub fn requires_disambiguation(&self) -> bool {
        matches!(self, Self::DisambiguationRequired { .. })
    }
}

/// Classifier service
#[async_trait]
pub trait TaskClassifier: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<Task, ClientError>;
}

/// Task catalogue used to populate a disambiguation choice
#[async_trait]
pub trait TaskLister: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<TaskSummary>, ClientError>;
}

/// Execution gateway that runs a single step
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    async fn execute(&self, request: &GatewayRequest) -> Result<RawStepResult, ClientError>;
}
