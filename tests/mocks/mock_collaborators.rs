//! Mock collaborators for testing
//!
//! In-memory classifier, task lister and execution gateway that record every
//! call so tests can assert on what the orchestrator sent.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use remediation_core::client::ClientError;
use remediation_core::models::{PhaseName, Task, TaskSummary};
use remediation_core::orchestration::{
    ClassificationRequest, ExecutionGateway, GatewayRequest, RawStepResult, TaskClassifier,
    TaskLister,
};

/// Classifier returning a fixed task (or a fixed failure)
#[derive(Clone)]
pub struct MockClassifier {
    response: Arc<Mutex<Result<Task, u16>>>,
    requests: Arc<Mutex<Vec<ClassificationRequest>>>,
}

impl MockClassifier {
    pub fn returning(task: Task) -> Self {
        Self {
            response: Arc::new(Mutex::new(Ok(task))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Classifier that answers with an HTTP error status
    pub fn failing(status: u16) -> Self {
        Self {
            response: Arc::new(Mutex::new(Err(status))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_task(&self, task: Task) {
        *self.response.lock().unwrap() = Ok(task);
    }

    pub fn requests(&self) -> Vec<ClassificationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskClassifier for MockClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<Task, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        match &*self.response.lock().unwrap() {
            Ok(task) => Ok(task.clone()),
            Err(status) => Err(ClientError::api_error(*status, "Internal Server Error")),
        }
    }
}

/// Task catalogue
#[derive(Clone, Default)]
pub struct MockTaskLister {
    catalogue: Option<Vec<TaskSummary>>,
    calls: Arc<Mutex<usize>>,
}

impl MockTaskLister {
    pub fn with_tasks(tasks: Vec<TaskSummary>) -> Self {
        Self {
            catalogue: Some(tasks),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Lister whose every call fails
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TaskLister for MockTaskLister {
    async fn list_tasks(&self) -> Result<Vec<TaskSummary>, ClientError> {
        *self.calls.lock().unwrap() += 1;
        self.catalogue
            .clone()
            .ok_or_else(|| ClientError::Transport("connection refused".to_string()))
    }
}

/// Scripted outcome for one step
#[derive(Debug, Clone)]
pub enum GatewayScript {
    Respond(RawStepResult),
    TransportError(String),
}

#[derive(Debug, Default)]
struct GatewayState {
    scripts: HashMap<(PhaseName, usize), GatewayScript>,
    requests: Vec<GatewayRequest>,
}

/// Execution gateway; unscripted steps succeed with `{"message":"ok"}`
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<GatewayState>>,
    latency: Option<Duration>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call suspends for `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn script(&self, phase: PhaseName, index: usize, script: GatewayScript) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert((phase, index), script);
    }

    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// (phase, index) of every call, in call order
    pub fn executed(&self) -> Vec<(PhaseName, usize)> {
        self.requests()
            .iter()
            .map(|r| (r.phase, r.step_index.parse().unwrap()))
            .collect()
    }
}

#[async_trait]
impl ExecutionGateway for MockGateway {
    async fn execute(&self, request: &GatewayRequest) -> Result<RawStepResult, ClientError> {
        let script = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            let index: usize = request.step_index.parse().unwrap();
            state.scripts.get(&(request.phase, index)).cloned()
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match script {
            Some(GatewayScript::Respond(raw)) => Ok(raw),
            Some(GatewayScript::TransportError(message)) => Err(ClientError::Transport(message)),
            None => Ok(RawStepResult::success(200, Some(r#"{"message":"ok"}"#))),
        }
    }
}
