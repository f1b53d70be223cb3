//! # Step Orchestrator
//!
//! Drives execution of a classified task's steps. It owns the execution table
//! and the in-flight markers, resolves the role label for each call, normalizes
//! gateway answers and decides whether to advance.
//!
//! ## Sequencing rules
//!
//! - On submission only `prechecks` is scanned, for the first auto-executable
//!   step. That step runs after the pacing delay.
//! - After a step finishes COMPLETED with a successful result, the step at
//!   `index + 1` in the same phase is scheduled (again after the pacing delay)
//!   if it exists and is auto-executable. Nothing crosses a phase boundary.
//! - `has_prior_failure` is advisory. Execution is never blocked by it.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::events::{EventPublisher, OrchestrationEvent};
use super::execution_table::ExecutionTable;
use super::response_normalizer::normalize;
use super::types::{
    ClassificationRequest, ExecutionGateway, GatewayRequest, RequestContext, SubmissionOutcome,
    TaskClassifier, TaskLister,
};
use crate::auth::RoleResolver;
use crate::client::HttpRemediationClient;
use crate::config::RemediationConfig;
use crate::error::{RemediationError, RemediationResult};
use crate::logging::{log_step_operation, log_task_operation};
use crate::models::{ExecutionType, PhaseName, Step, StepExecution, StepKey, Task};
use crate::state_machine::{
    ApprovalEvent, StateMachineError, StepExecutionStatus, StepStateMachine,
};

/// Runtime settings the orchestrator needs from configuration
#[derive(Clone)]
pub struct OrchestratorSettings {
    pub pacing_delay: Duration,
    pub gateway_timeout: Option<Duration>,
    /// Used when a task carries no `requested_by`
    pub default_user_id: String,
    /// Bearer credential without the `Bearer ` prefix
    pub auth_token: String,
    pub fallback_role: String,
    pub environment: String,
    pub request_reason: String,
    pub priority: String,
}

impl std::fmt::Debug for OrchestratorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorSettings")
            .field("pacing_delay", &self.pacing_delay)
            .field("gateway_timeout", &self.gateway_timeout)
            .field("default_user_id", &self.default_user_id)
            .field("auth_token_configured", &!self.auth_token.is_empty())
            .field("fallback_role", &self.fallback_role)
            .field("environment", &self.environment)
            .finish()
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &RemediationConfig) -> Self {
        Self {
            pacing_delay: config.execution.pacing_delay(),
            gateway_timeout: config.execution.gateway_timeout(),
            default_user_id: config.auth.user_id.clone(),
            auth_token: config.auth.raw_token().to_string(),
            fallback_role: config.auth.fallback_role.clone(),
            environment: config.execution.environment.clone(),
            request_reason: config.execution.request_reason.clone(),
            priority: config.execution.priority.clone(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&RemediationConfig::default())
    }
}

struct OrchestratorInner {
    settings: OrchestratorSettings,
    classifier: Arc<dyn TaskClassifier>,
    lister: Arc<dyn TaskLister>,
    gateway: Arc<dyn ExecutionGateway>,
    role_resolver: RoleResolver,
    table: ExecutionTable,
    current_task: RwLock<Option<Arc<Task>>>,
    events: EventPublisher,
    scheduled: Mutex<Vec<JoinHandle<()>>>,
}

/// Cheaply cloneable handle; clones share all state.
#[derive(Clone)]
pub struct StepOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl std::fmt::Debug for StepOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepOrchestrator")
            .field("settings", &self.inner.settings)
            .field("records", &self.inner.table.len())
            .field("in_flight", &self.inner.table.in_flight_count())
            .finish()
    }
}

/// Clears the in-flight marker when the attempt ends, however it ends.
struct InFlightGuard<'a> {
    table: &'a ExecutionTable,
    key: &'a StepKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.table.finish(self.key);
    }
}

impl StepOrchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        classifier: Arc<dyn TaskClassifier>,
        lister: Arc<dyn TaskLister>,
        gateway: Arc<dyn ExecutionGateway>,
    ) -> Self {
        let role_resolver = RoleResolver::new(settings.fallback_role.clone());
        Self {
            inner: Arc::new(OrchestratorInner {
                settings,
                classifier,
                lister,
                gateway,
                role_resolver,
                table: ExecutionTable::new(),
                current_task: RwLock::new(None),
                events: EventPublisher::default(),
                scheduled: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Orchestrator wired to the HTTP collaborators described by `config`
    pub fn from_config(config: &RemediationConfig) -> RemediationResult<Self> {
        let client = Arc::new(HttpRemediationClient::new(config)?);
        Ok(Self::new(
            OrchestratorSettings::from_config(config),
            client.clone(),
            client.clone(),
            client,
        ))
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.inner.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestrationEvent> {
        self.inner.events.subscribe()
    }

    /// Most recently resolved task
    pub fn current_task(&self) -> Option<Arc<Task>> {
        self.inner.current_task.read().clone()
    }

    /// Classify `query` and, if a concrete task comes back, start auto-execution.
    #[instrument(skip(self, query))]
    pub async fn submit_task(
        &self,
        query: &str,
        user_id: &str,
        task_id_override: Option<&str>,
    ) -> RemediationResult<SubmissionOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RemediationError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let settings = &self.inner.settings;
        let request = ClassificationRequest {
            user_id: user_id.to_string(),
            query: query.to_string(),
            context: RequestContext {
                reason: settings.request_reason.clone(),
                priority: settings.priority.clone(),
                requested_by: user_id.to_string(),
                timestamp: Utc::now(),
            },
            environment: settings.environment.clone(),
            task_id: task_id_override
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            idempotency_key: Uuid::new_v4().to_string(),
        };

        let mut task = self
            .inner
            .classifier
            .classify(&request)
            .await
            .map_err(|e| RemediationError::Classification(e.to_string()))?;

        if !task.is_resolved() {
            let candidates = match self.inner.lister.list_tasks().await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(error = %e, "Could not load task catalogue for disambiguation");
                    Vec::new()
                }
            };

            log_task_operation(
                "submit",
                None,
                None,
                "disambiguation_required",
                Some(&format!("{} candidates", candidates.len())),
            );
            self.inner
                .events
                .publish(OrchestrationEvent::DisambiguationRequired {
                    query: query.to_string(),
                    candidate_count: candidates.len(),
                });

            return Ok(SubmissionOutcome::DisambiguationRequired {
                query: query.to_string(),
                candidates,
            });
        }

        task.requested_by = Some(user_id.to_string());
        for warning in &task.warnings {
            warn!(task_id = %task.task_id, warning = %warning, "Classifier warning");
        }

        let task = Arc::new(task);
        *self.inner.current_task.write() = Some(Arc::clone(&task));

        log_task_operation(
            "submit",
            Some(&task.task_id),
            Some(&task.task_name),
            "resolved",
            Some(&format!("{} steps", task.steps.total_steps())),
        );
        self.inner.events.publish(OrchestrationEvent::TaskResolved {
            task_id: task.task_id.clone(),
            task_name: task.task_name.clone(),
            resolved_at: Utc::now(),
        });

        self.begin_auto_execution(&task)?;
        Ok(SubmissionOutcome::Ready(task))
    }

    /// Schedule the first auto-executable step of `prechecks`, if any.
    ///
    /// Scheduling spawns onto the current Tokio runtime; without one this
    /// returns `RuntimeUnavailable` and nothing is scheduled.
    pub fn begin_auto_execution(&self, task: &Arc<Task>) -> RemediationResult<Option<StepKey>> {
        let index = task
            .phase_steps(PhaseName::Prechecks)
            .iter()
            .position(|step| step.auto_executable);

        match index {
            Some(index) => {
                self.spawn_chain(Arc::clone(task), PhaseName::Prechecks, index)?;
                Ok(Some(task.step_key(PhaseName::Prechecks, index)))
            }
            None => {
                debug!(task_id = %task.task_id, "No auto-executable precheck; waiting for manual execution");
                Ok(None)
            }
        }
    }

    /// Run one step now, then schedule the auto-chain from it.
    #[instrument(skip(self, task), fields(task_id = %task.task_id))]
    pub async fn execute_step(
        &self,
        task: &Arc<Task>,
        phase: PhaseName,
        index: usize,
    ) -> RemediationResult<StepExecution> {
        let record = self.execute_step_once(task, phase, index).await?;
        if let Some(next) = self.next_auto_step(task, phase, index, &record) {
            self.spawn_chain(Arc::clone(task), phase, next)?;
        }
        Ok(record)
    }

    /// Record an approval-gate decision for a step that is not in flight.
    pub fn apply_approval(
        &self,
        task: &Task,
        phase: PhaseName,
        index: usize,
        event: ApprovalEvent,
    ) -> RemediationResult<StepExecution> {
        let step = find_step(task, phase, index)?;
        let key = task.step_key(phase, index);

        if self.inner.table.is_executing(&key) {
            return Err(StateMachineError::StepInFlight {
                key: key.to_string(),
                event: event.event_type().to_string(),
            }
            .into());
        }

        let target =
            StepStateMachine::determine_target_state(self.inner.table.status(&key), event)?;

        let mut record = StepExecution::for_step(task, &key, step, target);
        record.requires_approval = !step.auto_executable
            || matches!(
                target,
                StepExecutionStatus::ApprovalRequired | StepExecutionStatus::Approved
            );
        if target.is_terminal() {
            record.completed_at = Some(Utc::now());
        }

        self.inner.table.record(key.clone(), record.clone());
        log_step_operation(
            event.event_type(),
            &record.step_id,
            Some(&record.step_name),
            target.as_str(),
            None,
        );
        Ok(record)
    }

    /// True if any step ordered before (`phase`, `index`) is FAILED.
    pub fn has_prior_failure(&self, task: &Task, phase: PhaseName, index: usize) -> bool {
        self.inner
            .table
            .has_prior_failure(&task.task_id, phase, index)
    }

    pub fn lookup(&self, key: &StepKey) -> Option<StepExecution> {
        self.inner.table.lookup(key)
    }

    pub fn is_executing(&self, key: &StepKey) -> bool {
        self.inner.table.is_executing(key)
    }

    /// Every record kept for `task_id`, in phase then index order
    pub fn records_for_task(&self, task_id: &str) -> Vec<StepExecution> {
        self.inner.table.records_for_task(task_id)
    }

    /// Scheduled executions that have not finished yet
    pub fn pending_scheduled(&self) -> usize {
        self.inner
            .scheduled
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Wait until every scheduled execution, including chains started while
    /// waiting, has finished.
    pub async fn wait_for_scheduled(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.scheduled.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Scheduled step execution ended abnormally");
                }
            }
        }
    }

    fn spawn_chain(
        &self,
        task: Arc<Task>,
        phase: PhaseName,
        index: usize,
    ) -> RemediationResult<()> {
        let key = task.step_key(phase, index);
        let runtime = Handle::try_current().map_err(|_| RemediationError::RuntimeUnavailable {
            key: key.to_string(),
        })?;

        debug!(step_id = %key, delay_ms = self.pacing_delay_ms(), "Scheduling step");
        self.inner.events.publish(OrchestrationEvent::StepScheduled {
            key,
            delay_ms: self.pacing_delay_ms(),
        });

        let handle = runtime.spawn(self.clone().run_chain(task, phase, index));

        let mut scheduled = self.inner.scheduled.lock();
        scheduled.retain(|handle| !handle.is_finished());
        scheduled.push(handle);
        Ok(())
    }

    async fn run_chain(self, task: Arc<Task>, phase: PhaseName, mut index: usize) {
        loop {
            tokio::time::sleep(self.inner.settings.pacing_delay).await;

            let record = match self.execute_step_once(&task, phase, index).await {
                Ok(record) => record,
                Err(e) => {
                    self.halt_chain(&task, phase, index, e.to_string());
                    return;
                }
            };

            match self.next_auto_step(&task, phase, index, &record) {
                Some(next) => {
                    let key = task.step_key(phase, next);
                    debug!(step_id = %key, delay_ms = self.pacing_delay_ms(), "Scheduling step");
                    self.inner.events.publish(OrchestrationEvent::StepScheduled {
                        key,
                        delay_ms: self.pacing_delay_ms(),
                    });
                    index = next;
                }
                None => return,
            }
        }
    }

    /// Index of the step to auto-run after `record`, or `None` if the chain stops here.
    fn next_auto_step(
        &self,
        task: &Task,
        phase: PhaseName,
        index: usize,
        record: &StepExecution,
    ) -> Option<usize> {
        if !record.succeeded() {
            self.halt_chain(task, phase, index, format!("step finished {}", record.status));
            return None;
        }

        let Some(next) = task.steps.next_index(phase, index) else {
            self.halt_chain(task, phase, index, format!("end of {phase}"));
            return None;
        };

        match task.step(phase, next) {
            Some(step) if step.auto_executable => Some(next),
            _ => {
                self.halt_chain(
                    task,
                    phase,
                    index,
                    format!("step {next} requires manual execution"),
                );
                None
            }
        }
    }

    fn halt_chain(&self, task: &Task, phase: PhaseName, index: usize, reason: String) {
        debug!(task_id = %task.task_id, phase = %phase, index, reason = %reason, "Auto-chain stopped");
        self.inner.events.publish(OrchestrationEvent::ChainHalted {
            task_id: task.task_id.clone(),
            phase,
            index,
            reason,
        });
    }

    async fn execute_step_once(
        &self,
        task: &Task,
        phase: PhaseName,
        index: usize,
    ) -> RemediationResult<StepExecution> {
        let step = find_step(task, phase, index)?;
        let key = task.step_key(phase, index);
        let table = &self.inner.table;

        if !table.try_begin(&key) {
            return Err(RemediationError::StepAlreadyExecuting {
                key: key.to_string(),
            });
        }
        let _in_flight = InFlightGuard { table, key: &key };

        let skip_approval = match table.status(&key) {
            Some(StepExecutionStatus::Cancelled) => {
                return Err(RemediationError::StepCancelled {
                    key: key.to_string(),
                })
            }
            Some(StepExecutionStatus::Approved) => true,
            _ => false,
        };

        let started_at = Utc::now();
        self.inner.events.publish(OrchestrationEvent::StepStarted {
            key: key.clone(),
            started_at,
        });

        let request = self.build_gateway_request(task, phase, index, step, skip_approval);
        let call = self.inner.gateway.execute(&request);
        let outcome = match self.inner.settings.gateway_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!(
                    "Error: step execution timed out after {}ms",
                    limit.as_millis()
                )),
            },
            None => call.await.map_err(|e| e.to_string()),
        };

        let mut record =
            StepExecution::for_step(task, &key, step, StepExecutionStatus::Pending);
        record.started_at = Some(started_at);
        record.completed_at = Some(Utc::now());

        match outcome {
            Ok(raw) => {
                let normalized = normalize(&raw);
                record.status = normalized.status;
                record.result = normalized.result;
                record.error_message = normalized.error_message;
            }
            Err(message) => {
                warn!(step_id = %key, error = %message, "Execution gateway call failed");
                record.status = StepExecutionStatus::Failed;
                record.execution_type = ExecutionType::Validation;
                record.requires_approval = false;
                record.error_message = Some(message);
            }
        }

        table.record(key.clone(), record.clone());

        if record.status == StepExecutionStatus::Completed {
            info!(step_id = %key, "Step completed");
        }
        log_step_operation(
            "execute",
            &record.step_id,
            Some(&record.step_name),
            record.status.as_str(),
            record.error_message.as_deref(),
        );
        self.inner.events.publish(OrchestrationEvent::StepFinished {
            key: key.clone(),
            status: record.status,
            completed_at: record.completed_at.unwrap_or(started_at),
        });

        Ok(record)
    }

    fn build_gateway_request(
        &self,
        task: &Task,
        phase: PhaseName,
        index: usize,
        step: &Step,
        skip_approval: bool,
    ) -> GatewayRequest {
        let settings = &self.inner.settings;
        let role_name = self.inner.role_resolver.resolve_role(&settings.auth_token);

        GatewayRequest {
            request_id: task.task_id.clone(),
            step_index: index.to_string(),
            step_number: step.step_number,
            step_name: step.description.clone(),
            phase,
            task_id: task.task_id.clone(),
            extracted_entities: task.extracted_entities.clone(),
            user_id: task
                .requested_by
                .clone()
                .unwrap_or_else(|| settings.default_user_id.clone()),
            auth_token: settings.auth_token.clone(),
            role_name: Some(role_name),
            skip_approval,
            api_endpoint: step.api_endpoint().map(str::to_string),
            http_method: step.http_method().map(str::to_string),
            api_parameters: step.api_parameters(),
        }
    }

    fn pacing_delay_ms(&self) -> u64 {
        u64::try_from(self.inner.settings.pacing_delay.as_millis()).unwrap_or(u64::MAX)
    }
}

fn find_step(task: &Task, phase: PhaseName, index: usize) -> RemediationResult<&Step> {
    task.step(phase, index)
        .ok_or_else(|| RemediationError::StepNotFound {
            task_id: task.task_id.clone(),
            phase: phase.to_string(),
            index,
        })
}
