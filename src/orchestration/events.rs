use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::{PhaseName, StepKey};
use crate::state_machine::StepExecutionStatus;

/// Lifecycle notifications emitted by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    TaskResolved {
        task_id: String,
        task_name: String,
        resolved_at: DateTime<Utc>,
    },
    DisambiguationRequired {
        query: String,
        candidate_count: usize,
    },
    StepScheduled {
        key: StepKey,
        delay_ms: u64,
    },
    StepStarted {
        key: StepKey,
        started_at: DateTime<Utc>,
    },
    StepFinished {
        key: StepKey,
        status: StepExecutionStatus,
        completed_at: DateTime<Utc>,
    },
    /// `index` is the last step the chain ran or attempted
    ChainHalted {
        task_id: String,
        phase: PhaseName,
        index: usize,
        reason: String,
    },
}

impl OrchestrationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TaskResolved { .. } => "task_resolved",
            Self::DisambiguationRequired { .. } => "disambiguation_required",
            Self::StepScheduled { .. } => "step_scheduled",
            Self::StepStarted { .. } => "step_started",
            Self::StepFinished { .. } => "step_finished",
            Self::ChainHalted { .. } => "chain_halted",
        }
    }
}

/// Broadcast publisher for orchestration events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<OrchestrationEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to current subscribers. Having none is fine.
    pub fn publish(&self, event: OrchestrationEvent) {
        let event_type = event.event_type();
        if self.sender.send(event).is_err() {
            debug!(event_type, "No subscribers for orchestration event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestrationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let publisher = EventPublisher::default();
        assert_eq!(publisher.subscriber_count(), 0);
        publisher.publish(OrchestrationEvent::DisambiguationRequired {
            query: "q".into(),
            candidate_count: 0,
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();

        let key = StepKey::new("T1", PhaseName::Prechecks, 0);
        publisher.publish(OrchestrationEvent::StepScheduled {
            key: key.clone(),
            delay_ms: 500,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "step_scheduled");
        assert_eq!(event, OrchestrationEvent::StepScheduled { key, delay_ms: 500 });
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = OrchestrationEvent::ChainHalted {
            task_id: "T1".into(),
            phase: PhaseName::Prechecks,
            index: 1,
            reason: "next step requires approval".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "chain_halted");
        assert_eq!(json["phase"], "prechecks");
    }
}
