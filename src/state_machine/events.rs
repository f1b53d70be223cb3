use serde::{Deserialize, Serialize};

/// Human decisions the approval gate feeds into a step slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalEvent {
    /// Hold the step until someone approves it
    RequireApproval,
    /// Release a held step
    Approve,
    /// Withdraw the step from execution
    Cancel,
}

impl ApprovalEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RequireApproval => "require_approval",
            Self::Approve => "approve",
            Self::Cancel => "cancel",
        }
    }
}
