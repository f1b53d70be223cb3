use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one step execution slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepExecutionStatus {
    /// No attempt recorded yet
    #[default]
    Pending,
    /// Gateway call in flight
    Running,
    /// Gateway responded with success
    Completed,
    /// Gateway reported failure, or the call itself failed
    Failed,
    /// Held for a human decision
    ApprovalRequired,
    /// Human approved; the next execution skips the approval gate
    Approved,
    /// Human cancelled; no further execution
    Cancelled,
}

impl StepExecutionStatus {
    /// Check if this status ends an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if this status counts as an upstream failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::ApprovalRequired => "APPROVAL_REQUIRED",
            Self::Approved => "APPROVED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for StepExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "APPROVAL_REQUIRED" => Ok(Self::ApprovalRequired),
            "APPROVED" => Ok(Self::Approved),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid step execution status: {s}")),
        }
    }
}
