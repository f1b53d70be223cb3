//! # System Constants
//!
//! Fixed values that define the operational contract of the remediation
//! orchestrator: the phase order, sentinel identifiers, and the defaults used
//! when auxiliary data cannot be interpreted.

use crate::models::PhaseName;

/// Fixed phase order used both for sequencing and for failure lookback.
pub const PHASE_ORDER: [PhaseName; 4] = [
    PhaseName::Prechecks,
    PhaseName::Procedure,
    PhaseName::Postchecks,
    PhaseName::Rollback,
];

/// Task id the classifier returns when it cannot resolve a single task.
pub const UNKNOWN_TASK_ID: &str = "UNKNOWN";

/// Role label used whenever the bearer token carries no usable role claim.
pub const DEFAULT_ROLE_LABEL: &str = "Production Support";

/// Message recorded when a gateway answer carries no body or error text.
pub const DEFAULT_COMPLETION_MESSAGE: &str = "Completed";

/// Pacing delay inserted before each auto-executed step.
pub const DEFAULT_PACING_DELAY_MS: u64 = 500;

/// Outbound HTTP header names
pub mod headers {
    pub const USER_ID: &str = "X-User-ID";
    pub const IDEMPOTENCY_KEY: &str = "X-Idempotency-Key";
}

/// Default collaborator endpoints, relative to the configured base URL
pub mod endpoints {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8093";
    pub const CLASSIFY_PATH: &str = "/api/v1/process";
    pub const TASK_LIST_PATH: &str = "/api/v1/tasks";
    pub const EXECUTE_PATH: &str = "/v1/steps/execute";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_is_fixed() {
        assert_eq!(
            PHASE_ORDER.map(|p| p.as_str()),
            ["prechecks", "procedure", "postchecks", "rollback"]
        );
    }

    #[test]
    fn test_phase_order_matches_phase_ordering() {
        let mut sorted = PHASE_ORDER;
        sorted.sort();
        assert_eq!(sorted, PHASE_ORDER);
    }
}
