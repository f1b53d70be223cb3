use super::{
    errors::{StateMachineError, StateMachineResult},
    events::ApprovalEvent,
    states::StepExecutionStatus,
};

/// Transition table for approval-gate input on a single step slot.
///
/// Gateway-driven transitions (into COMPLETED / FAILED) never pass through
/// here; the orchestrator writes those directly once a call returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepStateMachine;

impl StepStateMachine {
    /// Determine the target status for `event` given the slot's current status.
    ///
    /// `None` means no record exists yet, which reads the same as PENDING.
    pub fn determine_target_state(
        current: Option<StepExecutionStatus>,
        event: ApprovalEvent,
    ) -> StateMachineResult<StepExecutionStatus> {
        use StepExecutionStatus as S;

        let target = match (current.unwrap_or_default(), event) {
            (S::Pending, ApprovalEvent::RequireApproval) => S::ApprovalRequired,

            (S::ApprovalRequired, ApprovalEvent::Approve) => S::Approved,

            (S::Pending | S::ApprovalRequired | S::Approved, ApprovalEvent::Cancel) => {
                S::Cancelled
            }

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: current.map(|_| from_state.to_string()),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StepExecutionStatus as S;

    #[test]
    fn test_require_then_approve() {
        let held = StepStateMachine::determine_target_state(None, ApprovalEvent::RequireApproval)
            .unwrap();
        assert_eq!(held, S::ApprovalRequired);

        let approved =
            StepStateMachine::determine_target_state(Some(held), ApprovalEvent::Approve).unwrap();
        assert_eq!(approved, S::Approved);
    }

    #[test]
    fn test_cancel_allowed_before_execution() {
        for current in [None, Some(S::Pending), Some(S::ApprovalRequired), Some(S::Approved)] {
            assert_eq!(
                StepStateMachine::determine_target_state(current, ApprovalEvent::Cancel).unwrap(),
                S::Cancelled
            );
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let err = StepStateMachine::determine_target_state(None, ApprovalEvent::Approve)
            .unwrap_err();
        assert_eq!(
            err,
            StateMachineError::InvalidTransition {
                from: None,
                event: "approve".to_string()
            }
        );

        for current in [S::Completed, S::Failed, S::Cancelled, S::Running] {
            assert!(
                StepStateMachine::determine_target_state(Some(current), ApprovalEvent::Cancel)
                    .is_err()
            );
        }

        let err = StepStateMachine::determine_target_state(
            Some(S::Completed),
            ApprovalEvent::RequireApproval,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StateMachineError::InvalidTransition { from: Some(ref s), .. } if s == "COMPLETED"
        ));
    }
}
