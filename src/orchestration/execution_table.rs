use dashmap::{DashMap, DashSet};

use crate::models::{PhaseName, StepExecution, StepKey};
use crate::state_machine::StepExecutionStatus;

/// Orchestrator-owned store of execution records and in-flight markers.
///
/// Records are replaced whole on every write. A key is in flight from the
/// moment its gateway call starts until its record is written.
#[derive(Debug, Default)]
pub struct ExecutionTable {
    records: DashMap<StepKey, StepExecution>,
    in_flight: DashSet<StepKey>,
}

impl ExecutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &StepKey) -> Option<StepExecution> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    pub fn status(&self, key: &StepKey) -> Option<StepExecutionStatus> {
        self.records.get(key).map(|entry| entry.status)
    }

    /// Replace the record for `key`, returning the previous one
    pub fn record(&self, key: StepKey, execution: StepExecution) -> Option<StepExecution> {
        self.records.insert(key, execution)
    }

    /// Mark `key` in flight. Returns false if it already was.
    pub fn try_begin(&self, key: &StepKey) -> bool {
        self.in_flight.insert(key.clone())
    }

    pub fn finish(&self, key: &StepKey) {
        self.in_flight.remove(key);
    }

    pub fn is_executing(&self, key: &StepKey) -> bool {
        self.in_flight.contains(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// True if any step ordered before (`phase`, `index`) in `task_id` is FAILED.
    ///
    /// Earlier phases are checked in full, then the same phase up to `index`.
    pub fn has_prior_failure(&self, task_id: &str, phase: PhaseName, index: usize) -> bool {
        self.records.iter().any(|entry| {
            let key = entry.key();
            key.task_id == task_id
                && (key.phase < phase || (key.phase == phase && key.index < index))
                && entry.status.is_failure()
        })
    }

    /// Records of one task, in phase then index order
    pub fn records_for_task(&self, task_id: &str) -> Vec<StepExecution> {
        let mut records: Vec<(StepKey, StepExecution)> = self
            .records
            .iter()
            .filter(|entry| entry.key().task_id == task_id)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        records.sort_by(|(a, _), (b, _)| a.cmp(b));
        records.into_iter().map(|(_, record)| record).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionType, Step, Task};
    use proptest::prelude::*;

    fn record_with(task: &Task, key: &StepKey, status: StepExecutionStatus) -> StepExecution {
        let step = Step::new(key.index as u32, "step");
        StepExecution::for_step(task, key, &step, status)
    }

    fn status_strategy() -> impl Strategy<Value = StepExecutionStatus> {
        prop_oneof![
            Just(StepExecutionStatus::Completed),
            Just(StepExecutionStatus::Failed),
            Just(StepExecutionStatus::ApprovalRequired),
            Just(StepExecutionStatus::Cancelled),
        ]
    }

    fn phase_strategy() -> impl Strategy<Value = PhaseName> {
        prop_oneof![
            Just(PhaseName::Prechecks),
            Just(PhaseName::Procedure),
            Just(PhaseName::Postchecks),
            Just(PhaseName::Rollback),
        ]
    }

    #[test]
    fn test_record_overwrites_wholesale() {
        let table = ExecutionTable::new();
        let task = Task::new("T1", "demo");
        let key = task.step_key(PhaseName::Prechecks, 0);

        let mut first = record_with(&task, &key, StepExecutionStatus::Failed);
        first.error_message = Some("boom".into());
        table.record(key.clone(), first);

        let second = record_with(&task, &key, StepExecutionStatus::Completed);
        let previous = table.record(key.clone(), second);

        assert_eq!(previous.unwrap().status, StepExecutionStatus::Failed);
        let current = table.lookup(&key).unwrap();
        assert_eq!(current.status, StepExecutionStatus::Completed);
        assert!(current.error_message.is_none());
        assert_eq!(current.execution_type, ExecutionType::ApiExecution);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_in_flight_marker() {
        let table = ExecutionTable::new();
        let key = StepKey::new("T1", PhaseName::Procedure, 1);

        assert!(!table.is_executing(&key));
        assert!(table.try_begin(&key));
        assert!(!table.try_begin(&key));
        assert!(table.is_executing(&key));
        table.finish(&key);
        assert!(!table.is_executing(&key));
        assert_eq!(table.in_flight_count(), 0);
    }

    #[test]
    fn test_prior_failure_examples() {
        let table = ExecutionTable::new();
        let task = Task::new("T1", "demo");
        let failed = task.step_key(PhaseName::Procedure, 1);
        table.record(
            failed.clone(),
            record_with(&task, &failed, StepExecutionStatus::Failed),
        );

        assert!(!table.has_prior_failure("T1", PhaseName::Prechecks, 5));
        assert!(!table.has_prior_failure("T1", PhaseName::Procedure, 0));
        assert!(!table.has_prior_failure("T1", PhaseName::Procedure, 1));
        assert!(table.has_prior_failure("T1", PhaseName::Procedure, 2));
        assert!(table.has_prior_failure("T1", PhaseName::Postchecks, 0));
        assert!(table.has_prior_failure("T1", PhaseName::Rollback, 0));
        assert!(!table.has_prior_failure("T2", PhaseName::Rollback, 0));
    }

    #[test]
    fn test_records_for_task_are_ordered() {
        let table = ExecutionTable::new();
        let task = Task::new("T1", "demo");
        for (phase, index) in [
            (PhaseName::Postchecks, 0),
            (PhaseName::Prechecks, 1),
            (PhaseName::Prechecks, 0),
        ] {
            let key = task.step_key(phase, index);
            table.record(
                key.clone(),
                record_with(&task, &key, StepExecutionStatus::Completed),
            );
        }

        let ids: Vec<String> = table
            .records_for_task("T1")
            .into_iter()
            .map(|r| r.step_id)
            .collect();
        assert_eq!(
            ids,
            vec!["T1-prechecks-step-0", "T1-prechecks-step-1", "T1-postchecks-step-0"]
        );
    }

    proptest! {
        #[test]
        fn prop_prior_failure_iff_earlier_failed_record(
            entries in proptest::collection::vec((phase_strategy(), 0usize..6, status_strategy()), 0..12),
            query_phase in phase_strategy(),
            query_index in 0usize..6,
        ) {
            let table = ExecutionTable::new();
            let task = Task::new("T1", "demo");
            for (phase, index, status) in &entries {
                let key = task.step_key(*phase, *index);
                table.record(key.clone(), record_with(&task, &key, *status));
            }

            // Last write per key wins
            let mut latest = std::collections::HashMap::new();
            for (phase, index, status) in &entries {
                latest.insert((*phase, *index), *status);
            }
            let expected = latest.iter().any(|((phase, index), status)| {
                *status == StepExecutionStatus::Failed
                    && (*phase < query_phase || (*phase == query_phase && *index < query_index))
            });

            prop_assert_eq!(table.has_prior_failure("T1", query_phase, query_index), expected);
        }
    }
}
