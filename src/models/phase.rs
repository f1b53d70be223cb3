use serde::{Deserialize, Serialize};
use std::fmt;

use super::step::Step;
use crate::constants::PHASE_ORDER;

/// One of the four fixed remediation stages.
///
/// Variant order is the execution order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseName {
    Prechecks,
    Procedure,
    Postchecks,
    Rollback,
}

impl PhaseName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prechecks => "prechecks",
            Self::Procedure => "procedure",
            Self::Postchecks => "postchecks",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhaseName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prechecks" => Ok(Self::Prechecks),
            "procedure" => Ok(Self::Procedure),
            "postchecks" => Ok(Self::Postchecks),
            "rollback" => Ok(Self::Rollback),
            _ => Err(format!("Invalid phase name: {s}")),
        }
    }
}

/// Steps of a task partitioned by phase. Any group may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseGroups {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prechecks: Option<Vec<Step>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<Vec<Step>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postchecks: Option<Vec<Step>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback: Option<Vec<Step>>,
}

impl PhaseGroups {
    /// Ordered steps of a phase; empty when the group is absent
    pub fn get(&self, phase: PhaseName) -> &[Step] {
        let group = match phase {
            PhaseName::Prechecks => &self.prechecks,
            PhaseName::Procedure => &self.procedure,
            PhaseName::Postchecks => &self.postchecks,
            PhaseName::Rollback => &self.rollback,
        };
        group.as_deref().unwrap_or_default()
    }

    pub fn step(&self, phase: PhaseName, index: usize) -> Option<&Step> {
        self.get(phase).get(index)
    }

    /// Index of the step following `index` in the same phase, if there is one
    pub fn next_index(&self, phase: PhaseName, index: usize) -> Option<usize> {
        let next = index.checked_add(1)?;
        (next < self.get(phase).len()).then_some(next)
    }

    /// Phases in fixed order paired with their (possibly empty) steps
    pub fn iter(&self) -> impl Iterator<Item = (PhaseName, &[Step])> + '_ {
        PHASE_ORDER.into_iter().map(move |phase| (phase, self.get(phase)))
    }

    pub fn total_steps(&self) -> usize {
        self.iter().map(|(_, steps)| steps.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_steps() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> PhaseGroups {
        PhaseGroups {
            prechecks: Some(vec![Step::new(0, "check"), Step::new(1, "check again")]),
            procedure: None,
            postchecks: Some(vec![]),
            rollback: Some(vec![Step::new(0, "undo")]),
        }
    }

    #[test]
    fn test_absent_group_reads_as_empty() {
        let groups = groups();
        assert!(groups.get(PhaseName::Procedure).is_empty());
        assert!(groups.get(PhaseName::Postchecks).is_empty());
        assert_eq!(groups.get(PhaseName::Prechecks).len(), 2);
        assert_eq!(groups.total_steps(), 3);
    }

    #[test]
    fn test_next_index_stays_within_phase() {
        let groups = groups();
        assert_eq!(groups.next_index(PhaseName::Prechecks, 0), Some(1));
        assert_eq!(groups.next_index(PhaseName::Prechecks, 1), None);
        assert_eq!(groups.next_index(PhaseName::Procedure, 0), None);
        assert_eq!(groups.next_index(PhaseName::Rollback, usize::MAX), None);
    }

    #[test]
    fn test_phase_name_serde() {
        let json = serde_json::to_string(&PhaseName::Postchecks).unwrap();
        assert_eq!(json, "\"postchecks\"");
        assert_eq!("rollback".parse::<PhaseName>().unwrap(), PhaseName::Rollback);
        assert!("cleanup".parse::<PhaseName>().is_err());
    }

    #[test]
    fn test_groups_deserialize_with_missing_phases() {
        let groups: PhaseGroups =
            serde_json::from_str(r#"{"procedure":[{"stepNumber":0,"description":"go"}]}"#)
                .unwrap();
        assert!(groups.prechecks.is_none());
        assert_eq!(groups.get(PhaseName::Procedure)[0].description, "go");
    }
}
