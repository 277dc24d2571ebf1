//! # Multi-Skill Allocation Module
//!
//! Turns per-skill staffing requirements into worker assignments under each
//! worker's daily/weekly hour limits and work rate.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────────┐
//! │ RequiredStaffing[]   │   │ WorkerRecord[]           │
//! │ (staff × interval)   │   │ (skills, constraints)    │
//! └──────────┬───────────┘   └────────────┬─────────────┘
//!            │ demand seconds per skill   │ budget + efficiency per worker
//! ┌──────────▼────────────────────────────▼─────────────┐
//! │               MultiSkillAllocator                    │
//! │  - pick skill by demand / eligible workers           │
//! │  - rank workers by efficiency, used hours, id        │
//! │  - charge clock hours to the run's AllocationContext │
//! └──────────┬────────────────────────────┬─────────────┘
//!            │                            │
//! ┌──────────▼───────────┐   ┌────────────▼─────────────┐
//! │ AllocationAssignment │   │ UnmetDemand              │
//! └──────────────────────┘   └──────────────────────────┘
//! ```
//!
//! ## Units
//!
//! Demand for a skill is `required_count × interval length`, kept in whole
//! staff-seconds. An assignment covers `clock time × efficiency` of that
//! demand, so for every skill
//!
//! ```text
//! Σ covered_seconds + unmet_seconds = demand_seconds
//! ```
//!
//! holds with integer arithmetic. The worker side is charged in clock hours
//! and never exceeds `min(max_daily_hours × work_rate, weekly hours left)`.

pub mod allocator;
pub mod context;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AllocationAssignment, SkillId, UnmetDemand, WorkerId};

pub use allocator::MultiSkillAllocator;
pub use context::{AllocationContext, Candidate};

/// Demand was not fully covered
///
/// Always returned next to a valid (possibly incomplete) assignment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialAllocationWarning {
    pub skills: Vec<SkillId>,
    pub total_unmet_seconds: u64,
}

impl PartialAllocationWarning {
    pub fn from_unmet(unmet: &[UnmetDemand]) -> Option<Self> {
        if unmet.is_empty() {
            return None;
        }
        Some(Self {
            skills: unmet.iter().map(|u| u.skill_id.clone()).collect(),
            total_unmet_seconds: unmet.iter().map(|u| u.unmet_seconds).sum(),
        })
    }

    pub fn total_unmet_hours(&self) -> f64 {
        self.total_unmet_seconds as f64 / 3600.0
    }
}

/// Output of one allocation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub run_id: Uuid,
    /// In the order they were made
    pub assignments: Vec<AllocationAssignment>,
    pub unmet: Vec<UnmetDemand>,
    pub warning: Option<PartialAllocationWarning>,
}

impl AllocationResult {
    pub fn is_complete(&self) -> bool {
        self.unmet.is_empty()
    }

    /// Demand covered per skill, in staff-seconds
    pub fn covered_seconds_by_skill(&self) -> BTreeMap<SkillId, u64> {
        let mut covered = BTreeMap::new();
        for assignment in &self.assignments {
            *covered.entry(assignment.skill_id.clone()).or_insert(0u64) += assignment.covered_seconds;
        }
        covered
    }

    /// Clock hours assigned per worker across all skills
    pub fn hours_by_worker(&self) -> BTreeMap<WorkerId, f64> {
        let mut hours = BTreeMap::new();
        for assignment in &self.assignments {
            *hours.entry(assignment.worker_id.clone()).or_insert(0.0) += assignment.allocated_hours;
        }
        hours
    }

    pub fn unmet_seconds(&self, skill: &SkillId) -> u64 {
        self.unmet
            .iter()
            .filter(|u| &u.skill_id == skill)
            .map(|u| u.unmet_seconds)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_only_when_unmet() {
        assert!(PartialAllocationWarning::from_unmet(&[]).is_none());

        let warning = PartialAllocationWarning::from_unmet(&[
            UnmetDemand {
                skill_id: "a".into(),
                unmet_seconds: 1800,
            },
            UnmetDemand {
                skill_id: "b".into(),
                unmet_seconds: 5400,
            },
        ])
        .unwrap();
        assert_eq!(warning.skills.len(), 2);
        assert_eq!(warning.total_unmet_hours(), 2.0);
    }
}
