//! Per-run hour ledger
//!
//! An [`AllocationContext`] is created by every `allocate` call and dropped
//! when the call returns. Nothing in it outlives the run, so concurrent runs
//! for different scopes never see each other's consumption.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::error::{Result, StaffingError};
use crate::proficiency::profile_efficiency;
use crate::types::{SkillId, WorkerId, WorkerRecord};

/// Hours a worker may still be assigned within the run
#[derive(Debug, Clone)]
struct WorkerLedger {
    budget_hours: f64,
    used_hours: f64,
    efficiencies: BTreeMap<SkillId, f64>,
}

impl WorkerLedger {
    fn remaining_hours(&self) -> f64 {
        (self.budget_hours - self.used_hours).max(0.0)
    }
}

/// A worker that can take demand for a skill right now
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub worker_id: WorkerId,
    pub efficiency: f64,
    pub used_hours: f64,
}

/// Ledger of a single allocation run
#[derive(Debug, Clone)]
pub struct AllocationContext {
    run_id: Uuid,
    ledgers: BTreeMap<WorkerId, WorkerLedger>,
}

impl AllocationContext {
    /// Validate the roster and open a ledger for every worker
    pub fn new(workers: &[WorkerRecord]) -> Result<Self> {
        let mut ledgers = BTreeMap::new();
        for record in workers {
            let constraint = record.validate()?;
            let daily = constraint.max_daily_hours * constraint.work_rate;
            let weekly_left = (constraint.max_weekly_hours - record.hours_worked_this_week).max(0.0);
            let efficiencies = record
                .skills
                .iter()
                .map(|profile| (profile.skill_id.clone(), profile_efficiency(profile)))
                .collect();
            let ledger = WorkerLedger {
                budget_hours: daily.min(weekly_left),
                used_hours: 0.0,
                efficiencies,
            };
            if ledgers.insert(record.worker_id.clone(), ledger).is_some() {
                return Err(StaffingError::validation(format!(
                    "worker {} appears more than once on the roster",
                    record.worker_id
                )));
            }
        }
        Ok(Self {
            run_id: Uuid::new_v4(),
            ledgers,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn worker_count(&self) -> usize {
        self.ledgers.len()
    }

    /// Skills for which at least one worker has a profile
    pub fn staffed_skills(&self) -> BTreeSet<SkillId> {
        self.ledgers
            .values()
            .flat_map(|ledger| ledger.efficiencies.keys().cloned())
            .collect()
    }

    /// Run budget in clock hours
    pub fn budget_hours(&self, worker_id: &WorkerId) -> f64 {
        self.ledgers.get(worker_id).map_or(0.0, |l| l.budget_hours)
    }

    pub fn used_hours(&self, worker_id: &WorkerId) -> f64 {
        self.ledgers.get(worker_id).map_or(0.0, |l| l.used_hours)
    }

    pub fn remaining_hours(&self, worker_id: &WorkerId) -> f64 {
        self.ledgers.get(worker_id).map_or(0.0, WorkerLedger::remaining_hours)
    }

    /// Whole seconds of demand the worker can still cover at `efficiency`
    pub fn capacity_seconds(&self, worker_id: &WorkerId, efficiency: f64) -> u64 {
        let remaining = self.remaining_hours(worker_id);
        let seconds = (remaining * 3600.0 * efficiency).floor();
        if seconds <= 0.0 {
            0
        } else {
            seconds as u64
        }
    }

    /// Workers with a profile for `skill` and capacity left, in no particular order
    pub fn candidates(&self, skill: &SkillId) -> Vec<Candidate> {
        self.ledgers
            .iter()
            .filter_map(|(worker_id, ledger)| {
                let efficiency = *ledger.efficiencies.get(skill)?;
                if efficiency <= 0.0 || self.capacity_seconds(worker_id, efficiency) == 0 {
                    return None;
                }
                Some(Candidate {
                    worker_id: worker_id.clone(),
                    efficiency,
                    used_hours: ledger.used_hours,
                })
            })
            .collect()
    }

    /// Charge clock hours to a worker and return the amount actually charged
    ///
    /// The charge never exceeds the worker's remaining budget.
    pub fn charge(&mut self, worker_id: &WorkerId, hours: f64) -> f64 {
        match self.ledgers.get_mut(worker_id) {
            Some(ledger) => {
                let charged = hours.max(0.0).min(ledger.remaining_hours());
                ledger.used_hours = (ledger.used_hours + charged).min(ledger.budget_hours);
                charged
            }
            None => 0.0,
        }
    }
}
