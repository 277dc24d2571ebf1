//! Priority-greedy multi-skill allocator

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use ordered_float::OrderedFloat;
use tracing::{debug, info, warn};

use super::context::{AllocationContext, Candidate};
use super::{AllocationResult, PartialAllocationWarning};
use crate::error::Result;
use crate::types::{AllocationAssignment, RequiredStaffing, SkillId, UnmetDemand, WorkerId, WorkerRecord};

/// Assigns roster hours to skill demand
///
/// Each round picks the outstanding skill with the highest
/// `demand_hours / max(1, eligible_workers)` (ties by ascending skill id) and
/// fills it from its eligible workers in order of descending efficiency,
/// ascending hours already used in the run, then ascending worker id. Every
/// skill is processed once; whatever its workers cannot cover is reported as
/// unmet demand.
#[derive(Debug, Clone, Default)]
pub struct MultiSkillAllocator;

impl MultiSkillAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Run one allocation
    ///
    /// Malformed input aborts the run with `InputValidation`; demand that the
    /// roster cannot cover is part of the returned result.
    pub fn allocate(
        &self,
        required: &[RequiredStaffing],
        workers: &[WorkerRecord],
    ) -> Result<AllocationResult> {
        for row in required {
            row.interval.validate()?;
        }
        let mut context = AllocationContext::new(workers)?;
        let demand = demand_by_skill(required);

        info!(
            "🧮 Allocation run {}: {} skills with demand, {} workers",
            context.run_id(),
            demand.values().filter(|&&seconds| seconds > 0).count(),
            context.worker_count()
        );

        let staffed = context.staffed_skills();
        for skill in demand.keys().filter(|skill| !staffed.contains(*skill)) {
            warn!("No worker on the roster has skill {}", skill);
        }

        let mut outstanding: BTreeSet<SkillId> = demand
            .iter()
            .filter(|(_, &seconds)| seconds > 0)
            .map(|(skill, _)| skill.clone())
            .collect();

        let mut assignments = Vec::new();
        let mut unmet = Vec::new();

        while let Some((skill, priority)) = next_skill(&outstanding, &demand, &context) {
            outstanding.remove(&skill);
            let demand_seconds = demand.get(&skill).copied().unwrap_or(0);
            let remaining = fill_skill(
                &mut context,
                &skill,
                demand_seconds,
                priority,
                &mut assignments,
            );
            if remaining > 0 {
                debug!(
                    "Skill {} left with {:.2}h unmet of {:.2}h",
                    skill,
                    remaining as f64 / 3600.0,
                    demand_seconds as f64 / 3600.0
                );
                unmet.push(UnmetDemand {
                    skill_id: skill,
                    unmet_seconds: remaining,
                });
            }
        }

        let warning = PartialAllocationWarning::from_unmet(&unmet);
        if let Some(warning) = &warning {
            warn!(
                "⚠️ Allocation run {} left {:.2}h uncovered across {} skills",
                context.run_id(),
                warning.total_unmet_hours(),
                warning.skills.len()
            );
        }

        Ok(AllocationResult {
            run_id: context.run_id(),
            assignments,
            unmet,
            warning,
        })
    }
}

/// Total demand per skill in staff-seconds
fn demand_by_skill(required: &[RequiredStaffing]) -> BTreeMap<SkillId, u64> {
    let mut demand = BTreeMap::new();
    for row in required {
        *demand.entry(row.skill_id.clone()).or_insert(0u64) += row.demand_seconds();
    }
    demand
}

/// Highest-priority outstanding skill and its priority score
fn next_skill(
    outstanding: &BTreeSet<SkillId>,
    demand: &BTreeMap<SkillId, u64>,
    context: &AllocationContext,
) -> Option<(SkillId, f64)> {
    outstanding
        .iter()
        .map(|skill| {
            let demand_hours = demand.get(skill).copied().unwrap_or(0) as f64 / 3600.0;
            let eligible = context.candidates(skill).len().max(1);
            (skill, demand_hours / eligible as f64)
        })
        // BTreeSet iteration is ascending by id; max_by_key keeps the last
        // maximum, so compare on a reversed id to prefer the smallest one.
        .max_by_key(|(skill, priority)| (OrderedFloat(*priority), Reverse(*skill)))
        .map(|(skill, priority)| (skill.clone(), priority))
}

/// Assign workers to one skill; returns the seconds left uncovered
fn fill_skill(
    context: &mut AllocationContext,
    skill: &SkillId,
    demand_seconds: u64,
    priority: f64,
    assignments: &mut Vec<AllocationAssignment>,
) -> u64 {
    let mut candidates = context.candidates(skill);
    candidates.sort_by(|a, b| rank_key(a).cmp(&rank_key(b)));

    let mut remaining = demand_seconds;
    for candidate in candidates {
        if remaining == 0 {
            break;
        }
        let capacity = context.capacity_seconds(&candidate.worker_id, candidate.efficiency);
        let covered = remaining.min(capacity);
        if covered == 0 {
            continue;
        }
        let clock_hours = covered as f64 / 3600.0 / candidate.efficiency;
        let charged = context.charge(&candidate.worker_id, clock_hours);
        remaining -= covered;

        debug!(
            "Assigned {} to {}: {:.3}h clock, {:.3}h covered (efficiency {:.2})",
            candidate.worker_id,
            skill,
            charged,
            covered as f64 / 3600.0,
            candidate.efficiency
        );
        assignments.push(AllocationAssignment {
            worker_id: candidate.worker_id,
            skill_id: skill.clone(),
            allocated_hours: charged,
            covered_seconds: covered,
            efficiency_score: candidate.efficiency,
            priority_score_at_assignment: priority,
        });
    }
    remaining
}

fn rank_key(candidate: &Candidate) -> (Reverse<OrderedFloat<f64>>, OrderedFloat<f64>, &WorkerId) {
    (
        Reverse(OrderedFloat(candidate.efficiency)),
        OrderedFloat(candidate.used_hours),
        &candidate.worker_id,
    )
}
