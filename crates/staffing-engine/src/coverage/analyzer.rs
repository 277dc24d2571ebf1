//! Gap scoring against required staffing

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocation::AllocationResult;
use crate::config::CoverageConfig;
use crate::error::Result;
use crate::types::{
    CostConfig, CoverageGap, IntervalWindow, LiveQueueSnapshot, RequiredStaffing, Severity, SkillId,
};

use super::actions;
use super::breach::{BreachTracker, CoverageAlert};

/// Staff available to cover the requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AvailableStaffing {
    /// One head count per skill, applied to every interval of that skill
    HeadCounts(BTreeMap<SkillId, u32>),
    /// Head counts for each (skill, interval) pair (forecast mode)
    PerInterval { counts: Vec<IntervalHeadCount> },
    /// Agents reported by the live feed (live mode)
    Live(LiveQueueSnapshot),
}

/// Head-count equivalent of one skill in one interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalHeadCount {
    pub skill_id: SkillId,
    pub interval: IntervalWindow,
    pub available_count: u32,
}

/// Live-mode gaps plus the breach state after the tick
#[derive(Debug, Clone, PartialEq)]
pub struct LiveAnalysis {
    pub gaps: Vec<CoverageGap>,
    pub breaching: bool,
    pub consecutive_breaches: u32,
    pub alert: Option<CoverageAlert>,
}

/// Convert an allocation into head-count equivalents per skill and interval
///
/// A skill's covered staff-seconds are spread over its intervals in
/// proportion to each interval's demand, then divided by the interval length
/// and rounded down. A skill whose demand is fully covered therefore gets
/// exactly its required count in every interval. Rows sharing a skill and
/// window are merged; skills that received nothing map to zero.
pub fn head_counts_from_allocation(
    required: &[RequiredStaffing],
    allocation: &AllocationResult,
) -> Vec<IntervalHeadCount> {
    let mut demand: BTreeMap<&SkillId, BTreeMap<IntervalWindow, u64>> = BTreeMap::new();
    for row in required {
        *demand
            .entry(&row.skill_id)
            .or_default()
            .entry(row.interval)
            .or_insert(0) += row.demand_seconds();
    }

    let covered = allocation.covered_seconds_by_skill();
    let mut counts = Vec::new();
    for (skill, windows) in demand {
        let total_demand: u128 = windows.values().map(|d| u128::from(*d)).sum();
        let covered_seconds = u128::from(covered.get(skill).copied().unwrap_or(0)).min(total_demand);

        for (interval, interval_demand) in windows {
            let span = u128::from(interval.duration_seconds().max(0) as u64);
            let heads = if span == 0 || total_demand == 0 {
                0
            } else {
                let share = covered_seconds * u128::from(interval_demand) / total_demand;
                u32::try_from(share / span).unwrap_or(u32::MAX)
            };
            counts.push(IntervalHeadCount {
                skill_id: skill.clone(),
                interval,
                available_count: heads,
            });
        }
    }
    counts
}

/// Scores required vs available staff into coverage gaps
#[derive(Debug, Clone, Default)]
pub struct CoverageGapAnalyzer {
    config: CoverageConfig,
}

impl CoverageGapAnalyzer {
    pub fn new(config: CoverageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoverageConfig {
        &self.config
    }

    /// Compute gaps sorted by interval start, then skill
    ///
    /// Identical inputs always produce identical output.
    pub fn analyze(
        &self,
        required: &[RequiredStaffing],
        available: &AvailableStaffing,
        cost: &CostConfig,
    ) -> Result<Vec<CoverageGap>> {
        cost.validate()?;
        for row in required {
            row.interval.validate()?;
        }

        let gaps = match available {
            AvailableStaffing::HeadCounts(counts) => {
                self.score_rows(required, cost, |row| counts.get(&row.skill_id).copied().unwrap_or(0))
            }
            AvailableStaffing::PerInterval { counts } => {
                let lookup: BTreeMap<(&SkillId, IntervalWindow), u32> = counts
                    .iter()
                    .map(|c| ((&c.skill_id, c.interval), c.available_count))
                    .collect();
                self.score_rows(required, cost, |row| {
                    lookup.get(&(&row.skill_id, row.interval)).copied().unwrap_or(0)
                })
            }
            AvailableStaffing::Live(snapshot) => {
                snapshot.validate()?;
                vec![self.score_live(required, snapshot, cost)]
            }
        };

        debug!("Scored {} coverage gaps", gaps.len());
        Ok(gaps)
    }

    /// Forecast mode straight from an allocation result
    pub fn analyze_allocation(
        &self,
        required: &[RequiredStaffing],
        allocation: &AllocationResult,
        cost: &CostConfig,
    ) -> Result<Vec<CoverageGap>> {
        let counts = head_counts_from_allocation(required, allocation);
        self.analyze(required, &AvailableStaffing::PerInterval { counts }, cost)
    }

    /// Live mode with breach tracking for the snapshot's scope
    pub fn analyze_live(
        &self,
        tracker: &mut BreachTracker,
        required: &[RequiredStaffing],
        snapshot: &LiveQueueSnapshot,
        cost: &CostConfig,
    ) -> Result<LiveAnalysis> {
        let gaps = self.analyze(required, &AvailableStaffing::Live(snapshot.clone()), cost)?;
        let worst = gaps.iter().map(|g| g.severity).max().unwrap_or(Severity::Low);
        let observation = tracker.observe(snapshot, worst);
        Ok(LiveAnalysis {
            gaps,
            breaching: observation.breaching,
            consecutive_breaches: observation.consecutive_breaches,
            alert: observation.alert,
        })
    }

    fn score_rows<F>(&self, required: &[RequiredStaffing], cost: &CostConfig, available_for: F) -> Vec<CoverageGap>
    where
        F: Fn(&RequiredStaffing) -> u32,
    {
        let mut rows: Vec<&RequiredStaffing> = required.iter().collect();
        rows.sort_by(|a, b| {
            (a.interval.start, &a.skill_id, a.interval.end).cmp(&(b.interval.start, &b.skill_id, b.interval.end))
        });
        rows.into_iter()
            .map(|row| {
                self.score(
                    row.interval,
                    Some(row.skill_id.clone()),
                    row.required_count,
                    available_for(row),
                    cost,
                )
            })
            .collect()
    }

    fn score_live(&self, required: &[RequiredStaffing], snapshot: &LiveQueueSnapshot, cost: &CostConfig) -> CoverageGap {
        let current: Vec<&RequiredStaffing> = required
            .iter()
            .filter(|row| row.interval.contains(snapshot.timestamp))
            .collect();

        // Narrowest window that contains the snapshot; a one-minute window
        // starting at the snapshot when nothing is required right now.
        let interval = current
            .iter()
            .map(|row| row.interval)
            .reduce(|acc, w| IntervalWindow {
                start: acc.start.max(w.start),
                end: acc.end.min(w.end),
            })
            .unwrap_or(IntervalWindow {
                start: snapshot.timestamp,
                end: snapshot.timestamp + Duration::minutes(1),
            });
        let required_count = current
            .iter()
            .fold(0u32, |sum, row| sum.saturating_add(row.required_count));

        self.score(interval, None, required_count, snapshot.agents_available, cost)
    }

    fn score(
        &self,
        interval: IntervalWindow,
        skill_id: Option<SkillId>,
        required_count: u32,
        available_count: u32,
        cost: &CostConfig,
    ) -> CoverageGap {
        let gap_count = i64::from(required_count) - i64::from(available_count);
        let severity = if gap_count <= 0 {
            Severity::Low
        } else {
            self.config
                .thresholds
                .classify(gap_count as f64 / f64::from(required_count))
        };

        let multiplier = if severity >= self.config.overtime_from_severity && gap_count > 0 {
            cost.overtime_multiplier
        } else {
            1.0
        };
        let estimated_cost_impact = gap_count.max(0) as f64 * cost.hourly_cost * multiplier;
        let suggested_actions = actions::suggest(severity, skill_id.as_ref(), gap_count);

        CoverageGap {
            interval,
            skill_id,
            required_count,
            available_count,
            gap_count,
            severity,
            estimated_cost_impact,
            suggested_actions,
        }
    }
}
