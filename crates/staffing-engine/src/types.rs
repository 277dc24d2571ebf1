//! Shared data model for staffing, allocation and coverage analysis
//!
//! Every record that crosses a collaborator boundary is a typed struct with a
//! `validate` method. Forecast, roster and live rows are validated when they
//! enter the engine, so the numeric components can rely on well-formed input.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coverage::SuggestedAction;
use crate::error::{Result, StaffingError};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a skill (usually one skill per queue/service line)
    SkillId
);
string_id!(
    /// Identifier of a worker on the roster
    WorkerId
);
string_id!(
    /// Identifier of an independently monitored unit (queue, service)
    ScopeId
);

/// Half-open time window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl IntervalWindow {
    /// Create a validated window
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(StaffingError::validation(format!(
                "interval end {} must be after start {}",
                self.end, self.start
            )));
        }
        Ok(())
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_seconds() as f64 / 3600.0
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl fmt::Display for IntervalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.format("%Y-%m-%dT%H:%M"), self.end.format("%Y-%m-%dT%H:%M"))
    }
}

/// Demand forecast for one skill over one interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInterval {
    pub skill_id: SkillId,
    pub interval: IntervalWindow,
    /// Contacts expected to arrive during the interval
    pub predicted_volume: f64,
    /// Seconds
    pub average_handle_time: f64,
    /// Fraction of contacts to answer within `target_answer_time`
    pub target_service_level: f64,
    /// Seconds
    pub target_answer_time: f64,
}

impl ForecastInterval {
    pub fn validate(&self) -> Result<()> {
        self.interval.validate()?;
        let context = || format!("forecast {} [{}]", self.skill_id, self.interval);
        if !self.predicted_volume.is_finite() || self.predicted_volume < 0.0 {
            return Err(StaffingError::validation(format!(
                "{}: predicted volume must be a non-negative number, got {}",
                context(),
                self.predicted_volume
            )));
        }
        if !self.average_handle_time.is_finite() || self.average_handle_time < 0.0 {
            return Err(StaffingError::validation(format!(
                "{}: average handle time must be a non-negative number, got {}",
                context(),
                self.average_handle_time
            )));
        }
        if !(self.target_service_level > 0.0 && self.target_service_level <= 1.0) {
            return Err(StaffingError::validation(format!(
                "{}: target service level must be in (0, 1], got {}",
                context(),
                self.target_service_level
            )));
        }
        if !self.target_answer_time.is_finite() || self.target_answer_time < 0.0 {
            return Err(StaffingError::validation(format!(
                "{}: target answer time must be non-negative, got {}",
                context(),
                self.target_answer_time
            )));
        }
        Ok(())
    }
}

/// Skill reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub category: String,
}

/// A worker's proficiency in one skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSkillProfile {
    pub worker_id: WorkerId,
    pub skill_id: SkillId,
    /// 1 (novice) ..= 5 (expert)
    pub proficiency_level: u8,
    pub certified: bool,
}

impl WorkerSkillProfile {
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.proficiency_level) {
            return Err(StaffingError::validation(format!(
                "worker {} skill {}: proficiency level must be 1-5, got {}",
                self.worker_id, self.skill_id, self.proficiency_level
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Temporary,
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Temporary => "temporary",
        };
        f.write_str(name)
    }
}

/// Working-time limits and cost of a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentConstraint {
    pub worker_id: WorkerId,
    pub employment_type: EmploymentType,
    /// Fraction of a full-time position, in (0, 1]
    pub work_rate: f64,
    pub max_daily_hours: f64,
    pub max_weekly_hours: f64,
    pub hourly_cost: f64,
}

impl EmploymentConstraint {
    pub fn validate(&self) -> Result<()> {
        if !(self.work_rate > 0.0 && self.work_rate <= 1.0) {
            return Err(StaffingError::validation(format!(
                "worker {}: work rate must be in (0, 1], got {}",
                self.worker_id, self.work_rate
            )));
        }
        for (name, value) in [
            ("max daily hours", self.max_daily_hours),
            ("max weekly hours", self.max_weekly_hours),
            ("hourly cost", self.hourly_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(StaffingError::validation(format!(
                    "worker {}: {} must be a non-negative number, got {}",
                    self.worker_id, name, value
                )));
            }
        }
        Ok(())
    }
}

/// One roster row: a worker with its skill profiles and employment constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub worker_id: WorkerId,
    pub skills: Vec<WorkerSkillProfile>,
    pub constraint: Option<EmploymentConstraint>,
    /// Hours already worked in the current week, charged against `max_weekly_hours`
    #[serde(default)]
    pub hours_worked_this_week: f64,
}

impl WorkerRecord {
    pub fn new(
        worker_id: impl Into<WorkerId>,
        skills: Vec<WorkerSkillProfile>,
        constraint: EmploymentConstraint,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            skills,
            constraint: Some(constraint),
            hours_worked_this_week: 0.0,
        }
    }

    /// Validate the record and return its constraint
    pub fn validate(&self) -> Result<&EmploymentConstraint> {
        let constraint = self.constraint.as_ref().ok_or_else(|| {
            StaffingError::validation(format!(
                "worker {} has no employment constraint record",
                self.worker_id
            ))
        })?;
        if constraint.worker_id != self.worker_id {
            return Err(StaffingError::validation(format!(
                "worker {} carries a constraint for worker {}",
                self.worker_id, constraint.worker_id
            )));
        }
        constraint.validate()?;

        if !self.hours_worked_this_week.is_finite() || self.hours_worked_this_week < 0.0 {
            return Err(StaffingError::validation(format!(
                "worker {}: hours worked this week must be non-negative, got {}",
                self.worker_id, self.hours_worked_this_week
            )));
        }

        let mut seen = std::collections::BTreeSet::new();
        for profile in &self.skills {
            if profile.worker_id != self.worker_id {
                return Err(StaffingError::validation(format!(
                    "worker {} carries a skill profile for worker {}",
                    self.worker_id, profile.worker_id
                )));
            }
            profile.validate()?;
            if !seen.insert(&profile.skill_id) {
                return Err(StaffingError::validation(format!(
                    "worker {} has more than one profile for skill {}",
                    self.worker_id, profile.skill_id
                )));
            }
        }
        Ok(constraint)
    }
}

/// Staff required for one skill during one interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredStaffing {
    pub interval: IntervalWindow,
    pub skill_id: SkillId,
    pub required_count: u32,
}

impl RequiredStaffing {
    /// Demand expressed as staff-seconds
    pub fn demand_seconds(&self) -> u64 {
        u64::from(self.required_count) * self.interval.duration_seconds().max(0) as u64
    }
}

/// Hours of one worker assigned to one skill in one allocation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationAssignment {
    pub worker_id: WorkerId,
    pub skill_id: SkillId,
    /// Clock hours of the worker consumed by this assignment
    pub allocated_hours: f64,
    /// Demand covered by the assignment (clock time × efficiency), whole seconds
    pub covered_seconds: u64,
    pub efficiency_score: f64,
    pub priority_score_at_assignment: f64,
}

impl AllocationAssignment {
    pub fn covered_hours(&self) -> f64 {
        self.covered_seconds as f64 / 3600.0
    }
}

/// Demand for a skill that no eligible worker could cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetDemand {
    pub skill_id: SkillId,
    pub unmet_seconds: u64,
}

impl UnmetDemand {
    pub fn unmet_hours(&self) -> f64 {
        self.unmet_seconds as f64 / 3600.0
    }
}

/// Shortfall severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Shortfall (or surplus) between required and available staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub interval: IntervalWindow,
    /// `None` for an aggregate gap across all skills of a scope
    pub skill_id: Option<SkillId>,
    pub required_count: u32,
    pub available_count: u32,
    /// `required_count - available_count`; negative means surplus
    pub gap_count: i64,
    pub severity: Severity,
    pub estimated_cost_impact: f64,
    pub suggested_actions: Vec<SuggestedAction>,
}

impl CoverageGap {
    pub fn is_shortfall(&self) -> bool {
        self.gap_count > 0
    }
}

/// Point-in-time queue metrics from the live-metrics collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveQueueSnapshot {
    pub scope_id: ScopeId,
    pub timestamp: DateTime<Utc>,
    pub calls_waiting: u32,
    pub agents_available: u32,
    /// Fraction in [0, 1]
    pub current_service_level: f64,
}

impl LiveQueueSnapshot {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.current_service_level) {
            return Err(StaffingError::validation(format!(
                "snapshot for scope {}: service level must be in [0, 1], got {}",
                self.scope_id, self.current_service_level
            )));
        }
        Ok(())
    }
}

/// Cost parameters used to price coverage gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    pub hourly_cost: f64,
    pub overtime_multiplier: f64,
    pub currency: String,
}

impl CostConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.hourly_cost.is_finite() || self.hourly_cost < 0.0 {
            return Err(StaffingError::validation(format!(
                "hourly cost must be a non-negative number, got {}",
                self.hourly_cost
            )));
        }
        if !self.overtime_multiplier.is_finite() || self.overtime_multiplier < 1.0 {
            return Err(StaffingError::validation(format!(
                "overtime multiplier must be at least 1.0, got {}",
                self.overtime_multiplier
            )));
        }
        Ok(())
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            hourly_cost: 25.0,
            overtime_multiplier: 1.5,
            currency: "USD".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> IntervalWindow {
        IntervalWindow::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap(),
        )
        .unwrap()
    }

    fn constraint(worker: &str) -> EmploymentConstraint {
        EmploymentConstraint {
            worker_id: worker.into(),
            employment_type: EmploymentType::FullTime,
            work_rate: 1.0,
            max_daily_hours: 8.0,
            max_weekly_hours: 40.0,
            hourly_cost: 30.0,
        }
    }

    #[test]
    fn test_interval_window_rejects_empty_range() {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        assert!(IntervalWindow::new(start, start).is_err());
    }

    #[test]
    fn test_interval_window_is_half_open() {
        let w = window();
        assert!(w.contains(w.start));
        assert!(!w.contains(w.end));
        assert_eq!(w.duration_seconds(), 1800);
        assert_eq!(w.duration_hours(), 0.5);
    }

    #[test]
    fn test_demand_seconds() {
        let req = RequiredStaffing {
            interval: window(),
            skill_id: "billing".into(),
            required_count: 4,
        };
        assert_eq!(req.demand_seconds(), 4 * 1800);
    }

    #[test]
    fn test_worker_without_constraint_is_rejected() {
        let record = WorkerRecord {
            worker_id: "w1".into(),
            skills: vec![],
            constraint: None,
            hours_worked_this_week: 0.0,
        };
        assert!(matches!(record.validate(), Err(StaffingError::InputValidation { .. })));
    }

    #[test]
    fn test_worker_profile_level_out_of_range() {
        let record = WorkerRecord::new(
            "w1",
            vec![WorkerSkillProfile {
                worker_id: "w1".into(),
                skill_id: "billing".into(),
                proficiency_level: 6,
                certified: false,
            }],
            constraint("w1"),
        );
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_worker_constraint_mismatch() {
        let record = WorkerRecord::new("w1", vec![], constraint("w2"));
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_forecast_validation() {
        let mut forecast = ForecastInterval {
            skill_id: "sales".into(),
            interval: window(),
            predicted_volume: 100.0,
            average_handle_time: 300.0,
            target_service_level: 0.8,
            target_answer_time: 20.0,
        };
        assert!(forecast.validate().is_ok());

        forecast.target_service_level = 1.2;
        assert!(forecast.validate().is_err());

        forecast.target_service_level = 0.8;
        forecast.predicted_volume = f64::NAN;
        assert!(forecast.validate().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = SkillId::new("billing");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"billing\"");
    }
}
