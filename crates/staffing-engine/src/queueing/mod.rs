//! # Queue Sizing Module
//!
//! Computes the minimum number of staff needed for one interval of one skill
//! to reach a service-level target, using the Erlang C queuing model.
//!
//! ## Model
//!
//! ```text
//! offered load      a   = volume × AHT / interval_seconds
//! waiting prob.     C   = ErlangC(a, N)
//! service level     SL  = 1 − C · exp(−(N − a) · t / AHT)
//! occupancy         ρ   = a / N
//! ```
//!
//! The search starts at the first stable server count `floor(a) + 1` and
//! walks `N` upward until `SL ≥ target` and `ρ ≤ max_occupancy`. It stops at
//! the configured ceiling, in which case the interval is reported as
//! [`SizingOutcome::CapacityInfeasible`] together with a best-effort count.
//!
//! ## Example
//!
//! ```rust
//! use rvoip_staffing_engine::config::QueueingConfig;
//! use rvoip_staffing_engine::queueing::{QueueingModel, SizingRequest};
//!
//! let model = QueueingModel::new(QueueingConfig::default());
//! let outcome = model.size(&SizingRequest {
//!     volume: 100.0,
//!     average_handle_time: 300.0,
//!     target_service_level: 0.8,
//!     target_answer_time: 20.0,
//!     max_occupancy: 0.85,
//!     interval_seconds: 1800,
//! }).unwrap();
//! assert_eq!(outcome.required_count(), 21);
//! ```

pub mod erlang;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::QueueingConfig;
use crate::error::{Result, StaffingError};
use crate::types::{ForecastInterval, IntervalWindow, RequiredStaffing, SkillId};

pub use erlang::{average_speed_of_answer, erlang_c, service_level, ErlangRecurrence};

/// Inputs of a single sizing calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingRequest {
    /// Contacts arriving during the interval
    pub volume: f64,
    /// Seconds
    pub average_handle_time: f64,
    pub target_service_level: f64,
    /// Seconds
    pub target_answer_time: f64,
    pub max_occupancy: f64,
    pub interval_seconds: i64,
}

impl SizingRequest {
    /// Request for a forecast interval, using the given occupancy cap
    pub fn from_forecast(forecast: &ForecastInterval, max_occupancy: f64) -> Self {
        Self {
            volume: forecast.predicted_volume,
            average_handle_time: forecast.average_handle_time,
            target_service_level: forecast.target_service_level,
            target_answer_time: forecast.target_answer_time,
            max_occupancy,
            interval_seconds: forecast.interval.duration_seconds(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(StaffingError::validation(format!(
                "volume must be a non-negative number, got {}",
                self.volume
            )));
        }
        if !self.average_handle_time.is_finite() || self.average_handle_time < 0.0 {
            return Err(StaffingError::validation(format!(
                "average handle time must be a non-negative number, got {}",
                self.average_handle_time
            )));
        }
        if self.volume > 0.0 && self.average_handle_time == 0.0 {
            return Err(StaffingError::validation(
                "average handle time must be positive when volume is positive",
            ));
        }
        if !(self.target_service_level > 0.0 && self.target_service_level <= 1.0) {
            return Err(StaffingError::validation(format!(
                "target service level must be in (0, 1], got {}",
                self.target_service_level
            )));
        }
        if !self.target_answer_time.is_finite() || self.target_answer_time < 0.0 {
            return Err(StaffingError::validation(format!(
                "target answer time must be non-negative, got {}",
                self.target_answer_time
            )));
        }
        if !(self.max_occupancy > 0.0 && self.max_occupancy <= 1.0) {
            return Err(StaffingError::validation(format!(
                "max occupancy must be in (0, 1], got {}",
                self.max_occupancy
            )));
        }
        if self.interval_seconds <= 0 {
            return Err(StaffingError::validation(format!(
                "interval length must be positive, got {}s",
                self.interval_seconds
            )));
        }
        Ok(())
    }

    /// Offered load in Erlangs
    pub fn offered_load(&self) -> f64 {
        self.volume * self.average_handle_time / self.interval_seconds as f64
    }
}

/// A staff count that meets the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingDetail {
    pub required_count: u32,
    pub offered_load: f64,
    pub achieved_service_level: f64,
    pub occupancy: f64,
    /// Seconds
    pub average_speed_of_answer: f64,
}

/// The target cannot be met below the configured staff ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityInfeasible {
    /// Smallest count that keeps occupancy under the cap, limited to the ceiling
    pub best_effort_count: u32,
    pub offered_load: f64,
    pub achieved_service_level: f64,
    pub target_service_level: f64,
}

/// Result of sizing one interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SizingOutcome {
    Sized(SizingDetail),
    CapacityInfeasible(CapacityInfeasible),
}

impl SizingOutcome {
    /// Staff count to plan with (best effort when infeasible)
    pub fn required_count(&self) -> u32 {
        match self {
            SizingOutcome::Sized(detail) => detail.required_count,
            SizingOutcome::CapacityInfeasible(infeasible) => infeasible.best_effort_count,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, SizingOutcome::Sized(_))
    }

    pub fn achieved_service_level(&self) -> f64 {
        match self {
            SizingOutcome::Sized(detail) => detail.achieved_service_level,
            SizingOutcome::CapacityInfeasible(infeasible) => infeasible.achieved_service_level,
        }
    }
}

/// An interval whose target could not be met
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfeasibleInterval {
    pub skill_id: SkillId,
    pub interval: IntervalWindow,
    pub detail: CapacityInfeasible,
}

/// Requirements for a whole forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffingPlan {
    /// One row per forecast interval, in input order
    pub required: Vec<RequiredStaffing>,
    pub infeasible: Vec<InfeasibleInterval>,
}

impl StaffingPlan {
    pub fn is_fully_feasible(&self) -> bool {
        self.infeasible.is_empty()
    }
}

/// Erlang C staffing calculator
#[derive(Debug, Clone)]
pub struct QueueingModel {
    config: QueueingConfig,
}

impl QueueingModel {
    pub fn new(config: QueueingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QueueingConfig {
        &self.config
    }

    /// Minimum staff count for one request
    pub fn size(&self, request: &SizingRequest) -> Result<SizingOutcome> {
        request.validate()?;

        if request.volume == 0.0 {
            return Ok(SizingOutcome::Sized(SizingDetail {
                required_count: 0,
                offered_load: 0.0,
                achieved_service_level: 1.0,
                occupancy: 0.0,
                average_speed_of_answer: 0.0,
            }));
        }

        let load = request.offered_load();
        let ceiling = self.config.max_staff;
        let first_stable = stable_floor(load);

        let mut recurrence = ErlangRecurrence::new(load);
        let mut servers = first_stable;
        recurrence.advance_to(servers.min(ceiling));

        while servers <= ceiling {
            if let Some(c) = recurrence.erlang_c() {
                let sl = service_level(
                    load,
                    servers,
                    c,
                    request.average_handle_time,
                    request.target_answer_time,
                );
                let occupancy = load / f64::from(servers);
                if sl >= request.target_service_level && occupancy <= request.max_occupancy {
                    debug!(
                        "Sized load {:.3} Erl at {} staff (SL {:.4}, occupancy {:.3})",
                        load, servers, sl, occupancy
                    );
                    return Ok(SizingOutcome::Sized(SizingDetail {
                        required_count: servers,
                        offered_load: load,
                        achieved_service_level: sl,
                        occupancy,
                        average_speed_of_answer: average_speed_of_answer(
                            load,
                            servers,
                            c,
                            request.average_handle_time,
                        ),
                    }));
                }
            }
            if servers == ceiling {
                break;
            }
            servers += 1;
            recurrence.step();
        }

        let best_effort = best_effort_count(load, request.max_occupancy, ceiling);
        let achieved = erlang_c(load, best_effort)
            .map(|c| {
                service_level(
                    load,
                    best_effort,
                    c,
                    request.average_handle_time,
                    request.target_answer_time,
                )
            })
            .unwrap_or(0.0);

        warn!(
            "⚠️ Load {:.1} Erl cannot reach service level {:.2} within {} staff (best effort {})",
            load, request.target_service_level, ceiling, best_effort
        );
        Ok(SizingOutcome::CapacityInfeasible(CapacityInfeasible {
            best_effort_count: best_effort,
            offered_load: load,
            achieved_service_level: achieved,
            target_service_level: request.target_service_level,
        }))
    }

    /// Size one forecast interval using the configured occupancy cap
    pub fn size_interval(&self, forecast: &ForecastInterval) -> Result<SizingOutcome> {
        forecast.validate()?;
        self.size(&SizingRequest::from_forecast(forecast, self.config.max_occupancy))
    }

    /// Size every interval of a forecast
    ///
    /// All intervals are validated before any is sized, so malformed input
    /// produces no partial plan.
    pub fn size_forecast(&self, forecast: &[ForecastInterval]) -> Result<StaffingPlan> {
        for interval in forecast {
            interval.validate()?;
        }

        let mut plan = StaffingPlan::default();
        for interval in forecast {
            let outcome = self.size(&SizingRequest::from_forecast(interval, self.config.max_occupancy))?;
            plan.required.push(RequiredStaffing {
                interval: interval.interval,
                skill_id: interval.skill_id.clone(),
                required_count: outcome.required_count(),
            });
            if let SizingOutcome::CapacityInfeasible(detail) = outcome {
                plan.infeasible.push(InfeasibleInterval {
                    skill_id: interval.skill_id.clone(),
                    interval: interval.interval,
                    detail,
                });
            }
        }
        debug!(
            "Sized {} forecast intervals ({} infeasible)",
            plan.required.len(),
            plan.infeasible.len()
        );
        Ok(plan)
    }
}

/// First server count with `a / N < 1`
fn stable_floor(load: f64) -> u32 {
    let floor = load.floor();
    if floor >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        floor as u32 + 1
    }
}

fn best_effort_count(load: f64, max_occupancy: f64, ceiling: u32) -> u32 {
    let by_occupancy = (load / max_occupancy).ceil();
    let count = if by_occupancy >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        by_occupancy as u32
    };
    count.max(stable_floor(load)).min(ceiling)
}
