//! # Staffing-Engine
//!
//! Workforce staffing core for multi-skill contact centers built on RVoIP.
//!
//! This crate provides:
//! - Erlang C queue sizing per interval and skill
//! - Proficiency-weighted worker efficiency
//! - Multi-skill allocation of workers under employment constraints
//! - Coverage gap scoring with cost impact and suggested actions
//! - Real-time monitoring of live queues with edge-triggered alerts
//!
//! ## Architecture
//!
//! ```text
//!  ForecastProvider      RosterProvider      CostConfigProvider
//!         │                    │                     │
//!         ▼                    │                     │
//!   QueueingModel ──RequiredStaffing──┐              │
//!                              ▼      │              │
//!                    MultiSkillAllocator             │
//!                              │ AllocationResult    │
//!                              ▼      ▼              ▼
//!                        CoverageGapAnalyzer ◀───────┘
//!                              ▲
//!  LiveMetricsProvider ──▶ RealTimeMonitor ──▶ callback(LiveCoverageReport)
//! ```
//!
//! The calculators are pure functions of their arguments and can be used
//! concurrently from any number of scopes. Only the monitor keeps state, and
//! only per scope.
//!
//! ## Quick Start
//!
//! ```rust
//! use rvoip_staffing_engine::prelude::*;
//!
//! let model = QueueingModel::new(QueueingConfig::default());
//! let outcome = model.size(&SizingRequest {
//!     volume: 100.0,
//!     average_handle_time: 300.0,
//!     target_service_level: 0.8,
//!     target_answer_time: 20.0,
//!     max_occupancy: 0.85,
//!     interval_seconds: 3600,
//! }).unwrap();
//! assert_eq!(outcome.required_count(), 12);
//! ```

pub mod allocation;
pub mod config;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod proficiency;
pub mod providers;
pub mod queueing;
pub mod types;

pub use config::StaffingConfig;
pub use engine::{EngineProviders, ScopePlan, StaffingEngine};
pub use error::{Result, StaffingError};

/// Commonly used types
pub mod prelude {
    pub use crate::allocation::{AllocationResult, MultiSkillAllocator, PartialAllocationWarning};
    pub use crate::config::{CoverageConfig, MonitorConfig, QueueingConfig, SeverityThresholds, StaffingConfig};
    pub use crate::coverage::{
        head_counts_from_allocation, AvailableStaffing, BreachTracker, CoverageAlert, CoverageGapAnalyzer,
        IntervalHeadCount, SuggestedAction,
    };
    pub use crate::engine::{EngineProviders, ScopePlan, StaffingEngine};
    pub use crate::error::{Result, StaffingError};
    pub use crate::logging::{setup_logging, LoggingConfig};
    pub use crate::monitor::{
        DiagnosticsSnapshot, LiveCoverageReport, MonitorHandle, RealTimeMonitor, ReportCallback, ScopeSpec,
        ScopeState,
    };
    pub use crate::proficiency::efficiency;
    pub use crate::providers::{
        CostConfigProvider, ForecastProvider, InMemoryProviders, LiveMetricsProvider, RosterProvider,
    };
    pub use crate::queueing::{CapacityInfeasible, QueueingModel, SizingOutcome, SizingRequest, StaffingPlan};
    pub use crate::types::*;
}
