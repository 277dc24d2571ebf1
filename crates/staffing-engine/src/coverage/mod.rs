//! # Coverage Gap Module
//!
//! Compares required staffing against what is available and turns each
//! difference into a scored [`CoverageGap`](crate::types::CoverageGap).
//!
//! ## Modes
//!
//! ```text
//!   forecast mode                        live mode
//! ┌───────────────────┐             ┌────────────────────┐
//! │ AllocationResult  │             │ LiveQueueSnapshot  │
//! └─────────┬─────────┘             └─────────┬──────────┘
//!           │ head_counts_from_allocation     │ agents_available
//!           │ (per skill and interval)        │
//! ┌─────────▼─────────────────────────────────▼──────────┐
//! │                 CoverageGapAnalyzer                  │
//! │  gap = required − available   (signed, exact)        │
//! │  severity from gap / required                        │
//! │  cost = max(0, gap) × hourly × overtime multiplier   │
//! │  actions from the severity rule table                │
//! └─────────┬─────────────────────────────────┬──────────┘
//!           │ one gap per skill row           │ one aggregate gap
//!           ▼                                 ▼ + BreachTracker
//! ```
//!
//! The only rounding happens when covered hours are turned into head-count
//! equivalents; everything downstream is integer arithmetic on counts.

pub mod actions;
pub mod analyzer;
pub mod breach;

pub use actions::SuggestedAction;
pub use analyzer::{
    head_counts_from_allocation, AvailableStaffing, CoverageGapAnalyzer, IntervalHeadCount, LiveAnalysis,
};
pub use breach::{BreachObservation, BreachTracker, CoverageAlert};
