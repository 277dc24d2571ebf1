//! Consecutive-breach tracking for live coverage
//!
//! The tracker belongs to exactly one monitored scope. An alert fires on the
//! tick where the consecutive breach count first reaches the threshold; it
//! does not fire again until a non-breaching tick has reset the count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LiveQueueSnapshot, ScopeId, Severity};

/// Raised once per sustained service-level breach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageAlert {
    pub scope_id: ScopeId,
    pub raised_at: DateTime<Utc>,
    pub consecutive_breaches: u32,
    pub current_service_level: f64,
    pub service_level_threshold: f64,
    /// Worst gap severity observed on the alerting tick
    pub severity: Severity,
    pub calls_waiting: u32,
}

/// Outcome of feeding one tick to the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct BreachObservation {
    pub breaching: bool,
    pub consecutive_breaches: u32,
    pub alert: Option<CoverageAlert>,
}

/// Per-scope edge-triggered breach detector
#[derive(Debug, Clone)]
pub struct BreachTracker {
    consecutive_threshold: u32,
    service_level_threshold: f64,
    consecutive: u32,
}

impl BreachTracker {
    pub fn new(consecutive_threshold: u32, service_level_threshold: f64) -> Self {
        Self {
            consecutive_threshold: consecutive_threshold.max(1),
            service_level_threshold,
            consecutive: 0,
        }
    }

    pub fn consecutive_breaches(&self) -> u32 {
        self.consecutive
    }

    pub fn is_breaching(&self, snapshot: &LiveQueueSnapshot) -> bool {
        snapshot.current_service_level < self.service_level_threshold
    }

    /// Record one tick
    pub fn observe(&mut self, snapshot: &LiveQueueSnapshot, worst_severity: Severity) -> BreachObservation {
        let breaching = self.is_breaching(snapshot);
        if !breaching {
            self.consecutive = 0;
            return BreachObservation {
                breaching,
                consecutive_breaches: 0,
                alert: None,
            };
        }

        self.consecutive = self.consecutive.saturating_add(1);
        let alert = (self.consecutive == self.consecutive_threshold).then(|| CoverageAlert {
            scope_id: snapshot.scope_id.clone(),
            raised_at: snapshot.timestamp,
            consecutive_breaches: self.consecutive,
            current_service_level: snapshot.current_service_level,
            service_level_threshold: self.service_level_threshold,
            severity: worst_severity,
            calls_waiting: snapshot.calls_waiting,
        });
        BreachObservation {
            breaching,
            consecutive_breaches: self.consecutive,
            alert,
        }
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}
