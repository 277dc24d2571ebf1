//! Collaborator data sources
//!
//! The engine only reads from these. Implementations own validation of
//! their raw storage format; what they hand back must already be typed
//! records. A failed fetch is reported as [`StaffingError::DataUnavailable`].

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{Result, StaffingError};
use crate::types::{CostConfig, ForecastInterval, IntervalWindow, LiveQueueSnapshot, ScopeId, WorkerRecord};

/// Demand forecasts per scope
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Forecast intervals that overlap `period`
    async fn get_forecast(&self, scope: &ScopeId, period: IntervalWindow) -> Result<Vec<ForecastInterval>>;
}

/// Workers with their skill profiles and employment constraints
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn get_workers(&self, scope: &ScopeId) -> Result<Vec<WorkerRecord>>;
}

/// Live queue metrics
#[async_trait]
pub trait LiveMetricsProvider: Send + Sync {
    async fn get_snapshot(&self, scope: &ScopeId) -> Result<LiveQueueSnapshot>;
}

/// Pricing of staff hours per scope
#[async_trait]
pub trait CostConfigProvider: Send + Sync {
    async fn get_cost_config(&self, scope: &ScopeId) -> Result<CostConfig>;
}

/// In-memory store implementing every provider trait
///
/// Backs the `staffing-plan` binary and tests. A scope with no data loaded
/// answers with `DataUnavailable`, never with made-up values.
#[derive(Debug, Default)]
pub struct InMemoryProviders {
    forecasts: DashMap<ScopeId, Vec<ForecastInterval>>,
    rosters: DashMap<ScopeId, Vec<WorkerRecord>>,
    snapshots: DashMap<ScopeId, LiveQueueSnapshot>,
    costs: DashMap<ScopeId, CostConfig>,
}

impl InMemoryProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_forecast(&self, scope: impl Into<ScopeId>, intervals: Vec<ForecastInterval>) {
        self.forecasts.insert(scope.into(), intervals);
    }

    pub fn set_roster(&self, scope: impl Into<ScopeId>, workers: Vec<WorkerRecord>) {
        self.rosters.insert(scope.into(), workers);
    }

    pub fn set_snapshot(&self, snapshot: LiveQueueSnapshot) {
        self.snapshots.insert(snapshot.scope_id.clone(), snapshot);
    }

    pub fn set_cost_config(&self, scope: impl Into<ScopeId>, cost: CostConfig) {
        self.costs.insert(scope.into(), cost);
    }

    pub fn clear_snapshot(&self, scope: &ScopeId) {
        self.snapshots.remove(scope);
    }

    fn missing(source: &str, scope: &ScopeId) -> StaffingError {
        StaffingError::data_unavailable(source, scope.as_str(), "no data loaded")
    }
}

#[async_trait]
impl ForecastProvider for InMemoryProviders {
    async fn get_forecast(&self, scope: &ScopeId, period: IntervalWindow) -> Result<Vec<ForecastInterval>> {
        let intervals = self
            .forecasts
            .get(scope)
            .ok_or_else(|| Self::missing("forecast", scope))?;
        Ok(intervals
            .iter()
            .filter(|f| f.interval.start < period.end && period.start < f.interval.end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RosterProvider for InMemoryProviders {
    async fn get_workers(&self, scope: &ScopeId) -> Result<Vec<WorkerRecord>> {
        self.rosters
            .get(scope)
            .map(|workers| workers.clone())
            .ok_or_else(|| Self::missing("roster", scope))
    }
}

#[async_trait]
impl LiveMetricsProvider for InMemoryProviders {
    async fn get_snapshot(&self, scope: &ScopeId) -> Result<LiveQueueSnapshot> {
        self.snapshots
            .get(scope)
            .map(|snapshot| snapshot.clone())
            .ok_or_else(|| Self::missing("live metrics", scope))
    }
}

#[async_trait]
impl CostConfigProvider for InMemoryProviders {
    async fn get_cost_config(&self, scope: &ScopeId) -> Result<CostConfig> {
        self.costs
            .get(scope)
            .map(|cost| cost.clone())
            .ok_or_else(|| Self::missing("cost config", scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window(from: u32, to: u32) -> IntervalWindow {
        IntervalWindow::new(
            Utc.with_ymd_and_hms(2024, 5, 6, from, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 6, to, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn forecast(from: u32) -> ForecastInterval {
        ForecastInterval {
            skill_id: "billing".into(),
            interval: window(from, from + 1),
            predicted_volume: 40.0,
            average_handle_time: 240.0,
            target_service_level: 0.8,
            target_answer_time: 20.0,
        }
    }

    #[tokio::test]
    async fn test_forecast_filtered_by_period() {
        let store = InMemoryProviders::new();
        store.set_forecast("support", vec![forecast(8), forecast(9), forecast(10)]);

        let scope = ScopeId::new("support");
        let intervals = store.get_forecast(&scope, window(9, 10)).await.unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].interval, window(9, 10));
    }

    #[tokio::test]
    async fn test_missing_scope_is_data_unavailable() {
        let store = InMemoryProviders::new();
        let scope = ScopeId::new("unknown");
        let err = store.get_snapshot(&scope).await.unwrap_err();
        assert!(err.is_transient());
        assert!(store.get_workers(&scope).await.is_err());
        assert!(store.get_cost_config(&scope).await.is_err());
    }
}
