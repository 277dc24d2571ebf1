//! Staffing engine facade
//!
//! [`StaffingEngine`] wires the pure calculators to the collaborator
//! providers and the real-time monitor. The calculators can also be used on
//! their own; the engine adds provider fetches and logging around them.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allocation::{AllocationResult, MultiSkillAllocator};
use crate::config::StaffingConfig;
use crate::coverage::{AvailableStaffing, CoverageGapAnalyzer};
use crate::error::Result;
use crate::monitor::{MonitorHandle, RealTimeMonitor, ReportCallback, ScopeSpec};
use crate::providers::{CostConfigProvider, ForecastProvider, LiveMetricsProvider, RosterProvider};
use crate::queueing::{QueueingModel, SizingOutcome, StaffingPlan};
use crate::types::{
    CostConfig, CoverageGap, ForecastInterval, IntervalWindow, RequiredStaffing, ScopeId, WorkerRecord,
};

/// Collaborators the engine reads from
#[derive(Clone)]
pub struct EngineProviders {
    pub forecasts: Arc<dyn ForecastProvider>,
    pub roster: Arc<dyn RosterProvider>,
    pub live_metrics: Arc<dyn LiveMetricsProvider>,
    pub costs: Arc<dyn CostConfigProvider>,
}

impl EngineProviders {
    /// Use one value for every collaborator
    pub fn from_shared<P>(provider: Arc<P>) -> Self
    where
        P: ForecastProvider + RosterProvider + LiveMetricsProvider + CostConfigProvider + 'static,
    {
        Self {
            forecasts: provider.clone(),
            roster: provider.clone(),
            live_metrics: provider.clone(),
            costs: provider,
        }
    }
}

/// Sizing, allocation and coverage for one scope and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopePlan {
    pub scope_id: ScopeId,
    pub period: IntervalWindow,
    pub cost: CostConfig,
    pub staffing: StaffingPlan,
    pub allocation: AllocationResult,
    pub gaps: Vec<CoverageGap>,
}

/// Entry point for planning and monitoring
pub struct StaffingEngine {
    config: StaffingConfig,
    queueing: QueueingModel,
    allocator: MultiSkillAllocator,
    analyzer: CoverageGapAnalyzer,
    providers: EngineProviders,
    monitor: RealTimeMonitor,
}

impl StaffingEngine {
    /// Create an engine after validating the configuration
    pub fn new(config: StaffingConfig, providers: EngineProviders) -> Result<Self> {
        config.validate()?;
        info!("🚀 Creating StaffingEngine");

        let queueing = QueueingModel::new(config.queueing.clone());
        let analyzer = CoverageGapAnalyzer::new(config.coverage.clone());
        let monitor = RealTimeMonitor::new(
            config.monitor.clone(),
            analyzer.clone(),
            providers.live_metrics.clone(),
        );

        Ok(Self {
            config,
            queueing,
            allocator: MultiSkillAllocator::new(),
            analyzer,
            providers,
            monitor,
        })
    }

    pub fn config(&self) -> &StaffingConfig {
        &self.config
    }

    pub fn monitor(&self) -> &RealTimeMonitor {
        &self.monitor
    }

    /// Minimum staff for a single forecast interval
    pub fn size_staffing(&self, forecast: &ForecastInterval) -> Result<SizingOutcome> {
        self.queueing.size_interval(forecast)
    }

    /// Requirement rows for a whole forecast
    pub fn size_forecast(&self, forecast: &[ForecastInterval]) -> Result<StaffingPlan> {
        self.queueing.size_forecast(forecast)
    }

    pub fn optimize_allocation(
        &self,
        required: &[RequiredStaffing],
        workers: &[WorkerRecord],
    ) -> Result<AllocationResult> {
        self.allocator.allocate(required, workers)
    }

    pub fn analyze_coverage(
        &self,
        required: &[RequiredStaffing],
        available: &AvailableStaffing,
        cost: &CostConfig,
    ) -> Result<Vec<CoverageGap>> {
        self.analyzer.analyze(required, available, cost)
    }

    /// Fetch everything for a scope and run sizing, allocation and analysis
    pub async fn plan_scope(&self, scope: &ScopeId, period: IntervalWindow) -> Result<ScopePlan> {
        period.validate()?;
        info!("📋 Planning scope {} for {}", scope, period);

        let (forecast, workers, cost) = futures::try_join!(
            self.providers.forecasts.get_forecast(scope, period),
            self.providers.roster.get_workers(scope),
            self.providers.costs.get_cost_config(scope)
        )?;

        let staffing = self.queueing.size_forecast(&forecast)?;
        if !staffing.is_fully_feasible() {
            warn!(
                "⚠️ Scope {}: {} intervals cannot meet their service level target",
                scope,
                staffing.infeasible.len()
            );
        }

        let allocation = self.allocator.allocate(&staffing.required, &workers)?;
        let gaps = self
            .analyzer
            .analyze_allocation(&staffing.required, &allocation, &cost)?;

        info!(
            "✅ Scope {} planned: {} requirement rows, {} assignments, {} shortfalls",
            scope,
            staffing.required.len(),
            allocation.assignments.len(),
            gaps.iter().filter(|g| g.is_shortfall()).count()
        );

        Ok(ScopePlan {
            scope_id: scope.clone(),
            period,
            cost,
            staffing,
            allocation,
            gaps,
        })
    }

    /// Size the scope's forecast for `period` and begin live monitoring
    ///
    /// `interval` defaults to `monitor.default_interval_seconds`.
    pub async fn start_monitoring(
        &self,
        scope: &ScopeId,
        period: IntervalWindow,
        interval: Option<Duration>,
        callback: ReportCallback,
    ) -> Result<MonitorHandle> {
        let (forecast, cost) = futures::try_join!(
            self.providers.forecasts.get_forecast(scope, period),
            self.providers.costs.get_cost_config(scope)
        )?;
        let staffing = self.queueing.size_forecast(&forecast)?;

        let interval =
            interval.unwrap_or_else(|| Duration::from_secs(self.config.monitor.default_interval_seconds));
        self.monitor.start(
            ScopeSpec {
                scope_id: scope.clone(),
                required: staffing.required,
                cost,
            },
            interval,
            callback,
        )
    }

    pub async fn stop_monitoring(&self, handle: &MonitorHandle) -> Result<()> {
        self.monitor.stop(handle).await
    }

    /// Stop all monitored scopes
    pub async fn shutdown(&self) -> Result<()> {
        info!("🛑 Shutting down StaffingEngine");
        self.monitor.stop_all().await
    }
}
