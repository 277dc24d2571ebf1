//! Tick execution for one scope
//!
//! A [`ScopeWorker`] owns everything a tick mutates. The scheduling loop
//! keeps it behind a `tokio::sync::Mutex` and only ever runs a tick while
//! holding the lock, which is what bounds a scope to one analysis in flight.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::coverage::{BreachTracker, CoverageGapAnalyzer};
use crate::providers::LiveMetricsProvider;
use crate::types::{CoverageGap, LiveQueueSnapshot};

use super::diagnostics::ScopeDiagnostics;
use super::{LiveCoverageReport, ScopeSpec};

/// Mutable per-scope state, touched only by the tick holding the lock
pub(crate) struct ScopeWorker {
    spec: ScopeSpec,
    config: MonitorConfig,
    analyzer: CoverageGapAnalyzer,
    metrics: Arc<dyn LiveMetricsProvider>,
    diagnostics: Arc<ScopeDiagnostics>,
    tracker: BreachTracker,
    tick: u64,
    last_snapshot: Option<LiveQueueSnapshot>,
    last_gaps: Vec<CoverageGap>,
}

impl ScopeWorker {
    pub(crate) fn new(
        spec: ScopeSpec,
        config: MonitorConfig,
        analyzer: CoverageGapAnalyzer,
        metrics: Arc<dyn LiveMetricsProvider>,
        diagnostics: Arc<ScopeDiagnostics>,
    ) -> Self {
        let tracker = BreachTracker::new(config.consecutive_breach_threshold, config.service_level_threshold);
        Self {
            spec,
            config,
            analyzer,
            metrics,
            diagnostics,
            tracker,
            tick: 0,
            last_snapshot: None,
            last_gaps: Vec::new(),
        }
    }

    /// Fetch, analyze and build the report for the next tick
    pub(crate) async fn run_tick(&mut self) -> LiveCoverageReport {
        self.tick += 1;
        let scope_id = &self.spec.scope_id;

        let Some(snapshot) = self.fetch_snapshot().await else {
            return self.stale_report();
        };
        if snapshot.scope_id != *scope_id {
            warn!(
                "⚠️ Scope {} tick {}: rejected live snapshot for scope {}",
                scope_id, self.tick, snapshot.scope_id
            );
            return self.stale_report();
        }

        match self
            .analyzer
            .analyze_live(&mut self.tracker, &self.spec.required, &snapshot, &self.spec.cost)
        {
            Ok(analysis) => {
                if let Some(alert) = &analysis.alert {
                    self.diagnostics.alert_raised();
                    warn!(
                        "🚨 Scope {} below service level {:.2} for {} consecutive ticks (current {:.2})",
                        scope_id, alert.service_level_threshold, alert.consecutive_breaches, alert.current_service_level
                    );
                }
                debug!(
                    "Scope {} tick {}: {} gaps, breaching={}",
                    scope_id,
                    self.tick,
                    analysis.gaps.len(),
                    analysis.breaching
                );
                self.last_snapshot = Some(snapshot.clone());
                self.last_gaps = analysis.gaps.clone();
                LiveCoverageReport {
                    scope_id: scope_id.clone(),
                    tick: self.tick,
                    generated_at: Utc::now(),
                    snapshot: Some(snapshot),
                    gaps: analysis.gaps,
                    alert: analysis.alert,
                    consecutive_breaches: analysis.consecutive_breaches,
                    stale: false,
                }
            }
            Err(e) => {
                warn!("⚠️ Scope {} tick {}: rejected live snapshot: {}", scope_id, self.tick, e);
                self.stale_report()
            }
        }
    }

    /// Snapshot with retries, `None` once every attempt failed
    async fn fetch_snapshot(&self) -> Option<LiveQueueSnapshot> {
        let scope_id = &self.spec.scope_id;
        let attempts = self.config.max_fetch_retries + 1;
        for attempt in 0..attempts {
            match self.metrics.get_snapshot(scope_id).await {
                Ok(snapshot) => return Some(snapshot),
                Err(e) => {
                    self.diagnostics.fetch_failed();
                    if attempt + 1 < attempts {
                        let backoff = self.config.backoff_for(attempt);
                        warn!(
                            "⚠️ Scope {} snapshot fetch failed (attempt {}/{}), retrying in {:?}: {}",
                            scope_id,
                            attempt + 1,
                            attempts,
                            backoff,
                            e
                        );
                        tokio::time::sleep(backoff).await;
                    } else {
                        warn!(
                            "⚠️ Scope {} snapshot fetch failed after {} attempts: {}",
                            scope_id, attempts, e
                        );
                    }
                }
            }
        }
        None
    }

    fn stale_report(&self) -> LiveCoverageReport {
        self.diagnostics.stale_report();
        info!("📉 Scope {} tick {} reported stale", self.spec.scope_id, self.tick);
        LiveCoverageReport {
            scope_id: self.spec.scope_id.clone(),
            tick: self.tick,
            generated_at: Utc::now(),
            snapshot: self.last_snapshot.clone(),
            gaps: self.last_gaps.clone(),
            alert: None,
            consecutive_breaches: self.tracker.consecutive_breaches(),
            stale: true,
        }
    }
}
