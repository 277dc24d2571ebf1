//! # Real-Time Monitor Module
//!
//! Periodically pulls a live queue snapshot for each monitored scope, scores
//! it with the coverage analyzer and pushes a [`LiveCoverageReport`] to the
//! caller's callback.
//!
//! ## Per-scope lifecycle
//!
//! ```text
//!            start()
//!               │
//!               ▼
//!          ┌─────────┐   tick, lock free   ┌─────────┐
//!          │  Idle   │────────────────────▶│ Running │
//!          │         │◀────────────────────│         │
//!          └────┬────┘   report built      └────┬────┘
//!               │                               │ tick while running
//!               │ stop()                        ▼
//!               │                          TickSkipped
//!               ▼                          (counter + warn)
//!          ┌─────────┐
//!          │ Stopped │  after the in-flight tick, if any, has finished
//!          └─────────┘
//! ```
//!
//! Every scope has its own task, timer and cancellation token. Scopes never
//! wait on each other, and stopping one leaves the rest untouched.
//!
//! ## Failure handling
//!
//! A failed snapshot fetch is retried with exponential backoff. When all
//! retries fail the tick still produces a report, flagged `stale`, carrying
//! the last good snapshot and gaps. Breach counting does not move on stale
//! ticks. A panicking report callback is logged and the scope keeps ticking.

pub mod diagnostics;
mod worker;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::coverage::{CoverageAlert, CoverageGapAnalyzer};
use crate::error::{Result, StaffingError};
use crate::providers::LiveMetricsProvider;
use crate::types::{CostConfig, CoverageGap, LiveQueueSnapshot, RequiredStaffing, ScopeId};

pub use diagnostics::{DiagnosticsSnapshot, ScopeDiagnostics};

use worker::ScopeWorker;

/// Receives every report of a scope, in tick order
pub type ReportCallback = Arc<dyn Fn(LiveCoverageReport) + Send + Sync>;

/// What a scope is monitored against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeSpec {
    pub scope_id: ScopeId,
    pub required: Vec<RequiredStaffing>,
    pub cost: CostConfig,
}

/// Report handed to the callback on every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveCoverageReport {
    pub scope_id: ScopeId,
    /// 1-based tick counter of the scope
    pub tick: u64,
    pub generated_at: DateTime<Utc>,
    /// Snapshot used for the gaps; the last good one on stale ticks
    pub snapshot: Option<LiveQueueSnapshot>,
    pub gaps: Vec<CoverageGap>,
    pub alert: Option<CoverageAlert>,
    pub consecutive_breaches: u32,
    pub stale: bool,
}

/// Scheduling state of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeState {
    /// Waiting for the next tick
    Idle,
    /// A tick's analysis is in flight
    Running,
    /// Cancellation acknowledged and the scope task has ended
    Stopped,
}

/// State shared between a scope's task and its handles
#[derive(Debug)]
struct ScopeShared {
    state: RwLock<ScopeState>,
    diagnostics: Arc<ScopeDiagnostics>,
}

impl ScopeShared {
    fn set_state(&self, state: ScopeState) {
        *self.state.write() = state;
    }

    fn state(&self) -> ScopeState {
        *self.state.read()
    }
}

/// Handle returned by [`RealTimeMonitor::start`]
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    scope_id: ScopeId,
    handle_id: Uuid,
    shared: Arc<ScopeShared>,
}

impl MonitorHandle {
    pub fn scope_id(&self) -> &ScopeId {
        &self.scope_id
    }

    pub fn handle_id(&self) -> Uuid {
        self.handle_id
    }

    /// Current state, still readable after the scope was stopped
    pub fn state(&self) -> ScopeState {
        self.shared.state()
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.shared.diagnostics.snapshot()
    }
}

struct ScopeEntry {
    handle_id: Uuid,
    token: CancellationToken,
    shared: Arc<ScopeShared>,
    task: JoinHandle<()>,
}

/// Schedules live coverage analysis for any number of independent scopes
pub struct RealTimeMonitor {
    config: MonitorConfig,
    analyzer: CoverageGapAnalyzer,
    metrics: Arc<dyn LiveMetricsProvider>,
    scopes: DashMap<ScopeId, ScopeEntry>,
}

impl RealTimeMonitor {
    pub fn new(config: MonitorConfig, analyzer: CoverageGapAnalyzer, metrics: Arc<dyn LiveMetricsProvider>) -> Self {
        Self {
            config,
            analyzer,
            metrics,
            scopes: DashMap::new(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Begin monitoring a scope
    ///
    /// The first tick fires immediately. Must be called from within a Tokio
    /// runtime.
    pub fn start(&self, spec: ScopeSpec, interval: Duration, callback: ReportCallback) -> Result<MonitorHandle> {
        if interval.is_zero() {
            return Err(StaffingError::validation(format!(
                "monitoring interval for scope {} must be positive",
                spec.scope_id
            )));
        }
        spec.cost.validate()?;
        for row in &spec.required {
            row.interval.validate()?;
        }

        let scope_id = spec.scope_id.clone();
        let vacant = match self.scopes.entry(scope_id.clone()) {
            Entry::Occupied(_) => return Err(StaffingError::AlreadyMonitoring { scope_id }),
            Entry::Vacant(vacant) => vacant,
        };

        let diagnostics = Arc::new(ScopeDiagnostics::default());
        let shared = Arc::new(ScopeShared {
            state: RwLock::new(ScopeState::Idle),
            diagnostics: diagnostics.clone(),
        });
        let worker = ScopeWorker::new(
            spec,
            self.config.clone(),
            self.analyzer.clone(),
            self.metrics.clone(),
            diagnostics,
        );
        let token = CancellationToken::new();
        let handle_id = Uuid::new_v4();

        let task = tokio::spawn(run_scope(
            scope_id.clone(),
            interval,
            Arc::new(Mutex::new(worker)),
            shared.clone(),
            token.clone(),
            callback,
        ));

        vacant.insert(ScopeEntry {
            handle_id,
            token,
            shared: shared.clone(),
            task,
        });
        info!("👀 Started monitoring scope {} every {:?}", scope_id, interval);

        Ok(MonitorHandle {
            scope_id,
            handle_id,
            shared,
        })
    }

    /// Stop a scope and wait until its in-flight tick, if any, has finished
    pub async fn stop(&self, handle: &MonitorHandle) -> Result<()> {
        let (_, entry) = self
            .scopes
            .remove_if(&handle.scope_id, |_, entry| entry.handle_id == handle.handle_id)
            .ok_or_else(|| StaffingError::ScopeNotFound {
                scope_id: handle.scope_id.clone(),
            })?;
        self.shutdown_entry(&handle.scope_id, entry).await
    }

    /// Stop every scope
    pub async fn stop_all(&self) -> Result<()> {
        let scope_ids: Vec<ScopeId> = self.scopes.iter().map(|e| e.key().clone()).collect();
        for scope_id in scope_ids {
            if let Some((_, entry)) = self.scopes.remove(&scope_id) {
                self.shutdown_entry(&scope_id, entry).await?;
            }
        }
        Ok(())
    }

    pub fn state(&self, scope_id: &ScopeId) -> Option<ScopeState> {
        self.scopes.get(scope_id).map(|entry| entry.shared.state())
    }

    pub fn diagnostics(&self, scope_id: &ScopeId) -> Option<DiagnosticsSnapshot> {
        self.scopes
            .get(scope_id)
            .map(|entry| entry.shared.diagnostics.snapshot())
    }

    pub fn active_scopes(&self) -> Vec<ScopeId> {
        let mut scopes: Vec<ScopeId> = self.scopes.iter().map(|e| e.key().clone()).collect();
        scopes.sort();
        scopes
    }

    async fn shutdown_entry(&self, scope_id: &ScopeId, entry: ScopeEntry) -> Result<()> {
        info!("🛑 Stopping monitoring for scope {}", scope_id);
        entry.token.cancel();
        if let Err(e) = entry.task.await {
            error!("Monitor task for scope {} ended abnormally: {}", scope_id, e);
            entry.shared.set_state(ScopeState::Stopped);
            return Err(StaffingError::internal(format!(
                "monitor task for scope {} failed: {}",
                scope_id, e
            )));
        }
        info!("✅ Monitoring stopped for scope {}", scope_id);
        Ok(())
    }
}

impl Drop for RealTimeMonitor {
    fn drop(&mut self) {
        for entry in self.scopes.iter() {
            entry.token.cancel();
        }
    }
}

/// Scheduling loop of one scope
async fn run_scope(
    scope_id: ScopeId,
    period: Duration,
    worker: Arc<Mutex<ScopeWorker>>,
    shared: Arc<ScopeShared>,
    token: CancellationToken,
    callback: ReportCallback,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                match worker.clone().try_lock_owned() {
                    Ok(mut guard) => {
                        shared.diagnostics.tick_started();
                        shared.set_state(ScopeState::Running);
                        let shared = shared.clone();
                        let callback = callback.clone();
                        let scope_id = scope_id.clone();
                        tokio::spawn(async move {
                            let report = guard.run_tick().await;
                            let tick = report.tick;
                            shared.diagnostics.tick_completed();
                            shared.set_state(ScopeState::Idle);
                            // The guard is held until the callback returns so stop still waits for it
                            if panic::catch_unwind(AssertUnwindSafe(|| callback(report))).is_err() {
                                warn!("⚠️ Scope {} tick {}: report callback panicked", scope_id, tick);
                            }
                            drop(guard);
                        });
                    }
                    Err(_) => {
                        shared.diagnostics.tick_skipped();
                        warn!("⏭️ Scope {} tick skipped, previous analysis still running", scope_id);
                    }
                }
            }
        }
    }

    // Wait for the in-flight tick before acknowledging the stop
    let _guard = worker.lock().await;
    shared.set_state(ScopeState::Stopped);
    debug!("Scope {} loop finished", scope_id);
}
