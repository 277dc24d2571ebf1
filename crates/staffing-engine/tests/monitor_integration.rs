//! Real-time monitor behavior under paused Tokio time

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use rvoip_staffing_engine::config::MonitorConfig;
use rvoip_staffing_engine::coverage::CoverageGapAnalyzer;
use rvoip_staffing_engine::error::{Result, StaffingError};
use rvoip_staffing_engine::monitor::{LiveCoverageReport, RealTimeMonitor, ReportCallback, ScopeSpec, ScopeState};
use rvoip_staffing_engine::providers::LiveMetricsProvider;
use rvoip_staffing_engine::types::{CostConfig, IntervalWindow, LiveQueueSnapshot, RequiredStaffing, ScopeId};

#[derive(Debug, Clone, Copy)]
enum Step {
    Level(f64),
    /// Snapshot labelled with another scope
    Foreign(f64),
    Fail,
}

/// Live feed that replays a fixed script, then repeats its fallback level
struct ScriptedMetrics {
    steps: Mutex<VecDeque<Step>>,
    fallback: f64,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedMetrics {
    fn new(steps: Vec<Step>, fallback: f64) -> Arc<Self> {
        Self::with_delay(steps, fallback, Duration::ZERO)
    }

    fn with_delay(steps: Vec<Step>, fallback: f64, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            fallback,
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LiveMetricsProvider for ScriptedMetrics {
    async fn get_snapshot(&self, scope: &ScopeId) -> Result<LiveQueueSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let step = self.steps.lock().pop_front().unwrap_or(Step::Level(self.fallback));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match step {
            Step::Level(level) => Ok(LiveQueueSnapshot {
                scope_id: scope.clone(),
                timestamp: Utc.with_ymd_and_hms(2024, 5, 6, 9, 15, 0).unwrap(),
                calls_waiting: 8,
                agents_available: 5,
                current_service_level: level,
            }),
            Step::Foreign(level) => Ok(LiveQueueSnapshot {
                scope_id: ScopeId::new("elsewhere"),
                timestamp: Utc.with_ymd_and_hms(2024, 5, 6, 9, 15, 0).unwrap(),
                calls_waiting: 30,
                agents_available: 1,
                current_service_level: level,
            }),
            Step::Fail => Err(StaffingError::data_unavailable("live metrics", scope.as_str(), "feed timeout")),
        }
    }
}

fn spec(scope: &str) -> ScopeSpec {
    ScopeSpec {
        scope_id: scope.into(),
        required: vec![RequiredStaffing {
            interval: IntervalWindow::new(
                Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap(),
            )
            .unwrap(),
            skill_id: "billing".into(),
            required_count: 8,
        }],
        cost: CostConfig::default(),
    }
}

fn config(max_fetch_retries: u32) -> MonitorConfig {
    MonitorConfig {
        max_fetch_retries,
        retry_backoff_ms: 100,
        max_backoff_ms: 1000,
        ..MonitorConfig::default()
    }
}

fn channel() -> (ReportCallback, mpsc::UnboundedReceiver<LiveCoverageReport>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: ReportCallback = Arc::new(move |report| {
        let _ = tx.send(report);
    });
    (callback, rx)
}

async fn collect(rx: &mut mpsc::UnboundedReceiver<LiveCoverageReport>, n: usize) -> Vec<LiveCoverageReport> {
    let mut reports = Vec::with_capacity(n);
    for _ in 0..n {
        reports.push(rx.recv().await.expect("monitor dropped the callback"));
    }
    reports
}

#[tokio::test(start_paused = true)]
async fn test_single_alert_on_third_breaching_tick() {
    let metrics = ScriptedMetrics::new(Vec::new(), 0.6);
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics);
    let (callback, mut rx) = channel();

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    let reports = collect(&mut rx, 6).await;
    monitor.stop(&handle).await.unwrap();

    let alert_ticks: Vec<u64> = reports.iter().filter(|r| r.alert.is_some()).map(|r| r.tick).collect();
    assert_eq!(alert_ticks, vec![3]);
    assert_eq!(reports[2].consecutive_breaches, 3);
    assert_eq!(reports[5].consecutive_breaches, 6);
    assert!(reports.iter().all(|r| !r.stale));
    assert_eq!(handle.diagnostics().alerts_raised, 1);
}

#[tokio::test(start_paused = true)]
async fn test_alert_rearms_after_breach_clears() {
    use Step::Level;
    let metrics = ScriptedMetrics::new(
        vec![Level(0.6), Level(0.6), Level(0.6), Level(0.6), Level(0.9), Level(0.6), Level(0.6)],
        0.6,
    );
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics);
    let (callback, mut rx) = channel();

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    let reports = collect(&mut rx, 10).await;
    monitor.stop(&handle).await.unwrap();

    let alert_ticks: Vec<u64> = reports.iter().filter(|r| r.alert.is_some()).map(|r| r.tick).collect();
    assert_eq!(alert_ticks, vec![3, 8]);
    assert_eq!(reports[4].consecutive_breaches, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_ticks_report_stale_with_last_good_data() {
    use Step::{Fail, Level};
    // One retry per tick: each failed tick consumes two failures
    let metrics = ScriptedMetrics::new(vec![Level(0.9), Fail, Fail, Fail, Fail, Level(0.95)], 0.95);
    let monitor = RealTimeMonitor::new(config(1), CoverageGapAnalyzer::default(), metrics.clone());
    let (callback, mut rx) = channel();

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    let reports = collect(&mut rx, 4).await;
    monitor.stop(&handle).await.unwrap();

    let stale: Vec<bool> = reports.iter().map(|r| r.stale).collect();
    assert_eq!(stale, vec![false, true, true, false]);

    let good = &reports[0];
    for report in &reports[1..3] {
        assert_eq!(report.snapshot, good.snapshot);
        assert_eq!(report.gaps, good.gaps);
    }
    let fresh = reports[3].snapshot.as_ref().unwrap();
    assert_eq!(fresh.current_service_level, 0.95);

    let diagnostics = handle.diagnostics();
    assert_eq!(diagnostics.fetch_failures, 4);
    assert_eq!(diagnostics.stale_reports, 2);
    assert_eq!(metrics.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn test_stale_before_any_good_tick_has_no_gaps() {
    let metrics = ScriptedMetrics::new(vec![Step::Fail], 0.9);
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics);
    let (callback, mut rx) = channel();

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    let reports = collect(&mut rx, 2).await;
    monitor.stop(&handle).await.unwrap();

    assert!(reports[0].stale);
    assert!(reports[0].snapshot.is_none());
    assert!(reports[0].gaps.is_empty());
    assert!(!reports[1].stale);
    assert_eq!(reports[1].gaps.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_ticks_do_not_advance_breach_count() {
    use Step::{Fail, Level};
    let metrics = ScriptedMetrics::new(vec![Level(0.6), Level(0.6), Fail, Level(0.6)], 0.9);
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics);
    let (callback, mut rx) = channel();

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    let reports = collect(&mut rx, 4).await;
    monitor.stop(&handle).await.unwrap();

    let counts: Vec<u32> = reports.iter().map(|r| r.consecutive_breaches).collect();
    assert_eq!(counts, vec![1, 2, 2, 3]);
    assert!(reports[2].alert.is_none());
    assert!(reports[3].alert.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_for_other_scope_is_rejected() {
    use Step::{Foreign, Level};
    let metrics = ScriptedMetrics::new(vec![Level(0.6), Foreign(0.1), Level(0.6), Level(0.6)], 0.9);
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics);
    let (callback, mut rx) = channel();

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    let reports = collect(&mut rx, 4).await;
    monitor.stop(&handle).await.unwrap();

    let stale: Vec<bool> = reports.iter().map(|r| r.stale).collect();
    assert_eq!(stale, vec![false, true, false, false]);
    assert_eq!(reports[1].snapshot, reports[0].snapshot);
    let counts: Vec<u32> = reports.iter().map(|r| r.consecutive_breaches).collect();
    assert_eq!(counts, vec![1, 1, 2, 3]);
    assert!(reports[3].alert.is_some());
    assert_eq!(handle.diagnostics().stale_reports, 1);
    assert_eq!(handle.diagnostics().fetch_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_analysis_skips_ticks() {
    let metrics = ScriptedMetrics::with_delay(Vec::new(), 0.9, Duration::from_secs(75));
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics.clone());
    let (callback, mut rx) = channel();

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    let reports = collect(&mut rx, 2).await;
    monitor.stop(&handle).await.unwrap();

    let ticks: Vec<u64> = reports.iter().map(|r| r.tick).collect();
    assert_eq!(ticks, vec![1, 2]);
    assert_eq!(metrics.max_in_flight.load(Ordering::SeqCst), 1);
    assert!(handle.diagnostics().ticks_skipped >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_waits_for_in_flight_tick() {
    let metrics = ScriptedMetrics::with_delay(Vec::new(), 0.9, Duration::from_secs(60));
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics.clone());
    let (callback, mut rx) = channel();
    let scope = ScopeId::new("support");

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(monitor.state(&scope), Some(ScopeState::Running));

    monitor.stop(&handle).await.unwrap();
    assert_eq!(handle.state(), ScopeState::Stopped);
    let report = rx.try_recv().expect("in-flight tick delivered its report");
    assert_eq!(report.tick, 1);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(metrics.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_callback_does_not_wedge_scope() {
    let metrics = ScriptedMetrics::new(Vec::new(), 0.9);
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let panicked = Arc::new(AtomicBool::new(false));
    let first_call = panicked.clone();
    let callback: ReportCallback = Arc::new(move |report: LiveCoverageReport| {
        if !first_call.swap(true, Ordering::SeqCst) {
            panic!("subscriber failed on tick {}", report.tick);
        }
        let _ = tx.send(report);
    });

    let handle = monitor.start(spec("support"), Duration::from_secs(30), callback).unwrap();
    let reports = collect(&mut rx, 2).await;
    assert!(panicked.load(Ordering::SeqCst));
    assert_eq!(reports[0].tick, 2);
    assert_eq!(reports[1].tick, 3);
    assert_eq!(handle.diagnostics().ticks_completed, 3);
    assert_eq!(handle.diagnostics().ticks_skipped, 0);

    monitor.stop(&handle).await.unwrap();
    assert_eq!(handle.state(), ScopeState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stopping_one_scope_leaves_others_running() {
    let metrics = ScriptedMetrics::new(Vec::new(), 0.9);
    let monitor = RealTimeMonitor::new(config(0), CoverageGapAnalyzer::default(), metrics);
    let (first_cb, mut first_rx) = channel();
    let (second_cb, mut second_rx) = channel();

    let first = monitor.start(spec("billing"), Duration::from_secs(30), first_cb).unwrap();
    let second = monitor.start(spec("sales"), Duration::from_secs(20), second_cb).unwrap();

    collect(&mut first_rx, 1).await;
    monitor.stop(&first).await.unwrap();
    assert_eq!(monitor.active_scopes(), vec![ScopeId::new("sales")]);

    let reports = collect(&mut second_rx, 3).await;
    assert!(reports.iter().all(|r| r.scope_id == ScopeId::new("sales")));
    assert!(monitor.state(second.scope_id()).is_some());

    monitor.stop_all().await.unwrap();
    assert_eq!(second.state(), ScopeState::Stopped);
    assert!(monitor.active_scopes().is_empty());
}
