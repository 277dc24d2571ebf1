//! Configuration for the staffing engine
//!
//! All sections deserialize from TOML with per-field defaults, so a config
//! file only needs to name the values it overrides:
//!
//! ```toml
//! [queueing]
//! max_occupancy = 0.9
//!
//! [coverage.thresholds]
//! critical = 0.25
//!
//! [monitor]
//! consecutive_breach_threshold = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StaffingError};
use crate::logging::LoggingConfig;
use crate::types::Severity;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffingConfig {
    pub queueing: QueueingConfig,
    pub coverage: CoverageConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

/// Queue sizing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueingConfig {
    /// Upper bound on the fraction of staffed time spent handling contacts
    pub max_occupancy: f64,
    /// Hard ceiling for the staff search
    pub max_staff: u32,
}

impl Default for QueueingConfig {
    fn default() -> Self {
        Self {
            max_occupancy: 0.85,
            max_staff: 5000,
        }
    }
}

/// Gap-ratio thresholds (gap / required) for each severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical: 0.30,
            high: 0.15,
            medium: 0.05,
        }
    }
}

impl SeverityThresholds {
    pub fn classify(&self, gap_ratio: f64) -> Severity {
        if gap_ratio >= self.critical {
            Severity::Critical
        } else if gap_ratio >= self.high {
            Severity::High
        } else if gap_ratio >= self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Coverage analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    pub thresholds: SeverityThresholds,
    /// Shortfalls at or above this severity are priced at the overtime rate
    pub overtime_from_severity: Severity,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            thresholds: SeverityThresholds::default(),
            overtime_from_severity: Severity::High,
        }
    }
}

/// Real-time monitoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Tick interval used when the caller does not pass one
    pub default_interval_seconds: u64,
    /// Retries of a failed live snapshot fetch within one tick
    pub max_fetch_retries: u32,
    /// Delay before the first retry; doubles on every further retry
    pub retry_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Consecutive breaching ticks before an alert is raised
    pub consecutive_breach_threshold: u32,
    /// A tick breaches when the live service level is below this value
    pub service_level_threshold: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            default_interval_seconds: 30,
            max_fetch_retries: 3,
            retry_backoff_ms: 500,
            max_backoff_ms: 5_000,
            consecutive_breach_threshold: 3,
            service_level_threshold: 0.8,
        }
    }
}

impl MonitorConfig {
    /// Backoff before retry number `attempt` (0-based)
    pub fn backoff_for(&self, attempt: u32) -> std::time::Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.retry_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        std::time::Duration::from_millis(delay)
    }
}

impl StaffingConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        let q = &self.queueing;
        if !(q.max_occupancy > 0.0 && q.max_occupancy <= 1.0) {
            return Err(StaffingError::config(format!(
                "queueing.max_occupancy must be in (0, 1], got {}",
                q.max_occupancy
            )));
        }
        if q.max_staff == 0 {
            return Err(StaffingError::config("queueing.max_staff must be positive"));
        }

        let t = &self.coverage.thresholds;
        if !(0.0 < t.medium && t.medium <= t.high && t.high <= t.critical && t.critical <= 1.0) {
            return Err(StaffingError::config(format!(
                "coverage thresholds must satisfy 0 < medium <= high <= critical <= 1, got {}/{}/{}",
                t.medium, t.high, t.critical
            )));
        }

        let m = &self.monitor;
        if m.default_interval_seconds == 0 {
            return Err(StaffingError::config("monitor.default_interval_seconds must be positive"));
        }
        if m.consecutive_breach_threshold == 0 {
            return Err(StaffingError::config(
                "monitor.consecutive_breach_threshold must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&m.service_level_threshold) {
            return Err(StaffingError::config(format!(
                "monitor.service_level_threshold must be in [0, 1], got {}",
                m.service_level_threshold
            )));
        }
        if m.max_backoff_ms < m.retry_backoff_ms {
            return Err(StaffingError::config(
                "monitor.max_backoff_ms must not be smaller than monitor.retry_backoff_ms",
            ));
        }

        self.logging.level()?;
        Ok(())
    }
}
