//! Health and readiness signals for an external supervisor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Overall service state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// No archive pass has completed yet
    Starting,
    /// Most recent passes completed without alerts
    Ready,
    /// At least one class pass was aborted in the most recent cycle
    Degraded,
}

/// A class pass that could not run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Affected class
    pub class: String,
    /// "archive" or "sweep"
    pub task: String,
    /// Error message
    pub message: String,
    /// When the alert was raised
    pub at: DateTime<Utc>,
}

/// Snapshot of janitor health, published after every pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall state
    pub state: HealthState,
    /// Completion time of the last archive cycle
    pub last_archive: Option<DateTime<Utc>>,
    /// Completion time of the last sweep cycle
    pub last_sweep: Option<DateTime<Utc>>,
    /// Alerts from the last archive cycle
    pub archive_alerts: Vec<Alert>,
    /// Alerts from the last sweep cycle
    pub sweep_alerts: Vec<Alert>,
    /// Aggregated error/skip count since start
    pub total_errors: usize,
}

impl Default for HealthReport {
    fn default() -> Self {
        Self {
            state: HealthState::Starting,
            last_archive: None,
            last_sweep: None,
            archive_alerts: Vec::new(),
            sweep_alerts: Vec::new(),
            total_errors: 0,
        }
    }
}

impl HealthReport {
    /// Recompute `state` from the recorded cycles
    pub fn refresh_state(&mut self) {
        self.state = if !self.archive_alerts.is_empty() || !self.sweep_alerts.is_empty() {
            HealthState::Degraded
        } else if self.last_archive.is_some() {
            HealthState::Ready
        } else {
            HealthState::Starting
        };
    }

    /// Ready for traffic: archiving has run and nothing is alerting
    pub fn is_ready(&self) -> bool {
        self.state == HealthState::Ready
    }

    /// Write the report as JSON, replacing the file atomically
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> Alert {
        Alert {
            class: "segment".into(),
            task: "archive".into(),
            message: "missing".into(),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut report = HealthReport::default();
        report.refresh_state();
        assert_eq!(report.state, HealthState::Starting);

        report.last_archive = Some(Utc::now());
        report.refresh_state();
        assert!(report.is_ready());

        report.sweep_alerts.push(alert());
        report.refresh_state();
        assert_eq!(report.state, HealthState::Degraded);
    }

    #[test]
    fn test_write_to_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("health.json");
        let mut report = HealthReport::default();
        report.archive_alerts.push(alert());
        report.refresh_state();
        report.write_to(&path).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["state"], "degraded");
        assert_eq!(value["archive_alerts"][0]["class"], "segment");

        let parsed: HealthReport = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report);
    }
}
