//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use caplife_domain::ArtifactClass;
use caplife_janitor::{ClassPolicy, HealthReport};
use caplife_migrate::{CleanupReport, MigrationReport};
use caplife_store::ClassOccupancy;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Occupancy of one class together with its configured policy.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassStatus {
    /// Class name
    pub class: String,
    /// Files in hot
    pub hot: usize,
    /// Configured hot capacity
    pub hot_capacity: usize,
    /// Files across all cold buckets
    pub cold: usize,
    /// Non-empty cold buckets
    pub buckets_in_use: usize,
    /// Configured retention in minutes
    pub cold_retention_minutes: u64,
}

impl ClassStatus {
    /// Combine an occupancy count with the class's policy.
    pub fn new(class: ArtifactClass, occupancy: &ClassOccupancy, policy: ClassPolicy) -> Self {
        Self {
            class: class.to_string(),
            hot: occupancy.hot,
            hot_capacity: policy.hot_capacity,
            cold: occupancy.cold_total(),
            buckets_in_use: occupancy.cold.iter().filter(|&&n| n > 0).count(),
            cold_retention_minutes: policy.cold_retention_minutes,
        }
    }
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a migration report.
    pub fn migration_report(&self, report: &MigrationReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut builder = Builder::default();
        builder.push_record([
            "Class", "Before (flat/hot/cold)", "To hot", "To cold", "Failed", "After (flat/hot/cold)",
        ]);
        for class in &report.classes {
            builder.push_record([
                class.class.to_string(),
                format!("{}/{}/{}", class.before.flat, class.before.hot, class.before.cold),
                class.to_hot.to_string(),
                class.to_cold.to_string(),
                class.failed.to_string(),
                format!("{}/{}/{}", class.after.flat, class.after.hot, class.after.cold),
            ]);
        }
        let mut out = self.table(builder);

        if report.dry_run {
            for class in report.classes.iter().filter(|c| !c.buckets.is_empty()) {
                let buckets: Vec<String> = class
                    .buckets
                    .iter()
                    .map(|(hour, count)| format!("{} file(s) -> cold/{}", count, hour))
                    .collect();
                out.push_str(&format!("\n{}: {}", class.class, buckets.join(", ")));
            }
        }
        if report.unclassified > 0 {
            out.push('\n');
            out.push_str(&self.warning(&format!(
                "{} unclassified file(s) left in place",
                report.unclassified
            )));
        }
        Ok(out)
    }

    /// Format a cleanup report.
    pub fn cleanup_report(&self, report: &CleanupReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }
        if report.directories.is_empty() {
            return Ok(self.colorize("No legacy files found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Directory", "Matched", "Removed", "Status"]);
        for dir in &report.directories {
            let status = match &dir.error {
                Some(e) => self.colorize(&format!("failed: {}", e), "red"),
                None => self.colorize("ok", "green"),
            };
            builder.push_record([
                dir.path.display().to_string(),
                dir.matched.to_string(),
                dir.removed.to_string(),
                status,
            ]);
        }
        Ok(self.table(builder))
    }

    /// Format per-class occupancy and, if known, the janitor's health.
    pub fn status(&self, classes: &[ClassStatus], health: Option<&HealthReport>) -> Result<String> {
        if self.format == OutputFormat::Json {
            let value = serde_json::json!({
                "classes": classes,
                "health": health,
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Class", "Hot", "Capacity", "Cold", "Buckets", "Retention"]);
        for status in classes {
            let hot = format!("{}", status.hot);
            let hot = if status.hot > status.hot_capacity {
                self.colorize(&hot, "yellow")
            } else {
                hot
            };
            builder.push_record([
                status.class.clone(),
                hot,
                status.hot_capacity.to_string(),
                status.cold.to_string(),
                format!("{}/24", status.buckets_in_use),
                format!("{}m", status.cold_retention_minutes),
            ]);
        }
        let mut out = self.table(builder);

        if let Some(health) = health {
            let state = format!("{:?}", health.state).to_lowercase();
            let line = format!("Janitor health: {} ({} error(s) recorded)", state, health.total_errors);
            out.push('\n');
            out.push_str(&if health.is_ready() {
                self.success(&line)
            } else {
                self.warning(&line)
            });
            for alert in health.archive_alerts.iter().chain(&health.sweep_alerts) {
                out.push('\n');
                out.push_str(&self.error(&format!("{} {}: {}", alert.task, alert.class, alert.message)));
            }
        }
        Ok(out)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
