//! Configuration for Janitor operations
//!
//! Defines per-class hot capacities and cold retentions, task intervals and
//! operational modes.

use crate::JanitorError;
use caplife_domain::{ArtifactClass, BucketClock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bucket identity is an hour of day, so nothing can be retained longer than a day.
const MAX_RETENTION_MINUTES: u64 = 24 * 60;

/// Past this, yesterday's content is still live when its hour is reused.
const BUCKET_REUSE_MINUTES: u64 = 23 * 60;

/// Lifecycle policy of one artifact class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPolicy {
    /// Maximum number of files kept in the hot directory
    pub hot_capacity: usize,

    /// Age of a bucket's newest member after which the bucket is purged (minutes)
    pub cold_retention_minutes: u64,
}

impl ClassPolicy {
    /// Built-in policy for a class
    pub fn default_for(class: ArtifactClass) -> Self {
        Self {
            hot_capacity: class.default_hot_capacity(),
            cold_retention_minutes: class.default_cold_retention().as_secs() / 60,
        }
    }

    /// Cold retention as Duration
    pub fn cold_retention(&self) -> Duration {
        Duration::from_secs(self.cold_retention_minutes * 60)
    }
}

/// Wall clock used to name cold buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketClockSetting {
    /// UTC hours
    Utc,
    /// Host local hours
    #[default]
    Local,
}

impl From<BucketClockSetting> for BucketClock {
    fn from(setting: BucketClockSetting) -> Self {
        match setting {
            BucketClockSetting::Utc => BucketClock::Utc,
            BucketClockSetting::Local => BucketClock::Local,
        }
    }
}

/// What the sweeper does with a bucket holding more than one day's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Log and count only
    Flag,
    /// Log, count, and delete the members that are individually past retention
    #[default]
    PurgeExpired,
}

/// Configuration for the Janitor service
///
/// # Examples
///
/// ```
/// use caplife_janitor::JanitorConfig;
/// use caplife_domain::ArtifactClass;
///
/// let config = JanitorConfig::default();
/// assert_eq!(config.policy(ArtifactClass::Segment).hot_capacity, 10);
/// assert!(config.validate().is_ok());
///
/// let config = JanitorConfig::compact();
/// assert!(config.policy(ArtifactClass::Segment).hot_capacity < 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Capture root holding one directory per class
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Wall clock for bucket hours
    #[serde(default)]
    pub bucket_clock: BucketClockSetting,

    /// How often the archiver runs (seconds)
    /// Default: 10 seconds
    #[serde(default = "default_archive_interval_secs")]
    pub archive_interval_secs: u64,

    /// How often the retention sweeper runs (minutes)
    /// Default: every 60 minutes
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,

    /// Upper bound on any single filesystem call (milliseconds)
    /// Default: 5000
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// Dry-run mode: log what would be moved or deleted without touching anything
    #[serde(default)]
    pub dry_run: bool,

    /// Handling of buckets that mix two days of content
    #[serde(default)]
    pub collision_policy: CollisionPolicy,

    /// Per-class policies keyed by class name (`segments`, `captures`, ...)
    #[serde(default = "default_classes")]
    pub classes: BTreeMap<String, ClassPolicy>,
}

fn default_root() -> PathBuf {
    PathBuf::from("captures")
}

fn default_archive_interval_secs() -> u64 {
    10
}

fn default_sweep_interval_minutes() -> u64 {
    60
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

fn default_classes() -> BTreeMap<String, ClassPolicy> {
    ArtifactClass::ALL
        .into_iter()
        .map(|class| (class.dir_name().to_string(), ClassPolicy::default_for(class)))
        .collect()
}

fn classes_with(policies: [(ArtifactClass, usize, u64); 4]) -> BTreeMap<String, ClassPolicy> {
    policies
        .into_iter()
        .map(|(class, hot_capacity, cold_retention_minutes)| {
            (
                class.dir_name().to_string(),
                ClassPolicy {
                    hot_capacity,
                    cold_retention_minutes,
                },
            )
        })
        .collect()
}

impl Default for JanitorConfig {
    /// Create default configuration
    ///
    /// - Segments: 10 hot, 24h cold
    /// - Captures: 100 hot, 1h cold
    /// - Thumbnails / metadata: 100 hot, 24h cold
    /// - Archive every 10s, sweep hourly
    fn default() -> Self {
        Self {
            root: default_root(),
            bucket_clock: BucketClockSetting::default(),
            archive_interval_secs: default_archive_interval_secs(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
            operation_timeout_ms: default_operation_timeout_ms(),
            dry_run: false,
            collision_policy: CollisionPolicy::default(),
            classes: default_classes(),
        }
    }
}

impl JanitorConfig {
    /// Compact configuration (small hot windows, short retention, frequent sweeps)
    ///
    /// Suitable for devices with little disk.
    ///
    /// - Segments: 6 hot, 6h cold
    /// - Captures: 30 hot, 30 minutes cold
    /// - Thumbnails / metadata: 30 hot, 6h cold
    /// - Archive every 5s, sweep every 15 minutes
    pub fn compact() -> Self {
        Self {
            archive_interval_secs: 5,
            sweep_interval_minutes: 15,
            classes: classes_with([
                (ArtifactClass::Segment, 6, 6 * 60),
                (ArtifactClass::Capture, 30, 30),
                (ArtifactClass::Thumbnail, 30, 6 * 60),
                (ArtifactClass::Metadata, 30, 6 * 60),
            ]),
            ..Self::default()
        }
    }

    /// Extended configuration (large hot windows, longest retention)
    ///
    /// - Segments: 30 hot, 24h cold
    /// - Captures: 300 hot, 6h cold
    /// - Thumbnails / metadata: 300 hot, 24h cold
    pub fn extended() -> Self {
        Self {
            classes: classes_with([
                (ArtifactClass::Segment, 30, 24 * 60),
                (ArtifactClass::Capture, 300, 6 * 60),
                (ArtifactClass::Thumbnail, 300, 24 * 60),
                (ArtifactClass::Metadata, 300, 24 * 60),
            ]),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, JanitorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| JanitorError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml(contents: &str) -> Result<Self, JanitorError> {
        let config: JanitorConfig =
            toml::from_str(contents).map_err(|e| JanitorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Policy for a class, falling back to the built-in default
    pub fn policy(&self, class: ArtifactClass) -> ClassPolicy {
        self.classes
            .get(class.dir_name())
            .or_else(|| self.classes.get(class.as_str()))
            .copied()
            .unwrap_or_else(|| ClassPolicy::default_for(class))
    }

    /// Override one class's policy
    pub fn set_policy(&mut self, class: ArtifactClass, policy: ClassPolicy) {
        self.classes.remove(class.as_str());
        self.classes.insert(class.dir_name().to_string(), policy);
    }

    /// Check every value before any scheduled work starts
    pub fn validate(&self) -> Result<(), JanitorError> {
        for name in self.classes.keys() {
            if ArtifactClass::parse(name).is_none() {
                return Err(JanitorError::Config(format!("Unknown artifact class '{}'", name)));
            }
        }
        if self.archive_interval_secs == 0 {
            return Err(JanitorError::Config("archive_interval_secs must be positive".into()));
        }
        if self.sweep_interval_minutes == 0 {
            return Err(JanitorError::Config("sweep_interval_minutes must be positive".into()));
        }
        if self.operation_timeout_ms == 0 {
            return Err(JanitorError::Config("operation_timeout_ms must be positive".into()));
        }

        for class in ArtifactClass::ALL {
            let policy = self.policy(class);
            if policy.hot_capacity == 0 {
                return Err(JanitorError::Config(format!("{}: hot_capacity must be at least 1", class)));
            }
            if policy.cold_retention_minutes == 0 || policy.cold_retention_minutes > MAX_RETENTION_MINUTES {
                return Err(JanitorError::Config(format!(
                    "{}: cold_retention_minutes must be within 1..={}",
                    class, MAX_RETENTION_MINUTES
                )));
            }
            // A bucket must be swept at least once per retention window or its
            // stale content outlives the retention promise.
            if self.sweep_interval_minutes > policy.cold_retention_minutes {
                return Err(JanitorError::Config(format!(
                    "{}: sweep interval ({} min) exceeds cold retention ({} min)",
                    class, self.sweep_interval_minutes, policy.cold_retention_minutes
                )));
            }
        }

        let reused = self.classes_reusing_buckets();
        if !reused.is_empty() {
            let classes: Vec<&str> = reused.iter().map(|class| class.as_str()).collect();
            // Under purge_expired a reused bucket still drains member by member.
            if self.collision_policy == CollisionPolicy::Flag {
                tracing::warn!(
                    classes = ?classes,
                    "Cold buckets will be reused before their content expires and only flagged"
                );
            } else {
                tracing::debug!(classes = ?classes, "Cold buckets will be reused before their content expires");
            }
        }
        Ok(())
    }

    /// Classes whose retention plus sweep delay outlasts a bucket's hour coming round again
    pub fn classes_reusing_buckets(&self) -> Vec<ArtifactClass> {
        ArtifactClass::ALL
            .into_iter()
            .filter(|&class| {
                self.policy(class).cold_retention_minutes + self.sweep_interval_minutes > BUCKET_REUSE_MINUTES
            })
            .collect()
    }

    /// Get archive interval as Duration
    pub fn archive_interval(&self) -> Duration {
        Duration::from_secs(self.archive_interval_secs)
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }

    /// Get per-operation timeout as Duration
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JanitorConfig::default();
        assert_eq!(config.policy(ArtifactClass::Segment).hot_capacity, 10);
        assert_eq!(config.policy(ArtifactClass::Capture).hot_capacity, 100);
        assert_eq!(config.policy(ArtifactClass::Capture).cold_retention_minutes, 60);
        assert_eq!(config.policy(ArtifactClass::Metadata).cold_retention_minutes, 24 * 60);
        assert_eq!(config.archive_interval_secs, 10);
        assert_eq!(config.sweep_interval_minutes, 60);
        assert!(!config.dry_run);
        assert_eq!(config.collision_policy, CollisionPolicy::PurgeExpired);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(JanitorConfig::compact().validate().is_ok());
        assert!(JanitorConfig::extended().validate().is_ok());
        assert!(
            JanitorConfig::compact().policy(ArtifactClass::Segment).hot_capacity
                < JanitorConfig::extended().policy(ArtifactClass::Segment).hot_capacity
        );
    }

    #[test]
    fn test_duration_conversions() {
        let config = JanitorConfig::default();
        assert_eq!(config.archive_interval(), Duration::from_secs(10));
        assert_eq!(config.sweep_interval(), Duration::from_secs(3600));
        assert_eq!(config.operation_timeout(), Duration::from_millis(5000));
        assert_eq!(
            config.policy(ArtifactClass::Capture).cold_retention(),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_from_toml_partial_classes() {
        let config = JanitorConfig::from_toml(
            r#"
            root = "/srv/stream/capture1"
            bucket_clock = "utc"
            sweep_interval_minutes = 30

            [classes.segments]
            hot_capacity = 20
            cold_retention_minutes = 720
            "#,
        )
        .unwrap();

        assert_eq!(config.root, PathBuf::from("/srv/stream/capture1"));
        assert_eq!(config.bucket_clock, BucketClockSetting::Utc);
        assert_eq!(config.policy(ArtifactClass::Segment).hot_capacity, 20);
        // Unlisted classes keep their defaults
        assert_eq!(config.policy(ArtifactClass::Capture).hot_capacity, 100);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let mut config = JanitorConfig::default();
        config.set_policy(
            ArtifactClass::Segment,
            ClassPolicy {
                hot_capacity: 0,
                cold_retention_minutes: 60,
            },
        );
        assert!(matches!(config.validate(), Err(JanitorError::Config(_))));
    }

    #[test]
    fn test_rejects_retention_over_a_day() {
        let mut config = JanitorConfig::default();
        config.set_policy(
            ArtifactClass::Metadata,
            ClassPolicy {
                hot_capacity: 10,
                cold_retention_minutes: 25 * 60,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_sweep_slower_than_retention() {
        let config = JanitorConfig {
            sweep_interval_minutes: 90,
            ..Default::default()
        };
        // captures keep 60 minutes
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("capture"));
    }

    #[test]
    fn test_rejects_unknown_class() {
        let result = JanitorConfig::from_toml(
            r#"
            [classes.audio]
            hot_capacity = 5
            cold_retention_minutes = 60
            "#,
        );
        assert!(matches!(result, Err(JanitorError::Config(_))));
    }

    #[test]
    fn test_classes_reusing_buckets() {
        let config = JanitorConfig::default();
        assert_eq!(
            config.classes_reusing_buckets(),
            vec![ArtifactClass::Segment, ArtifactClass::Thumbnail, ArtifactClass::Metadata]
        );
        assert!(JanitorConfig::compact().classes_reusing_buckets().is_empty());

        let flagged = JanitorConfig {
            collision_policy: CollisionPolicy::Flag,
            ..JanitorConfig::default()
        };
        assert!(flagged.validate().is_ok());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = JanitorConfig::compact();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized = JanitorConfig::from_toml(&serialized).unwrap();
        assert_eq!(config.classes, deserialized.classes);
        assert_eq!(config.sweep_interval_minutes, deserialized.sweep_interval_minutes);
    }
}
