//! Integration tests for the archiver, the retention sweeper and the worker
//!
//! All tests run against real temporary directory trees with a manual clock.

use caplife_domain::{
    ArtifactClass, BucketKey, CaptureEntry, CaptureStore, ManualClock, RelocateOutcome,
};
use caplife_janitor::{
    BucketClockSetting, ClassPolicy, CollisionPolicy, HealthState, Janitor, JanitorConfig, JanitorError,
    JanitorWorker,
};
use caplife_store::{FsStore, StoreError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const HOUR: u64 = 3600;

/// 2024-01-10T15:30:00Z
fn now() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_704_900_600)
}

fn ago(secs: u64) -> SystemTime {
    now() - Duration::from_secs(secs)
}

fn write_at(dir: &Path, name: &str, mtime: SystemTime) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, name.as_bytes()).unwrap();
    fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
    path
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn test_config(root: &Path) -> JanitorConfig {
    let mut config = JanitorConfig {
        root: root.to_path_buf(),
        bucket_clock: BucketClockSetting::Utc,
        archive_interval_secs: 1,
        ..Default::default()
    };
    config.set_policy(
        ArtifactClass::Segment,
        ClassPolicy {
            hot_capacity: 10,
            cold_retention_minutes: 24 * 60,
        },
    );
    config
}

fn janitor_for(dir: &TempDir, config: JanitorConfig) -> Janitor<FsStore> {
    let store = FsStore::new(dir.path());
    store.ensure_class_dirs().unwrap();
    Janitor::with_clock(store, config, Arc::new(ManualClock::new(now()))).unwrap()
}

fn write_segments(dir: &Path, count: u64) {
    for i in 1..=count {
        write_at(&dir.join("segments"), &format!("segment_{:04}.ts", i), ago(HOUR * 3 - i * 10));
    }
}

#[tokio::test]
async fn test_exactly_capacity_moves_nothing() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 10);
    let janitor = janitor_for(&dir, test_config(dir.path()));

    let report = janitor.archive_class(ArtifactClass::Segment).await.unwrap();
    assert_eq!(report.hot_before, 10);
    assert_eq!(report.moved, 0);
    assert_eq!(names_in(&dir.path().join("segments")).len(), 10);
}

#[tokio::test]
async fn test_one_over_capacity_moves_oldest() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 11);
    let janitor = janitor_for(&dir, test_config(dir.path()));

    let report = janitor.archive_class(ArtifactClass::Segment).await.unwrap();
    assert_eq!(report.moved, 1);

    // segment_0001 is 3h - 10s old: 12:30 UTC
    let bucket = dir.path().join("segments").join("12");
    assert_eq!(names_in(&bucket), vec!["segment_0001.ts"]);
    let hot = names_in(&dir.path().join("segments"));
    assert_eq!(hot.len(), 10);
    assert!(!hot.contains(&"segment_0001.ts".to_string()));
}

#[tokio::test]
async fn test_hot_keeps_newest_and_no_duplicates() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 25);
    let janitor = janitor_for(&dir, test_config(dir.path()));

    janitor.archive_all().await;

    let hot: HashSet<String> = names_in(&dir.path().join("segments")).into_iter().collect();
    let expected: HashSet<String> = (16..=25).map(|i| format!("segment_{:04}.ts", i)).collect();
    assert_eq!(hot, expected);

    let mut seen = hot.clone();
    let mut cold_total = 0;
    for bucket in BucketKey::all() {
        for name in names_in(&dir.path().join("segments").join(bucket.dir_name())) {
            assert!(seen.insert(name.clone()), "{} visible twice", name);
            cold_total += 1;
        }
    }
    assert_eq!(cold_total, 15);
}

#[tokio::test]
async fn test_archive_preserves_mtime() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.set_policy(
        ArtifactClass::Capture,
        ClassPolicy {
            hot_capacity: 1,
            cold_retention_minutes: 60,
        },
    );
    let old = ago(5 * HOUR);
    write_at(&dir.path().join("captures"), "capture_1.jpg", old);
    write_at(&dir.path().join("captures"), "capture_2.jpg", ago(60));
    let janitor = janitor_for(&dir, config);

    janitor.archive_class(ArtifactClass::Capture).await.unwrap();

    let moved = dir.path().join("captures").join("10").join("capture_1.jpg");
    assert_eq!(fs::metadata(&moved).unwrap().modified().unwrap(), old);
}

#[tokio::test]
async fn test_archive_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 14);
    let janitor = janitor_for(&dir, test_config(dir.path()));

    let first = janitor.archive_class(ArtifactClass::Segment).await.unwrap();
    let second = janitor.archive_class(ArtifactClass::Segment).await.unwrap();
    assert_eq!(first.moved, 4);
    assert_eq!(second.moved, 0);
    assert_eq!(second.overflow, 0);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 12);
    let config = JanitorConfig {
        dry_run: true,
        ..test_config(dir.path())
    };
    let janitor = janitor_for(&dir, config);

    let report = janitor.archive_class(ArtifactClass::Segment).await.unwrap();
    assert_eq!(report.planned, 2);
    assert_eq!(report.moved, 0);
    assert_eq!(names_in(&dir.path().join("segments")).len(), 12);
}

#[tokio::test]
async fn test_missing_class_dir_is_isolated_and_alerted() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 12);
    let janitor = janitor_for(&dir, test_config(dir.path()));
    fs::remove_dir_all(dir.path().join("captures")).unwrap();

    let cycle = janitor.archive_all().await;

    assert_eq!(cycle.errors.len(), 1);
    assert_eq!(cycle.errors[0].0, ArtifactClass::Capture);
    assert!(matches!(cycle.errors[0].1, JanitorError::Structural { .. }));
    // Segments still archived
    assert!(cycle
        .reports
        .iter()
        .any(|r| r.class == ArtifactClass::Segment && r.moved == 2));

    let health = janitor.health().borrow().clone();
    assert_eq!(health.state, HealthState::Degraded);
    assert_eq!(health.archive_alerts[0].class, "capture");
    assert_eq!(janitor.metrics().classes[&ArtifactClass::Capture].structural_alerts, 1);
}

#[tokio::test]
async fn test_health_ready_after_clean_cycle() {
    let dir = TempDir::new().unwrap();
    let janitor = janitor_for(&dir, test_config(dir.path()));
    assert_eq!(janitor.health().borrow().state, HealthState::Starting);

    let cycle = janitor.archive_all().await;
    assert!(cycle.is_clean());
    assert!(janitor.health().borrow().is_ready());
}

/// Wraps the filesystem store to inject per-file failures and stalls
struct FaultyStore {
    inner: FsStore,
    failing: Arc<Mutex<HashSet<String>>>,
    stall: Option<Stall>,
}

/// Blocks one store operation of one class
#[derive(Debug, Clone, Copy)]
struct Stall {
    op: &'static str,
    class: ArtifactClass,
    duration: Duration,
}

impl FaultyStore {
    fn stalling(inner: FsStore, stall: Stall) -> Self {
        Self {
            inner,
            failing: Arc::new(Mutex::new(HashSet::new())),
            stall: Some(stall),
        }
    }

    fn maybe_stall(&self, op: &str, class: ArtifactClass) {
        if let Some(stall) = self.stall {
            if stall.op == op && stall.class == class {
                std::thread::sleep(stall.duration);
            }
        }
    }
}

impl CaptureStore for FaultyStore {
    type Error = StoreError;

    fn check_class_dir(&self, class: ArtifactClass) -> Result<(), StoreError> {
        self.inner.check_class_dir(class)
    }

    fn list_hot(&self, class: ArtifactClass) -> Result<Vec<CaptureEntry>, StoreError> {
        self.maybe_stall("list_hot", class);
        self.inner.list_hot(class)
    }

    fn list_bucket(&self, class: ArtifactClass, bucket: BucketKey) -> Result<Vec<CaptureEntry>, StoreError> {
        self.maybe_stall("list_bucket", class);
        self.inner.list_bucket(class, bucket)
    }

    fn ensure_bucket(&self, class: ArtifactClass, bucket: BucketKey) -> Result<PathBuf, StoreError> {
        self.inner.ensure_bucket(class, bucket)
    }

    fn archive(&self, entry: &CaptureEntry, bucket: BucketKey) -> Result<RelocateOutcome, StoreError> {
        self.maybe_stall("archive", entry.class);
        if self.failing.lock().unwrap().contains(&entry.name) {
            return Err(StoreError::Io {
                path: entry.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "injected"),
            });
        }
        self.inner.archive(entry, bucket)
    }

    fn remove(&self, entry: &CaptureEntry) -> Result<bool, StoreError> {
        self.maybe_stall("remove", entry.class);
        self.inner.remove(entry)
    }
}

fn stalled_janitor(dir: &TempDir, config: JanitorConfig, op: &'static str, class: ArtifactClass) -> Janitor<FaultyStore> {
    let store = FsStore::new(dir.path());
    store.ensure_class_dirs().unwrap();
    let faulty = FaultyStore::stalling(
        store,
        Stall {
            op,
            class,
            duration: Duration::from_millis(300),
        },
    );
    let config = JanitorConfig {
        operation_timeout_ms: 50,
        ..config
    };
    Janitor::with_clock(faulty, config, Arc::new(ManualClock::new(now()))).unwrap()
}

#[tokio::test]
async fn test_transient_failure_left_hot_and_retried() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 13);
    let store = FsStore::new(dir.path());
    store.ensure_class_dirs().unwrap();
    let failing = Arc::new(Mutex::new(HashSet::from(["segment_0002.ts".to_string()])));
    let faulty = FaultyStore {
        inner: store,
        failing: Arc::clone(&failing),
        stall: None,
    };
    let janitor =
        Janitor::with_clock(faulty, test_config(dir.path()), Arc::new(ManualClock::new(now()))).unwrap();

    let report = janitor.archive_class(ArtifactClass::Segment).await.unwrap();
    assert_eq!(report.moved, 2);
    assert_eq!(report.failed, 1);
    assert!(dir.path().join("segments").join("segment_0002.ts").exists());

    failing.lock().unwrap().clear();
    let retry = janitor.archive_class(ArtifactClass::Segment).await.unwrap();
    assert_eq!(retry.moved, 1);
    assert!(!dir.path().join("segments").join("segment_0002.ts").exists());
    assert_eq!(names_in(&dir.path().join("segments")).len(), 10);
}

#[tokio::test]
async fn test_stalled_filesystem_defers_remaining_files() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 13);
    let janitor = stalled_janitor(&dir, test_config(dir.path()), "archive", ArtifactClass::Segment);

    let report = janitor.archive_class(ArtifactClass::Segment).await.unwrap();
    assert_eq!(report.deferred, 3);
    assert_eq!(report.moved, 0);
}

#[tokio::test]
async fn test_stalled_hot_listing_skips_class_for_the_cycle() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 13);
    for i in 1..=4 {
        write_at(&dir.path().join("captures"), &format!("capture_{}.jpg", i), ago(HOUR - i * 60));
    }
    let mut config = test_config(dir.path());
    config.set_policy(
        ArtifactClass::Capture,
        ClassPolicy {
            hot_capacity: 2,
            cold_retention_minutes: 60,
        },
    );
    let janitor = stalled_janitor(&dir, config, "list_hot", ArtifactClass::Segment);

    let cycle = janitor.archive_all().await;

    assert_eq!(cycle.errors.len(), 1);
    let (class, error) = &cycle.errors[0];
    assert_eq!(*class, ArtifactClass::Segment);
    assert!(matches!(error, JanitorError::Timeout { .. }));
    assert!(!error.is_alert());
    assert_eq!(names_in(&dir.path().join("segments")).len(), 13);

    let captures = cycle
        .reports
        .iter()
        .find(|r| r.class == ArtifactClass::Capture)
        .unwrap();
    assert_eq!(captures.moved, 2);
    assert_eq!(names_in(&dir.path().join("captures")).len(), 2);

    assert_eq!(janitor.metrics().classes[&ArtifactClass::Segment].deferred, 1);
    assert_eq!(janitor.metrics().classes[&ArtifactClass::Segment].structural_alerts, 0);
    let health = janitor.health().borrow().clone();
    assert_eq!(health.state, HealthState::Ready);
    assert!(health.archive_alerts.is_empty());
}

#[tokio::test]
async fn test_stalled_bucket_listing_defers_sweep() {
    let dir = TempDir::new().unwrap();
    let segments = dir.path().join("segments");
    for i in 0..3 {
        write_at(&segments.join("14"), &format!("segment_{}.ts", i), ago(25 * HOUR + i * 60));
    }
    let metadata = dir.path().join("metadata").join("9");
    write_at(&metadata, "metadata_1.json", ago(25 * HOUR));
    let janitor = stalled_janitor(&dir, test_config(dir.path()), "list_bucket", ArtifactClass::Segment);

    let cycle = janitor.sweep_all().await;

    assert!(cycle.errors.is_empty());
    let segment = cycle
        .reports
        .iter()
        .find(|r| r.class == ArtifactClass::Segment)
        .unwrap();
    assert_eq!(segment.deferred, 1);
    assert_eq!(segment.buckets_inspected, 0);
    assert_eq!(segment.files_purged, 0);
    assert_eq!(names_in(&segments.join("14")).len(), 3);

    let meta = cycle
        .reports
        .iter()
        .find(|r| r.class == ArtifactClass::Metadata)
        .unwrap();
    assert_eq!(meta.files_purged, 1);
    assert!(names_in(&metadata).is_empty());

    let health = janitor.health().borrow().clone();
    assert_ne!(health.state, HealthState::Degraded);
    assert!(health.sweep_alerts.is_empty());
}

#[tokio::test]
async fn test_stalled_delete_defers_rest_of_bucket() {
    let dir = TempDir::new().unwrap();
    let bucket = dir.path().join("segments").join("14");
    for i in 0..3 {
        write_at(&bucket, &format!("segment_{}.ts", i), ago(25 * HOUR + i * 60));
    }
    let janitor = stalled_janitor(&dir, test_config(dir.path()), "remove", ArtifactClass::Segment);

    let report = janitor.sweep_class(ArtifactClass::Segment).await.unwrap();

    assert_eq!(report.buckets_inspected, 1);
    assert_eq!(report.deferred, 3);
    assert_eq!(report.files_purged, 0);
    assert_eq!(report.buckets_purged, 0);
    assert_eq!(report.failed, 0);
}

fn sweep_config(dir: &TempDir, policy: CollisionPolicy) -> JanitorConfig {
    JanitorConfig {
        collision_policy: policy,
        ..test_config(dir.path())
    }
}

#[tokio::test]
async fn test_retention_scenario_hour_14_and_15() {
    let dir = TempDir::new().unwrap();
    let segments = dir.path().join("segments");
    for i in 0..5 {
        write_at(&segments.join("14"), &format!("segment_{}.ts", i), ago(25 * HOUR + i * 60));
        write_at(&segments.join("15"), &format!("segment_{}.ts", 100 + i), ago(23 * HOUR + i * 60));
    }
    let janitor = janitor_for(&dir, sweep_config(&dir, CollisionPolicy::PurgeExpired));

    let report = janitor.sweep_class(ArtifactClass::Segment).await.unwrap();

    assert_eq!(report.buckets_purged, 1);
    assert_eq!(report.files_purged, 5);
    assert!(names_in(&segments.join("14")).is_empty());
    assert!(segments.join("14").is_dir(), "bucket directory is kept for reuse");
    assert_eq!(names_in(&segments.join("15")).len(), 5);
}

#[tokio::test]
async fn test_bucket_with_one_young_member_untouched() {
    let dir = TempDir::new().unwrap();
    let bucket = dir.path().join("captures").join("3");
    write_at(&bucket, "capture_1.jpg", ago(80 * 60));
    write_at(&bucket, "capture_2.jpg", ago(75 * 60));
    write_at(&bucket, "capture_3.jpg", ago(30 * 60));
    let janitor = janitor_for(&dir, sweep_config(&dir, CollisionPolicy::PurgeExpired));

    let report = janitor.sweep_class(ArtifactClass::Capture).await.unwrap();
    assert_eq!(report.files_purged, 0);
    assert_eq!(report.collisions, 0);
    assert_eq!(names_in(&bucket).len(), 3);
}

#[tokio::test]
async fn test_mixed_generation_bucket_flagged() {
    let dir = TempDir::new().unwrap();
    let bucket = dir.path().join("metadata").join("15");
    write_at(&bucket, "metadata_1.json", ago(24 * HOUR + 20 * 60));
    write_at(&bucket, "metadata_2.json", ago(10 * 60));

    let janitor = janitor_for(&dir, sweep_config(&dir, CollisionPolicy::Flag));
    let report = janitor.sweep_class(ArtifactClass::Metadata).await.unwrap();
    assert_eq!(report.collisions, 1);
    assert_eq!(names_in(&bucket).len(), 2);

    let janitor = janitor_for(&dir, sweep_config(&dir, CollisionPolicy::PurgeExpired));
    let report = janitor.sweep_class(ArtifactClass::Metadata).await.unwrap();
    assert_eq!(report.collisions, 1);
    assert_eq!(report.files_purged, 1);
    assert_eq!(report.buckets_purged, 0);
    assert_eq!(names_in(&bucket), vec!["metadata_2.json"]);
}

#[tokio::test]
async fn test_sweep_dry_run_keeps_files() {
    let dir = TempDir::new().unwrap();
    let bucket = dir.path().join("thumbnails").join("1");
    write_at(&bucket, "thumbnail_1.jpg", ago(30 * HOUR));
    let config = JanitorConfig {
        dry_run: true,
        ..test_config(dir.path())
    };
    let janitor = janitor_for(&dir, config);

    let report = janitor.sweep_class(ArtifactClass::Thumbnail).await.unwrap();
    assert_eq!(report.planned, 1);
    assert_eq!(names_in(&bucket).len(), 1);
}

#[tokio::test]
async fn test_archive_and_sweep_concurrently() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 30);
    write_at(&dir.path().join("segments").join("2"), "segment_9000.ts", ago(26 * HOUR));
    let janitor = janitor_for(&dir, test_config(dir.path()));

    let (archived, swept) = tokio::join!(janitor.archive_all(), janitor.sweep_all());
    assert!(archived.is_clean());
    assert!(swept.is_clean());
    assert_eq!(names_in(&dir.path().join("segments")).len(), 10);
    assert!(names_in(&dir.path().join("segments").join("2")).is_empty());
    assert_eq!(janitor.metrics().total_archived(), 20);
}

#[tokio::test]
async fn test_worker_run_cycles() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 12);
    let health_file = dir.path().join("health.json");
    let worker = JanitorWorker::new(janitor_for(&dir, test_config(dir.path()))).with_health_file(&health_file);

    worker.run_cycles(2).await.unwrap();

    let metrics = worker.metrics();
    assert_eq!(metrics.archive_passes, 2);
    assert_eq!(metrics.sweep_passes, 2);
    assert_eq!(metrics.total_archived(), 2);
    let health: serde_json::Value = serde_json::from_slice(&fs::read(&health_file).unwrap()).unwrap();
    assert_eq!(health["state"], "ready");

    worker.reset_metrics();
    assert_eq!(worker.metrics().archive_passes, 0);
}

#[tokio::test]
async fn test_worker_stops_on_shutdown_request() {
    let dir = TempDir::new().unwrap();
    write_segments(dir.path(), 11);
    let worker = JanitorWorker::new(janitor_for(&dir, test_config(dir.path())));
    let janitor = worker.janitor().clone();

    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        janitor.request_shutdown();
    });
    tokio::time::timeout(Duration::from_secs(10), worker.run())
        .await
        .expect("worker did not stop")
        .unwrap();
    stopper.await.unwrap();

    assert!(worker.metrics().archive_passes >= 1);
    assert_eq!(names_in(&dir.path().join("segments")).len(), 10);
}
