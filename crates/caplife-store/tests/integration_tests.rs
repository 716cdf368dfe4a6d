//! Integration tests for caplife-store
//!
//! These tests exercise the filesystem store against real temporary trees.

use caplife_domain::{ArtifactClass, BucketKey, CaptureStore, FaultKind, RelocateOutcome, StoreFault};
use caplife_store::{FsStore, HotWindowTracker};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

fn write_at(dir: &Path, name: &str, mtime: SystemTime) {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let file = fs::File::create(&path).unwrap();
    file.set_modified(mtime).unwrap();
}

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn setup() -> (TempDir, FsStore) {
    let dir = TempDir::new().unwrap();
    let store = FsStore::new(dir.path());
    store.ensure_class_dirs().unwrap();
    (dir, store)
}

#[test]
fn test_list_hot_only_returns_own_class() {
    let (dir, store) = setup();
    let segments = dir.path().join("segments");
    write_at(&segments, "segment_1.ts", at(10));
    write_at(&segments, "capture_1.jpg", at(10));
    write_at(&segments.join("4"), "segment_0.ts", at(5));

    let hot = store.list_hot(ArtifactClass::Segment).unwrap();
    assert_eq!(hot.len(), 1);
    assert_eq!(hot[0].name, "segment_1.ts");
}

#[test]
fn test_list_hot_missing_class_dir_is_structural() {
    let dir = TempDir::new().unwrap();
    let store = FsStore::new(dir.path());

    let err = store.list_hot(ArtifactClass::Capture).unwrap_err();
    assert_eq!(err.kind(), FaultKind::Structural);
}

#[test]
fn test_tracker_snapshot_partitions_newest_first() {
    let (dir, store) = setup();
    let segments = dir.path().join("segments");
    for i in 1..=11 {
        write_at(&segments, &format!("segment_{}.ts", i), at(1000 + i));
    }

    let window = HotWindowTracker::new(ArtifactClass::Segment, 10)
        .snapshot(&store)
        .unwrap();
    assert_eq!(window.keep.len(), 10);
    assert_eq!(window.overflow.len(), 1);
    assert_eq!(window.overflow[0].name, "segment_1.ts");
}

#[test]
fn test_archive_round_trip_preserves_mtime() {
    let (dir, store) = setup();
    let mtime = at(14 * 3600 + 42);
    write_at(&dir.path().join("captures"), "capture_9.jpg", mtime);

    let entry = store.list_hot(ArtifactClass::Capture).unwrap().remove(0);
    let bucket = BucketKey::new(14).unwrap();
    store.ensure_bucket(ArtifactClass::Capture, bucket).unwrap();
    let outcome = store.archive(&entry, bucket).unwrap();

    let expected = dir.path().join("captures").join("14").join("capture_9.jpg");
    assert_eq!(outcome, RelocateOutcome::Moved(expected.clone()));
    assert_eq!(fs::metadata(&expected).unwrap().modified().unwrap(), mtime);
    assert!(store.list_hot(ArtifactClass::Capture).unwrap().is_empty());
    assert_eq!(store.list_bucket(ArtifactClass::Capture, bucket).unwrap().len(), 1);
}

#[test]
fn test_ensure_bucket_rejects_file_in_the_way() {
    let (dir, store) = setup();
    fs::write(dir.path().join("metadata").join("3"), b"oops").unwrap();

    let err = store
        .ensure_bucket(ArtifactClass::Metadata, BucketKey::new(3).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), FaultKind::Structural);
}

#[test]
fn test_ensure_bucket_is_idempotent() {
    let (_dir, store) = setup();
    let bucket = BucketKey::new(22).unwrap();
    let first = store.ensure_bucket(ArtifactClass::Thumbnail, bucket).unwrap();
    let second = store.ensure_bucket(ArtifactClass::Thumbnail, bucket).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_remove_tolerates_missing_file() {
    let (dir, store) = setup();
    write_at(&dir.path().join("captures"), "capture_1.jpg", at(1));
    let entry = store.list_hot(ArtifactClass::Capture).unwrap().remove(0);

    assert!(store.remove(&entry).unwrap());
    assert!(!store.remove(&entry).unwrap());
}

#[test]
fn test_occupancy_counts() {
    let (dir, store) = setup();
    let thumbs = dir.path().join("thumbnails");
    write_at(&thumbs, "thumbnail_1.jpg", at(1));
    write_at(&thumbs, "capture_2_thumbnail.jpg", at(2));
    write_at(&thumbs.join("5"), "thumbnail_0.jpg", at(0));

    let occupancy = store.occupancy(ArtifactClass::Thumbnail).unwrap();
    assert_eq!(occupancy.hot, 2);
    assert_eq!(occupancy.cold[5], 1);
    assert_eq!(occupancy.cold_total(), 1);
}
