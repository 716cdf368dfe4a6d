//! `CaptureStore` backed by a local (or network-mounted) directory tree

use crate::{list_classified, relocate_into, CaptureLayout, StoreError};
use caplife_domain::{ArtifactClass, BucketKey, CaptureEntry, CaptureStore, RelocateOutcome};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Filesystem capture store
///
/// # Examples
///
/// ```no_run
/// use caplife_domain::{ArtifactClass, CaptureStore};
/// use caplife_store::FsStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FsStore::new("/var/www/stream/capture1");
/// let hot = store.list_hot(ArtifactClass::Segment)?;
/// println!("{} hot segments", hot.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FsStore {
    layout: CaptureLayout,
}

/// File counts of one class, hot and per cold bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassOccupancy {
    /// Files in the hot directory
    pub hot: usize,

    /// Files per cold bucket, indexed by hour
    pub cold: [usize; 24],
}

impl ClassOccupancy {
    /// Files across all cold buckets
    pub fn cold_total(&self) -> usize {
        self.cold.iter().sum()
    }
}

impl FsStore {
    /// Store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: CaptureLayout::new(root),
        }
    }

    /// Path layout of this store
    pub fn layout(&self) -> &CaptureLayout {
        &self.layout
    }

    /// Create every class's hot directory
    pub fn ensure_class_dirs(&self) -> Result<(), StoreError> {
        for class in ArtifactClass::ALL {
            let dir = self.layout.class_dir(class);
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Count hot and cold files of a class
    pub fn occupancy(&self, class: ArtifactClass) -> Result<ClassOccupancy, StoreError> {
        let mut occupancy = ClassOccupancy {
            hot: self.list_hot(class)?.len(),
            ..Default::default()
        };
        for bucket in BucketKey::all() {
            occupancy.cold[bucket.hour() as usize] = self.list_bucket(class, bucket)?.len();
        }
        Ok(occupancy)
    }

    fn require_dir(path: &Path) -> Result<(), StoreError> {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::structural(path, "not a directory")),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::structural(path, "directory does not exist"))
            }
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

impl CaptureStore for FsStore {
    type Error = StoreError;

    fn check_class_dir(&self, class: ArtifactClass) -> Result<(), StoreError> {
        Self::require_dir(&self.layout.class_dir(class))
    }

    fn list_hot(&self, class: ArtifactClass) -> Result<Vec<CaptureEntry>, StoreError> {
        let dir = self.layout.class_dir(class);
        let mut entries = list_classified(&dir)?;
        entries.retain(|e| e.class == class);
        Ok(entries)
    }

    fn list_bucket(&self, class: ArtifactClass, bucket: BucketKey) -> Result<Vec<CaptureEntry>, StoreError> {
        let dir = self.layout.bucket_dir(class, bucket);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = list_classified(&dir)?;
        entries.retain(|e| e.class == class);
        Ok(entries)
    }

    fn ensure_bucket(&self, class: ArtifactClass, bucket: BucketKey) -> Result<PathBuf, StoreError> {
        Self::require_dir(&self.layout.class_dir(class))?;
        let dir = self.layout.bucket_dir(class, bucket);
        match fs::create_dir(&dir) {
            Ok(()) => Ok(dir),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Self::require_dir(&dir)?;
                Ok(dir)
            }
            Err(e) => Err(StoreError::io(&dir, e)),
        }
    }

    fn archive(&self, entry: &CaptureEntry, bucket: BucketKey) -> Result<RelocateOutcome, StoreError> {
        let dir = self.layout.bucket_dir(entry.class, bucket);
        relocate_into(entry, &dir)
    }

    fn remove(&self, entry: &CaptureEntry) -> Result<bool, StoreError> {
        match fs::remove_file(&entry.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(&entry.path, e)),
        }
    }
}
