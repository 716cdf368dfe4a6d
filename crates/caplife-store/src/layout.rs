//! Path layout of a capture root

use caplife_domain::{ArtifactClass, BucketKey};
use std::path::{Path, PathBuf};

/// Resolves class and bucket directories under a capture root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureLayout {
    root: PathBuf,
}

impl CaptureLayout {
    /// Layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Hot directory of a class (`<root>/<class>/`)
    pub fn class_dir(&self, class: ArtifactClass) -> PathBuf {
        self.root.join(class.dir_name())
    }

    /// Cold bucket directory (`<root>/<class>/<hour>/`)
    pub fn bucket_dir(&self, class: ArtifactClass, bucket: BucketKey) -> PathBuf {
        self.class_dir(class).join(bucket.dir_name())
    }

    /// Whether `dir` looks like a capture root (holds at least one class directory)
    pub fn is_capture_root(dir: &Path) -> bool {
        ArtifactClass::ALL
            .iter()
            .any(|class| dir.join(class.dir_name()).is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = CaptureLayout::new("/srv/stream/capture1");
        assert_eq!(
            layout.class_dir(ArtifactClass::Segment),
            PathBuf::from("/srv/stream/capture1/segments")
        );
        assert_eq!(
            layout.bucket_dir(ArtifactClass::Capture, BucketKey::new(14).unwrap()),
            PathBuf::from("/srv/stream/capture1/captures/14")
        );
    }
}
