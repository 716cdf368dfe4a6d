//! Listing and move primitives shared by the archiver and the migration tool

use crate::StoreError;
use caplife_domain::{CaptureEntry, RelocateOutcome};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

/// List the classified regular files directly inside `dir`
///
/// Subdirectories and unclassified names are ignored. A file that disappears
/// between the directory read and its stat was moved by someone else and is
/// silently left out of the snapshot.
pub fn list_classified(dir: &Path) -> Result<Vec<CaptureEntry>, StoreError> {
    let reader = match fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StoreError::structural(dir, "directory does not exist"));
        }
        Err(e) if e.kind() == ErrorKind::NotADirectory => {
            return Err(StoreError::structural(dir, "not a directory"));
        }
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    let mut entries = Vec::new();
    for item in reader {
        let item = item.map_err(|e| StoreError::io(dir, e))?;
        let path = item.path();

        let metadata = match item.metadata() {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping entry without mtime");
                continue;
            }
        };

        if let Some(entry) = CaptureEntry::from_path(path, modified) {
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Atomically move `entry` into `dest_dir`, keeping its name
///
/// A single rename is the commit point: the file is never copied, so its mtime is
/// preserved and it is never visible in two places or in none. An existing file of
/// the same name at the destination is never overwritten.
///
/// On Linux the rename itself refuses to replace, so a destination created after
/// the existence check still surfaces as a conflict. Elsewhere, and on Linux
/// filesystems without `RENAME_NOREPLACE`, writers into the same bucket must be
/// serialized by the caller (the janitor holds the class lock while archiving).
pub fn relocate_into(entry: &CaptureEntry, dest_dir: &Path) -> Result<RelocateOutcome, StoreError> {
    let dest = dest_dir.join(&entry.name);

    match fs::symlink_metadata(&dest) {
        Ok(_) => return Err(StoreError::Conflict(dest)),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(StoreError::io(&dest, e)),
    }

    match rename_noreplace(&entry.path, &dest) {
        Ok(()) => Ok(RelocateOutcome::Moved(dest)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::Conflict(dest)),
        Err(e) if e.kind() == ErrorKind::NotFound && !entry.path.exists() => Ok(RelocateOutcome::Vanished),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => Err(StoreError::CrossDevice(entry.path.clone())),
        Err(e) => Err(StoreError::io(&entry.path, e)),
    }
}

/// Rename that fails with `AlreadyExists` rather than replace `to`
#[cfg(target_os = "linux")]
fn rename_noreplace(from: &Path, to: &Path) -> io::Result<()> {
    use rustix::fs::{renameat_with, RenameFlags, CWD};
    use rustix::io::Errno;

    match renameat_with(CWD, from, CWD, to, RenameFlags::NOREPLACE) {
        Ok(()) => Ok(()),
        // Kernel or filesystem without RENAME_NOREPLACE
        Err(Errno::INVAL) | Err(Errno::NOSYS) => fs::rename(from, to),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(target_os = "linux"))]
fn rename_noreplace(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}
