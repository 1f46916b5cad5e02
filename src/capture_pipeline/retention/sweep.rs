use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::retention::types::{EvidenceFile, StorageInfo};

/// File extensions treated as evidence; anything else in the directory is ignored.
pub const EVIDENCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// Evidence files in `directory`, newest first.
///
/// Ties on modification time fall back to the file name, later names first,
/// so the order is total. A missing directory holds no evidence. Entries
/// that vanish or cannot be read during the scan are logged and skipped.
pub fn list_evidence(directory: &Path) -> Result<Vec<EvidenceFile>> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(CaptureError::StorageIo(format!("{}: {}", directory.display(), e)));
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(directory = %directory.display(), "Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !has_evidence_extension(&path) {
            continue;
        }
        match evidence_file(&path) {
            Ok(Some(file)) => files.push(file),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), "Skipping evidence file: {}", e),
        }
    }

    files.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| b.path.cmp(&a.path))
    });
    Ok(files)
}

fn has_evidence_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            EVIDENCE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn evidence_file(path: &Path) -> io::Result<Option<EvidenceFile>> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Ok(None);
    }
    Ok(Some(EvidenceFile {
        path: PathBuf::from(path),
        modified: metadata.modified()?,
        size_bytes: metadata.len(),
    }))
}

/// The files a sweep with `max_count` would delete, oldest first.
pub fn plan_sweep(directory: &Path, max_count: usize) -> Result<Vec<EvidenceFile>> {
    let files = list_evidence(directory)?;
    debug!(found = files.len(), max_count, "Planning retention sweep");
    if files.len() <= max_count {
        return Ok(Vec::new());
    }
    let mut excess = files[max_count..].to_vec();
    excess.reverse();
    Ok(excess)
}

/// Deletes all but the `max_count` newest evidence files and returns how
/// many were deleted.
///
/// Individual deletion failures are logged and skipped.
pub fn sweep(directory: &Path, max_count: usize) -> Result<usize> {
    let doomed = plan_sweep(directory, max_count)?;
    if doomed.is_empty() {
        debug!(max_count, "Evidence count within limit");
        return Ok(0);
    }

    let mut deleted = 0;
    for file in &doomed {
        match fs::remove_file(&file.path) {
            Ok(()) => {
                debug!(path = %file.path.display(), "Deleted old evidence");
                deleted += 1;
            }
            Err(e) => error!(path = %file.path.display(), "Failed to delete evidence: {}", e),
        }
    }

    info!(deleted, kept = max_count, directory = %directory.display(), "Retention sweep complete");
    Ok(deleted)
}

pub fn storage_info(directory: &Path) -> Result<StorageInfo> {
    let files = list_evidence(directory)?;
    let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
    Ok(StorageInfo {
        file_count: files.len(),
        total_size_mb: total_bytes as f64 / (1024.0 * 1024.0),
        newest: files.first().map(|f| f.modified),
        oldest: files.last().map(|f| f.modified),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn evidence_aged(dir: &Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn keeps_newest_and_deletes_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        for age in 1..=8u32 {
            evidence_aged(dir.path(), &format!("cat_{age:02}.jpg"), DAY * age);
        }

        let deleted = sweep(dir.path(), 5).unwrap();

        assert_eq!(deleted, 3);
        let mut remaining: Vec<String> = list_evidence(dir.path())
            .unwrap()
            .into_iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(remaining, ["cat_01.jpg", "cat_02.jpg", "cat_03.jpg", "cat_04.jpg", "cat_05.jpg"]);
    }

    #[test]
    fn nothing_deleted_within_limit() {
        let dir = tempfile::tempdir().unwrap();
        for age in 1..=3u32 {
            evidence_aged(dir.path(), &format!("cat_{age}.jpg"), DAY * age);
        }
        assert_eq!(sweep(dir.path(), 3).unwrap(), 0);
        assert_eq!(sweep(dir.path(), 10).unwrap(), 0);
        assert_eq!(list_evidence(dir.path()).unwrap().len(), 3);
    }

    #[test]
    fn plan_lists_oldest_first_without_deleting() {
        let dir = tempfile::tempdir().unwrap();
        for age in 1..=4u32 {
            evidence_aged(dir.path(), &format!("cat_{age}.jpg"), DAY * age);
        }

        let plan = plan_sweep(dir.path(), 2).unwrap();

        let names: Vec<_> = plan
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["cat_4.jpg", "cat_3.jpg"]);
        assert_eq!(list_evidence(dir.path()).unwrap().len(), 4);
    }

    #[test]
    fn ignores_non_evidence_files() {
        let dir = tempfile::tempdir().unwrap();
        evidence_aged(dir.path(), "notes.txt", DAY * 9);
        evidence_aged(dir.path(), "cat_1.JPG", DAY);
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let files = list_evidence(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(sweep(dir.path(), 0).unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn vanished_entry_does_not_abort_sweep() {
        let dir = tempfile::tempdir().unwrap();
        for age in 1..=3u32 {
            evidence_aged(dir.path(), &format!("cat_{age}.jpg"), DAY * age);
        }
        std::os::unix::fs::symlink(dir.path().join("gone.jpg"), dir.path().join("ghost.jpg"))
            .unwrap();

        assert_eq!(list_evidence(dir.path()).unwrap().len(), 3);
        assert_eq!(sweep(dir.path(), 1).unwrap(), 2);
        assert!(dir.path().join("cat_1.jpg").exists());
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(sweep(&missing, 1).unwrap(), 0);
        let info = storage_info(&missing).unwrap();
        assert_eq!(info.file_count, 0);
        assert_eq!(info.oldest, None);
    }

    #[test]
    fn storage_info_reports_extremes() {
        let dir = tempfile::tempdir().unwrap();
        let old = evidence_aged(dir.path(), "a.jpg", DAY * 3);
        let new = evidence_aged(dir.path(), "b.jpg", DAY);

        let info = storage_info(dir.path()).unwrap();

        assert_eq!(info.file_count, 2);
        assert_eq!(info.oldest, Some(fs::metadata(old).unwrap().modified().unwrap()));
        assert_eq!(info.newest, Some(fs::metadata(new).unwrap().modified().unwrap()));
    }
}
