//! Destination planning
//!
//! Computes the concrete destination path `target_root/YYYY/MM/filename` for
//! one copy, creating the bucket directory on demand.

use crate::date::DateBucket;
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Plan the destination path for `file_name` under `target_root`, ensuring
/// the bucket directory exists.
///
/// Idempotent: an already-present directory is not an error. Returns the full
/// destination path; collisions there are resolved by overwrite-on-copy.
pub fn plan_destination(
    target_root: &Path,
    bucket: &DateBucket,
    file_name: &OsStr,
) -> Result<PathBuf> {
    let bucket_dir = target_root.join(bucket.relative_path());
    fs::create_dir_all(&bucket_dir).map_err(|e| Error::CreateDir {
        path: bucket_dir.clone(),
        source: e,
    })?;
    Ok(bucket_dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_plan_destination_creates_bucket_dir() {
        let target = tempfile::tempdir().unwrap();
        let bucket = DateBucket::new(2023, 7).unwrap();

        let dest = plan_destination(target.path(), &bucket, OsStr::new("a.jpg")).unwrap();
        assert_eq!(dest, target.path().join("2023").join("07").join("a.jpg"));
        assert!(dest.parent().unwrap().is_dir());
    }

    #[test]
    fn test_plan_destination_is_idempotent() {
        let target = tempfile::tempdir().unwrap();
        let bucket = DateBucket::new(2020, 1).unwrap();

        let first = plan_destination(target.path(), &bucket, OsStr::new("a.jpg")).unwrap();
        let second = plan_destination(target.path(), &bucket, OsStr::new("a.jpg")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_destination_reports_create_failure() {
        let target = tempfile::tempdir().unwrap();
        let bucket = DateBucket::new(2023, 7).unwrap();

        // Block the year directory with a regular file
        File::create(target.path().join("2023")).unwrap();

        let err = plan_destination(target.path(), &bucket, OsStr::new("a.jpg")).unwrap_err();
        assert!(matches!(err, Error::CreateDir { .. }));
    }
}
