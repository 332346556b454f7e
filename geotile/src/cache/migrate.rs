//! Removal of tiles written by the flat, pre-versioned cache layout.
//!
//! Older caches stored tile files directly in the cache root, plus a
//! directory per plugin. Those tiles carry no version information and are
//! never read again, so they are deleted on startup.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

/// Result of purging a legacy cache root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeResult {
    /// Plain files removed from the root.
    pub files_removed: u64,
    /// Legacy plugin directories removed.
    pub dirs_removed: u64,
}

/// Delete every plain file in `root` and the listed subdirectories.
///
/// Other subdirectories (including the current tile layout) are left alone.
/// A missing root is not an error.
pub fn purge_legacy_cache<S: AsRef<str>>(root: &Path, legacy_dirs: &[S]) -> io::Result<PurgeResult> {
    let mut result = PurgeResult::default();

    if !root.is_dir() {
        return Ok(result);
    }

    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_file() {
            match fs::remove_file(&path) {
                Ok(()) => result.files_removed += 1,
                Err(e) => debug!(path = %path.display(), error = %e, "Failed to remove legacy tile"),
            }
        }
    }

    for dir in legacy_dirs {
        let path = root.join(dir.as_ref());
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
            result.dirs_removed += 1;
        }
    }

    if result.files_removed > 0 || result.dirs_removed > 0 {
        info!(
            root = %root.display(),
            files = result.files_removed,
            dirs = result.dirs_removed,
            "Purged legacy tile cache"
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_is_ok() {
        let dir = TempDir::new().unwrap();
        let result = purge_legacy_cache(&dir.path().join("absent"), &["osm"]).unwrap();
        assert_eq!(result, PurgeResult::default());
    }

    #[test]
    fn test_purges_files_and_named_dirs_only() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("osm-1-3-4-5.png"), b"old").unwrap();
        fs::write(root.join("queue1"), b"old").unwrap();
        fs::create_dir_all(root.join("osm/sub")).unwrap();
        fs::write(root.join("osm/sub/tile.png"), b"old").unwrap();
        fs::create_dir_all(root.join("tiles/osm")).unwrap();
        fs::write(root.join("tiles/osm/osm-1-3-4-5.png"), b"new").unwrap();

        let result = purge_legacy_cache(root, &["osm", "here"]).unwrap();

        assert_eq!(result.files_removed, 2);
        assert_eq!(result.dirs_removed, 1);
        assert!(!root.join("osm").exists());
        assert!(root.join("tiles/osm/osm-1-3-4-5.png").exists());
    }
}
