//! Mtime-based freshness detection for derived files.
//!
//! Used by the compressor (sibling vs. plain source) and by the orchestrator
//! (bundle artifact vs. its per-file sources).

use std::path::Path;
use std::time::SystemTime;

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Check if file A is newer than file B
///
/// Returns `true` if A exists and is newer than B
/// Returns `false` if either file doesn't exist or times can't be compared
pub fn is_newer_than(a: &Path, b: &Path) -> bool {
    let (Some(a_time), Some(b_time)) = (get_mtime(a), get_mtime(b)) else {
        return false;
    };
    a_time > b_time
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_is_newer_than() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.js");
        let b = dir.path().join("a.js.gz");
        fs::write(&a, "var a;").unwrap();
        thread::sleep(Duration::from_millis(20));
        fs::write(&b, "gz").unwrap();

        assert!(is_newer_than(&b, &a));
        assert!(!is_newer_than(&a, &b));
    }

    #[test]
    fn test_missing_file_is_never_newer() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.js");
        fs::write(&a, "var a;").unwrap();
        let missing = dir.path().join("missing");

        assert!(get_mtime(&missing).is_none());
        assert!(!is_newer_than(&missing, &a));
        assert!(!is_newer_than(&a, &missing));
    }
}
