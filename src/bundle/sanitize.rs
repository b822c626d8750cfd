//! Entry path sanitization for unbundling.

use crate::asset::RelPath;

/// Turn a path decoded from a marker into one that stays inside the
/// destination root.
///
/// Backslashes become separators and empty or `.` segments are dropped.
/// A path that tries to escape (`..`, absolute, drive prefix) is flattened
/// into one file name built from its remaining normal segments, so
/// `../secret` becomes `secret` and `/etc/passwd` becomes `etc_passwd`.
/// Returns `None` when nothing usable is left.
pub fn sanitize_entry_path(raw: &str) -> Option<RelPath> {
    let raw = raw.trim();
    if raw.contains('\0') {
        return None;
    }
    let unified = raw.replace('\\', "/");
    let escaping = unified.starts_with('/')
        || unified.contains(':')
        || unified.split('/').any(|seg| seg == "..");

    let segments = unified
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..");

    if escaping {
        let flat = segments
            .map(|seg| seg.replace(':', "_"))
            .filter(|seg| !seg.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        RelPath::new(flat)
    } else {
        RelPath::new(segments.collect::<Vec<_>>().join("/"))
    }
}
