//! Inventory scanning (read-only, lazy).

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};

use crate::core::{IoResultExt, StageResult};
use crate::log;

/// Walk every regular file under `root`, sorted by name within each directory.
///
/// Fails if the root is missing or unreadable. Entries that become
/// unreadable mid-walk are skipped with a warning.
pub fn walk_files(root: &Path) -> StageResult<impl Iterator<Item = PathBuf> + use<>> {
    // Check readability up front so a bad root is an error, not an empty walk
    fs::read_dir(root).op("scan", root)?;

    let iter = WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .parallelism(Parallelism::Serial)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log!("warn"; "scan: skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path());

    Ok(iter)
}

/// Plain source files under `root` whose extension is in `extensions`.
///
/// Compressed siblings (names ending in `compressed_suffix`) and the paths in
/// `exclude` (typically the bundle being written) are never yielded.
pub fn scan_sources(
    root: &Path,
    extensions: &[&str],
    exclude: &[PathBuf],
    compressed_suffix: &str,
) -> StageResult<impl Iterator<Item = PathBuf> + use<>> {
    let extensions: Vec<String> = extensions.iter().map(|e| e.to_ascii_lowercase()).collect();
    let exclude = exclude.to_vec();
    let suffix = compressed_suffix.to_string();

    let iter = walk_files(root)?.filter(move |path| {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if !suffix.is_empty() && name.ends_with(suffix.as_str()) {
            return false;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        extensions.contains(&ext) && !exclude.iter().any(|ex| ex == path)
    });

    Ok(iter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn names(root: &Path, paths: Vec<PathBuf>) -> Vec<String> {
        let mut names: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_walk_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        let result = walk_files(&dir.path().join("nope"));
        assert!(result.is_err());
    }

    #[test]
    fn test_walk_file_root_is_error() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.js");
        assert!(walk_files(&dir.path().join("a.js")).is_err());
    }

    #[test]
    fn test_walk_nested() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "index.html");
        touch(dir.path(), "shared/utils.js");
        touch(dir.path(), "pages/motion/motion.html");
        touch(dir.path(), ".hidden");

        let files: Vec<_> = walk_files(dir.path()).unwrap().collect();
        assert_eq!(
            names(dir.path(), files),
            [".hidden", "index.html", "pages/motion/motion.html", "shared/utils.js"]
        );
    }

    #[test]
    fn test_scan_sources_filters() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "bundle.js");
        touch(dir.path(), "bundle.js.gz");
        touch(dir.path(), "shared/utils.js");
        touch(dir.path(), "shared/utils.js.gz");
        touch(dir.path(), "shared/state.JS");
        touch(dir.path(), "css/layout.css");

        let output = dir.path().join("bundle.js");
        let files: Vec<_> = scan_sources(dir.path(), &["js"], &[output], ".gz")
            .unwrap()
            .collect();
        assert_eq!(
            names(dir.path(), files),
            ["shared/state.JS", "shared/utils.js"]
        );
    }
}
