//! Filesystem path helpers.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` unless it is already absolute.
///
/// The result is lexically cleaned (`.` dropped, `..` folded) but symlinks
/// are not resolved, so it works for paths that do not exist yet.
pub fn resolve_against(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    clean(&joined)
}

/// Lexically normalize a path.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Whether `inner` equals `outer` or lies beneath it (lexical check).
pub fn is_within(inner: &Path, outer: &Path) -> bool {
    clean(inner).starts_with(clean(outer))
}

/// Append a suffix to the final component (`a/b.js` + `.gz` -> `a/b.js.gz`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_against() {
        assert_eq!(
            resolve_against(Path::new("data"), Path::new("/proj")),
            PathBuf::from("/proj/data")
        );
        assert_eq!(
            resolve_against(Path::new("../data_src"), Path::new("/proj/web")),
            PathBuf::from("/proj/data_src")
        );
        assert_eq!(
            resolve_against(Path::new("/abs/data"), Path::new("/proj")),
            PathBuf::from("/abs/data")
        );
    }

    #[test]
    fn test_is_within() {
        assert!(is_within(Path::new("/p/data/src"), Path::new("/p/data")));
        assert!(is_within(Path::new("/p/data"), Path::new("/p/data")));
        assert!(!is_within(Path::new("/p/data_src"), Path::new("/p/data")));
        assert!(!is_within(Path::new("/p/data/../x"), Path::new("/p/data")));
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("/d/bundle.js"), ".gz"),
            PathBuf::from("/d/bundle.js.gz")
        );
    }
}
