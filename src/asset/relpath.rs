//! Relative asset paths - the identity key of every asset.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

/// A `/`-separated path relative to a root, free of `.`/`..` and absolute
/// prefixes. Joining it onto any root can never escape that root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RelPath(String);

impl RelPath {
    /// Validate a relative path string. Returns `None` for empty, absolute,
    /// traversing or backslash-containing paths.
    pub fn new<S: AsRef<str>>(raw: S) -> Option<Self> {
        let raw = raw.as_ref();
        if raw.is_empty() || raw.starts_with('/') || raw.contains(['\\', '\0']) {
            return None;
        }
        let valid = raw
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
        valid.then(|| Self(raw.to_string()))
    }

    /// Relative path of `path` under `root`.
    pub fn from_root(root: &Path, path: &Path) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?;
        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(seg) => segments.push(seg.to_str()?),
                _ => return None,
            }
        }
        Self::new(segments.join("/"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Materialize under a root.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }

    /// Final segment (`shared/utils.js` -> `utils.js`).
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Final segment without its last extension (`utils.js` -> `utils`).
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Directory part, empty for top-level files.
    pub fn parent(&self) -> &str {
        self.0.rfind('/').map_or("", |idx| &self.0[..idx])
    }

    /// Whether this path lies beneath directory `dir`.
    pub fn is_under(&self, dir: &Self) -> bool {
        self.0
            .strip_prefix(dir.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Append a suffix to the final segment.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }

    /// Strip a suffix from the final segment, if the rest is still a name.
    pub fn strip_suffix(&self, suffix: &str) -> Option<Self> {
        let stripped = self.0.strip_suffix(suffix)?;
        Self::new(stripped)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
