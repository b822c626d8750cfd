//! Configuration section definitions.
//!
//! | Section      | Purpose                                           |
//! |--------------|---------------------------------------------------|
//! | `[paths]`    | deployment root, archive root, per-page directory |
//! | `[bundle]`   | bundle names, script prelude, priority tables     |
//! | `[entry]`    | entry markup page and cache busting               |
//! | `[compress]` | compressed sibling suffix, level, extensions      |
//! | `[keep]`     | extra keep-set paths                              |
//! | `[archive]`  | archival toggle                                   |

mod bundle;
mod compress;

pub use bundle::BundleConfig;
pub use compress::CompressConfig;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::RelPath;
use crate::config::ConfigDiagnostics;
use crate::core::AssetClass;
use crate::utils::path::is_within;

// ============================================================================
// [paths]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory tree shipped to the target filesystem.
    pub deploy: PathBuf,
    /// Secondary tree receiving relocated per-file sources.
    pub archive: PathBuf,
    /// Directory (relative to `deploy`) whose files the runtime router loads
    /// individually. Never bundled or archived. Empty disables the rule.
    pub pages: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            deploy: "data".into(),
            archive: "data_src".into(),
            pages: "pages".into(),
        }
    }
}

impl PathsConfig {
    pub fn validate(&self, deploy: &Path, archive: &Path, diag: &mut ConfigDiagnostics) {
        if is_within(archive, deploy) {
            diag.error_with_hint(
                "paths.archive",
                format!(
                    "archive root `{}` lies inside the deployment root `{}`",
                    archive.display(),
                    deploy.display()
                ),
                "archived sources would still occupy the target filesystem",
            );
        } else if is_within(deploy, archive) {
            diag.error(
                "paths.deploy",
                format!(
                    "deployment root `{}` lies inside the archive root `{}`",
                    deploy.display(),
                    archive.display()
                ),
            );
        }

        if !self.pages.is_empty() && RelPath::new(&self.pages).is_none() {
            diag.error(
                "paths.pages",
                format!("`{}` is not a relative path inside the deployment root", self.pages),
            );
        }
    }

    /// Reserved per-page directory, if any.
    pub fn pages_dir(&self) -> Option<RelPath> {
        RelPath::new(self.pages.trim_end_matches('/'))
    }
}

// ============================================================================
// [entry]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// Entry markup page loaded first by the browser.
    pub page: String,
    /// Append `?v=<content hash>` to bundle references.
    pub cache_bust: bool,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            page: "index.html".into(),
            cache_bust: true,
        }
    }
}

impl EntryConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match RelPath::new(&self.page) {
            Some(rel) if AssetClass::from_path(rel.as_str()) == AssetClass::Markup => {}
            Some(_) => diag.error("entry.page", format!("`{}` is not a markup file", self.page)),
            None => diag.error("entry.page", format!("`{}` is not a valid relative path", self.page)),
        }
    }
}

// ============================================================================
// [keep]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepConfig {
    /// Static files kept in addition to the entry page and the bundles.
    pub extra: Vec<String>,
}

impl Default for KeepConfig {
    fn default() -> Self {
        Self {
            extra: vec!["favicon.ico".into()],
        }
    }
}

impl KeepConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (idx, path) in self.extra.iter().enumerate() {
            if RelPath::new(path).is_none() {
                diag.error(
                    "keep.extra",
                    format!("[{idx}] `{path}` is not a valid relative path"),
                );
            }
        }
    }
}

// ============================================================================
// [archive]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Move bundled sources to the archive root during `deploy`.
    /// When disabled, bundled sources are only pruned.
    pub enabled: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
