//! Reversible bundling of script and style sources.
//!
//! ```text
//! bundle/
//! ├── marker      # boundary marker syntax
//! ├── bundler     # collect → order → render → write
//! ├── unbundler   # parse → sanitize → write
//! └── sanitize    # entry path rewriting
//! ```

mod bundler;
mod marker;
mod sanitize;
mod unbundler;

pub use bundler::{PreparedBundle, collect_sources, prepare_bundle};
pub use sanitize::sanitize_entry_path;
pub use unbundler::{
    BundleEntry, UnbundleOutcome, WritePolicy, parse_bundle, restore_entries, unbundle_file,
};

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::config::Layout;
use crate::core::{AssetClass, StageError, StageReport};

/// An existing bundle artifact, read into memory.
#[derive(Debug)]
pub struct Artifact {
    pub path: PathBuf,
    pub text: String,
}

/// Read the current bundle of `class`. A missing artifact is not an error;
/// unreadable or non-UTF-8 artifacts are reported.
pub fn read_artifact(layout: &Layout, class: AssetClass, report: &mut StageReport) -> Option<Artifact> {
    let path = layout.deploy_path(layout.bundle_rel(class)?);
    match fs::read(&path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Some(Artifact { path, text }),
            Err(_) => {
                report.record("scan", StageError::parse(&path, "artifact is not UTF-8"));
                None
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            report.record("scan", StageError::io("read", &path, err));
            None
        }
    }
}

/// Entries of the current bundle of `class`; malformed artifacts are
/// reported and yield `None`.
pub fn bundled_entries(
    layout: &Layout,
    class: AssetClass,
    report: &mut StageReport,
) -> Option<Vec<BundleEntry>> {
    let artifact = read_artifact(layout, class, report)?;
    match parse_bundle(&artifact.text) {
        Ok(parsed) => Some(parsed.entries),
        Err(reason) => {
            report.record("bundle", StageError::parse(&artifact.path, reason));
            None
        }
    }
}
