//! Reverse flow: rebuild the per-file source tree from whatever copies the
//! forward flow left behind.
//!
//! Never overwrites a present plain file, so restoring is idempotent and
//! cannot clobber newer edits. Bundles stay in place.

use std::fs;
use std::path::Path;

use crate::asset::{Inventory, RelPath, Representation, walk_files};
use crate::bundle::{WritePolicy, bundled_entries, restore_entries};
use crate::core::{AssetClass, IoResultExt, StageResult};
use crate::stage::decompress_file;
use crate::{debug, log};

use super::Orchestrator;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub from_archive: usize,
    pub from_bundles: usize,
    pub decompressed: usize,
    /// Plain files already present and left untouched.
    pub kept: usize,
}

impl RestoreOutcome {
    pub const fn restored(&self) -> usize {
        self.from_archive + self.from_bundles + self.decompressed
    }
}

impl Orchestrator<'_> {
    /// Copy archive files back, unbundle, then decompress siblings; each
    /// step skips paths that already have a plain file.
    ///
    /// An archive copy that disagrees with the bundle is left for the bundle
    /// step: bundles are regenerated from edited sources, the archive never
    /// is.
    pub fn restore(&mut self) -> StageResult<RestoreOutcome> {
        let mut outcome = RestoreOutcome::default();
        let inventory = self.inventory()?;
        self.restore_from_archive(&inventory, &mut outcome);

        for class in AssetClass::BUNDLED {
            let Some(entries) = bundled_entries(self.layout, class, &mut self.report) else {
                continue;
            };
            let unbundled = restore_entries(
                &entries,
                &self.layout.deploy_root,
                WritePolicy::KeepExisting,
                &mut self.report,
            );
            outcome.from_bundles += unbundled.written.len();
            outcome.kept += unbundled.kept;
        }

        let inventory = self.inventory()?;
        for (rel, record) in inventory.iter() {
            if !record.has(Representation::Compressed) || record.has(Representation::Plain) {
                continue;
            }
            let src = self.layout.compressed_path(rel);
            let dst = self.layout.deploy_path(rel);
            match decompress_file(&src, &dst) {
                Ok(bytes) => {
                    debug!("restore"; "decompressed {} ({} bytes)", rel, bytes);
                    self.report.written("restore", rel);
                    outcome.decompressed += 1;
                }
                Err(err) => self.report.record("restore", err),
            }
        }

        log!(
            "restore";
            "{} from archive, {} from bundles, {} decompressed, {} already present",
            outcome.from_archive, outcome.from_bundles, outcome.decompressed, outcome.kept
        );
        Ok(outcome)
    }

    /// Copy (not move) so the archive stays a surviving copy.
    fn restore_from_archive(&mut self, inventory: &Inventory, outcome: &mut RestoreOutcome) {
        let root = &self.layout.archive_root;
        if !root.is_dir() {
            debug!("restore"; "no archive at {}", root.display());
            return;
        }
        let files = match walk_files(root) {
            Ok(files) => files,
            Err(err) => {
                self.report.record("restore", err);
                return;
            }
        };

        for path in files {
            let Some(rel) = RelPath::from_root(root, &path) else {
                self.report.skip("restore", path.display(), "path is not valid UTF-8");
                continue;
            };
            let dst = self.layout.deploy_path(&rel);
            if dst.exists() {
                outcome.kept += 1;
                continue;
            }
            if superseded_by_bundle(inventory, &rel) {
                self.report
                    .skip("restore", &rel, "archive copy differs from the bundled entry, using the bundle");
                continue;
            }
            match copy_into(&path, &dst) {
                Ok(()) => {
                    self.report.written("restore", &rel);
                    outcome.from_archive += 1;
                }
                Err(err) => self.report.record("restore", err),
            }
        }
    }
}

/// The bundle holds different content for `rel` than the archive does.
fn superseded_by_bundle(inventory: &Inventory, rel: &RelPath) -> bool {
    let Some(record) = inventory.get(rel) else {
        return false;
    };
    match (
        record.get(Representation::Archived),
        record.get(Representation::Bundled),
    ) {
        (Some(archived), Some(bundled)) => !archived.same_content(bundled, true),
        _ => false,
    }
}

fn copy_into(src: &Path, dst: &Path) -> StageResult<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).op("create directory", parent)?;
    }
    fs::copy(src, dst).op("copy", src)?;
    Ok(())
}
