//! Relocation of bundled sources to the archive root.

use std::fs;
use std::io;
use std::path::Path;

use crate::asset::{Inventory, RelPath, Representation};
use crate::config::Layout;
use crate::core::{IoResultExt, StageError, StageReport, StageResult};
use crate::freshness::ContentHash;
use crate::{debug, log};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub moved: usize,
    /// Destination already held identical bytes.
    pub already: usize,
    /// Not (identically) captured in a bundle yet.
    pub skipped: usize,
    pub refused: usize,
}

/// Move every bundled script/style source out of the deployment root.
///
/// A source is only moved once its content is verified present in a bundle.
/// An existing destination is never overwritten: identical bytes count as
/// already archived, anything else is a precondition violation.
pub fn archive(
    layout: &Layout,
    inventory: &mut Inventory,
    dry_run: bool,
    report: &mut StageReport,
) -> ArchiveOutcome {
    let mut outcome = ArchiveOutcome::default();

    let sources: Vec<RelPath> = inventory
        .iter()
        .filter(|(rel, record)| record.has(Representation::Plain) && layout.is_bundle_source(rel))
        .map(|(rel, _)| rel.clone())
        .collect();

    for rel in sources {
        if let Err(reason) =
            inventory.surviving_copy(&rel, Representation::Plain, &[Representation::Bundled])
        {
            report.skip("archive", &rel, &format!("not captured in a bundle: {reason}"));
            outcome.skipped += 1;
            continue;
        }
        let Some(plain) = inventory
            .get(&rel)
            .and_then(|record| record.get(Representation::Plain))
            .copied()
        else {
            continue;
        };

        let src = layout.deploy_path(&rel);
        let dst = layout.archive_path(&rel);

        if dst.exists() {
            match fs::read(&dst).op("read", &dst) {
                Ok(bytes) if ContentHash::of(&bytes) == plain.exact => {
                    debug!("archive"; "{} already archived", rel);
                    inventory.insert(rel, Representation::Archived, plain);
                    outcome.already += 1;
                }
                Ok(_) => {
                    report.record(
                        "archive",
                        StageError::precondition(
                            "archive",
                            &rel,
                            format!("destination `{}` exists with different content", dst.display()),
                        ),
                    );
                    outcome.refused += 1;
                }
                Err(err) => report.record("archive", err),
            }
            continue;
        }

        if dry_run {
            log!("archive"; "would move {} ({} bytes)", rel, plain.disk_size);
        } else {
            if let Err(err) = relocate(&src, &dst) {
                report.record("archive", err);
                continue;
            }
            report.moved("archive", &rel, plain.disk_size);
        }
        inventory.insert(rel.clone(), Representation::Archived, plain);
        inventory.remove(&rel, Representation::Plain);
        outcome.moved += 1;
    }

    if outcome.moved + outcome.already + outcome.refused > 0 {
        log!(
            "archive";
            "{} {}, {} already archived, {} skipped, {} refused",
            if dry_run { "would move" } else { "moved" },
            outcome.moved, outcome.already, outcome.skipped, outcome.refused
        );
    }
    outcome
}

/// Rename, falling back to copy + remove across filesystems.
fn relocate(src: &Path, dst: &Path) -> StageResult<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).op("create directory", parent)?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StageError::io("move", src, err)),
        Err(_) => {
            fs::copy(src, dst).op("copy", src)?;
            fs::remove_file(src).op("remove", src)
        }
    }
}
