//! Deletion of redundant representations.
//!
//! | Rule | Candidate                                    | Deleted     | Survivor must be            |
//! |------|----------------------------------------------|-------------|-----------------------------|
//! | 1    | markup or per-page resource                  | plain       | compressed                  |
//! | 2    | script/style source outside the pages dir    | plain       | bundled, archived           |
//! | 3    | script/style source outside the pages dir    | compressed  | plain, bundled, archived    |
//!
//! Keep-set paths are never candidates. A candidate without an identical
//! surviving copy is a precondition violation and stays on disk.

use std::fs;
use std::path::PathBuf;

use crate::asset::{Inventory, RelPath, Representation};
use crate::config::Layout;
use crate::core::{AssetClass, IoResultExt, StageError, StageReport};
use crate::log;
use crate::utils::fmt::format_kib;

use Representation::{Archived, Bundled, Compressed, Plain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    CompressedPage,
    BundledSource,
    SourceSibling,
}

impl Rule {
    const fn target(self) -> Representation {
        match self {
            Self::CompressedPage | Self::BundledSource => Plain,
            Self::SourceSibling => Compressed,
        }
    }

    const fn survivors(self) -> &'static [Representation] {
        match self {
            Self::CompressedPage => &[Compressed],
            Self::BundledSource => &[Bundled, Archived],
            Self::SourceSibling => &[Plain, Bundled, Archived],
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneOutcome {
    pub removed: usize,
    pub refused: usize,
    pub reclaimed: u64,
}

/// Deployment path of a removable representation.
fn target_path(layout: &Layout, rel: &RelPath, rep: Representation) -> PathBuf {
    match rep {
        Compressed => layout.compressed_path(rel),
        _ => layout.deploy_path(rel),
    }
}

fn candidates(layout: &Layout, inventory: &Inventory) -> Vec<(RelPath, Rule)> {
    let mut out = Vec::new();
    for (rel, record) in inventory.iter() {
        if layout.is_kept(rel) {
            continue;
        }
        if layout.is_bundle_source(rel) {
            if record.has(Plain) {
                out.push((rel.clone(), Rule::BundledSource));
            }
            if record.has(Compressed) && !layout.is_kept(&layout.compressed_rel(rel)) {
                out.push((rel.clone(), Rule::SourceSibling));
            }
        } else if (record.class == AssetClass::Markup || layout.is_page_resource(rel))
            && record.has(Plain)
            && record.has(Compressed)
        {
            out.push((rel.clone(), Rule::CompressedPage));
        }
    }
    out
}

/// Delete every provably redundant representation, updating `inventory`.
///
/// With `dry_run`, decisions are logged and the map is updated as if the
/// deletions happened, but nothing on disk changes.
pub fn prune(
    layout: &Layout,
    inventory: &mut Inventory,
    dry_run: bool,
    report: &mut StageReport,
) -> PruneOutcome {
    let mut outcome = PruneOutcome::default();

    for (rel, rule) in candidates(layout, inventory) {
        let target = rule.target();
        let shown = match target {
            Compressed => layout.compressed_rel(&rel),
            _ => rel.clone(),
        };

        let survivor = match inventory.surviving_copy(&rel, target, rule.survivors()) {
            Ok(survivor) => survivor,
            Err(reason) => {
                report.record("prune", StageError::precondition("prune", &shown, reason));
                outcome.refused += 1;
                continue;
            }
        };
        let bytes = inventory
            .get(&rel)
            .and_then(|record| record.get(target))
            .map_or(0, |fp| fp.disk_size);

        if dry_run {
            log!("prune"; "would remove {} ({} bytes, {} copy remains)", shown, bytes, survivor);
        } else {
            let path = target_path(layout, &rel, target);
            if let Err(err) = fs::remove_file(&path).op("remove", &path) {
                report.record("prune", err);
                continue;
            }
            report.removed("prune", &shown, bytes);
        }
        inventory.remove(&rel, target);
        outcome.removed += 1;
        outcome.reclaimed += bytes;
    }

    if outcome.removed > 0 || outcome.refused > 0 {
        log!(
            "prune";
            "{} {} representations, {} refused, {} {}",
            if dry_run { "would remove" } else { "removed" },
            outcome.removed,
            outcome.refused,
            format_kib(outcome.reclaimed),
            if dry_run { "reclaimable" } else { "reclaimed" }
        );
    }
    outcome
}
