//! Forward flow: bundle, compress, archive, prune.

use std::fs;
use std::path::{Path, PathBuf};

use crate::asset::version::compute_version;
use crate::asset::{AssetRecord, Inventory, RelPath, Representation};
use crate::bundle::{PreparedBundle, collect_sources, prepare_bundle};
use crate::core::{AssetClass, StageError, StageResult};
use crate::freshness::{Fingerprint, get_mtime, is_newer_than};
use crate::stage::{self, CompressOutcome, compress_file};
use crate::utils::fmt::plural_count;
use crate::{debug, log};

use super::entry::{EntryRefs, update_entry_page};
use super::{Orchestrator, PipelineState};

/// Result of a bundling pass.
#[derive(Debug, Default)]
pub struct BundleRun {
    /// Artifacts whose bytes changed.
    pub written: Vec<RelPath>,
    /// Artifacts regenerated with identical bytes.
    pub unchanged: Vec<RelPath>,
    pub entry_rewritten: bool,
}

/// How many entries a guard violation lists.
const GUARD_SHOWN: usize = 5;

fn shown(paths: &[&str]) -> String {
    let mut out = paths.iter().take(GUARD_SHOWN).copied().collect::<Vec<_>>().join(", ");
    if paths.len() > GUARD_SHOWN {
        out.push_str(", ...");
    }
    out
}

impl Orchestrator<'_> {
    /// Regenerate the bundles of `classes` and point the entry page at them.
    ///
    /// A bundle is not overwritten when that would lose the content of one
    /// of its current entries.
    pub fn bundle(&mut self, classes: &[AssetClass]) -> StageResult<BundleRun> {
        let inventory = self.inventory()?;
        let mut run = BundleRun::default();
        let mut refs = Vec::new();

        for &class in classes {
            let Some(bundle_rel) = self.layout.bundle_rel(class).cloned() else {
                continue;
            };
            let Some(prepared) = prepare_bundle(self.layout, class, &mut self.report)? else {
                log!("bundle"; "no {} sources, {} left as is", class, bundle_rel);
                continue;
            };
            if let Err(err) = self.guard_overwrite(&inventory, &prepared, &bundle_rel) {
                self.report.record("bundle", err);
                continue;
            }

            if fs::read(&prepared.path).is_ok_and(|old| old == prepared.text.as_bytes()) {
                debug!("bundle"; "{} unchanged", bundle_rel);
                run.unchanged.push(bundle_rel.clone());
            } else {
                prepared.write(&mut self.report)?;
                run.written.push(bundle_rel.clone());
            }

            refs.push(EntryRefs {
                class,
                version: self
                    .layout
                    .cache_bust
                    .then(|| compute_version(prepared.text.as_bytes())),
                sources: prepared.entry_paths().cloned().collect(),
                bundle: bundle_rel,
            });
        }

        if !refs.is_empty() {
            run.entry_rewritten = update_entry_page(self.layout, &refs, &mut self.report)?;
            if run.entry_rewritten {
                log!("entry"; "updated bundle references in {}", self.layout.entry_page);
            }
        }
        Ok(run)
    }

    /// Refuse when an entry of the current bundle would vanish without a
    /// plain copy, or would change while its old content survives nowhere
    /// else and the plain file was not edited since the bundle was written.
    fn guard_overwrite(
        &self,
        inventory: &Inventory,
        prepared: &PreparedBundle,
        bundle_rel: &RelPath,
    ) -> Result<(), StageError> {
        let artifact = self.layout.deploy_path(bundle_rel);
        let mut vanished = Vec::new();
        let mut replaced = Vec::new();

        for (rel, record) in inventory.iter() {
            let Some(old) = record.get(Representation::Bundled) else {
                continue;
            };
            if record.class != prepared.class {
                continue;
            }
            match prepared.entries.iter().find(|(entry, _)| entry == rel) {
                None if !record.has(Representation::Plain) => vanished.push(rel.as_str()),
                None => {}
                Some((_, content)) => {
                    let new = Fingerprint::new(content.as_bytes(), 0);
                    if new.same_content(old, true)
                        || inventory
                            .surviving_copy(rel, Representation::Bundled, &[Representation::Archived])
                            .is_ok()
                        || self.edited_since(rel, record, &artifact)
                    {
                        continue;
                    }
                    replaced.push(rel.as_str());
                }
            }
        }

        let mut problems = Vec::new();
        if !vanished.is_empty() {
            problems.push(format!(
                "drop {} with no plain copy ({})",
                plural_count(vanished.len(), "entry"),
                shown(&vanished)
            ));
        }
        if !replaced.is_empty() {
            problems.push(format!(
                "replace {} whose content exists nowhere else ({})",
                plural_count(replaced.len(), "entry"),
                shown(&replaced)
            ));
        }
        if problems.is_empty() {
            return Ok(());
        }
        Err(StageError::precondition(
            "bundle",
            bundle_rel,
            format!("regenerating would {}; run `restore` first", problems.join(" and ")),
        ))
    }

    /// The plain file changed after `artifact` was written and does not
    /// merely repeat the archived copy.
    fn edited_since(&self, rel: &RelPath, record: &AssetRecord, artifact: &Path) -> bool {
        let (Some(plain), archived) = (
            record.get(Representation::Plain),
            record.get(Representation::Archived),
        ) else {
            return false;
        };
        if archived.is_some_and(|archived| archived.same_content(plain, false)) {
            return false;
        }
        is_newer_than(&self.layout.deploy_path(rel), artifact)
    }

    /// Whether a bundle is missing or older than one of its sources.
    fn bundles_stale(&self) -> StageResult<bool> {
        for class in AssetClass::BUNDLED {
            let Some(bundle_rel) = self.layout.bundle_rel(class) else {
                continue;
            };
            let artifact = self.layout.deploy_path(bundle_rel);
            let sources = collect_sources(self.layout, class)?;
            if sources.is_empty() {
                continue;
            }
            if get_mtime(&artifact).is_none() {
                return Ok(true);
            }
            if let Some(newer) = sources
                .iter()
                .find(|rel| is_newer_than(&self.layout.deploy_path(rel), &artifact))
            {
                debug!("bundle"; "{} is newer than {}", newer, bundle_rel);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Compress `paths`, or the deployment set when empty: keep-set files,
    /// markup and per-page resources with a configured extension.
    pub fn compress(&mut self, paths: &[PathBuf]) -> StageResult<usize> {
        let targets: Vec<PathBuf> = if paths.is_empty() {
            let inventory = self.inventory()?;
            inventory
                .iter()
                .filter(|(rel, record)| {
                    record.has(Representation::Plain) && self.layout.should_compress(rel)
                })
                .map(|(rel, _)| self.layout.deploy_path(rel))
                .collect()
        } else {
            paths.to_vec()
        };

        let mut written = 0;
        for src in &targets {
            let dst = stage::compress::compressed_path(src, &self.layout.suffix);
            match compress_file(src, &dst, self.layout.level) {
                Ok(CompressOutcome::Written(bytes)) => {
                    self.report.written("compress", dst.display());
                    debug!("compress"; "{} ({} bytes)", dst.display(), bytes);
                    written += 1;
                }
                Ok(CompressOutcome::Fresh) => {}
                Err(err) => self.report.record("compress", err),
            }
        }
        log!(
            "compress";
            "{} written, {} up to date",
            plural_count(written, "sibling"),
            targets.len() - written
        );
        Ok(written)
    }

    /// Run the forward flow up to `until`. Stages already reached are not
    /// repeated, so a second run changes nothing.
    pub fn deploy(&mut self, until: PipelineState) -> StageResult<PipelineState> {
        let (_, state) = self.state()?;
        log!("state"; "deployment tree is {}", state);

        if state <= PipelineState::Bundled || self.bundles_stale()? {
            self.bundle(&AssetClass::BUNDLED)?;
        }
        if until >= PipelineState::Compressed {
            self.compress(&[])?;
        }
        if until >= PipelineState::Minimal {
            let mut inventory = self.inventory()?;
            if self.layout.archive_enabled {
                stage::archive(self.layout, &mut inventory, false, &mut self.report);
            }
            stage::prune(self.layout, &mut inventory, false, &mut self.report);
        }

        let (_, reached) = self.state()?;
        log!("state"; "deployment tree is now {}", reached);
        Ok(reached)
    }
}
