//! The representation map.
//!
//! One in-memory map from relative path to every copy of that asset known to
//! exist: the plain file in the deployment root, its compressed sibling, its
//! entry inside a bundle artifact, and its relocated copy in the archive
//! root. Every destructive stage asks [`Inventory::surviving_copy`] before it
//! deletes or moves anything, and updates the map afterwards, so all stages
//! share one source of truth.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;

use serde::Serialize;

use crate::bundle;
use crate::config::Layout;
use crate::core::{AssetClass, IoResultExt, StageError, StageReport, StageResult};
use crate::freshness::Fingerprint;
use crate::stage::compress::decompress_bytes;
use crate::{debug, log};

use super::{RelPath, walk_files};

/// Kind of materialized copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Original file at its relative path in the deployment root.
    Plain,
    /// Sibling at `path + suffix` in the deployment root.
    Compressed,
    /// Entry inside a bundle artifact.
    Bundled,
    /// Copy at the same relative path in the archive root.
    Archived,
}

impl Representation {
    pub const ALL: [Self; 4] = [Self::Plain, Self::Compressed, Self::Bundled, Self::Archived];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Compressed => "compressed",
            Self::Bundled => "bundled",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All known copies of one asset.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    pub class: AssetClass,
    copies: [Option<Fingerprint>; 4],
}

impl AssetRecord {
    fn new(class: AssetClass) -> Self {
        Self {
            class,
            copies: [None; 4],
        }
    }

    #[inline]
    pub fn get(&self, rep: Representation) -> Option<&Fingerprint> {
        self.copies[rep.index()].as_ref()
    }

    #[inline]
    pub fn has(&self, rep: Representation) -> bool {
        self.copies[rep.index()].is_some()
    }

    /// Representations currently present, in canonical order.
    pub fn present(&self) -> impl Iterator<Item = Representation> + '_ {
        Representation::ALL.into_iter().filter(|rep| self.has(*rep))
    }

    pub fn is_empty(&self) -> bool {
        self.copies.iter().all(Option::is_none)
    }
}

#[derive(Debug, Default)]
pub struct Inventory {
    records: BTreeMap<RelPath, AssetRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the deployment root, the bundle artifacts and the archive root.
    ///
    /// Only a missing or unreadable deployment root is fatal; unreadable
    /// files, corrupt siblings and malformed bundles are reported and left
    /// out of the map (so they can never serve as a surviving copy).
    pub fn build(layout: &Layout, report: &mut StageReport) -> StageResult<Self> {
        let mut inventory = Self::new();
        inventory.scan_deploy(layout, report)?;
        inventory.scan_bundles(layout, report);
        inventory.scan_archive(layout, report);
        debug!("scan"; "tracked {} assets", inventory.len());
        Ok(inventory)
    }

    fn scan_deploy(&mut self, layout: &Layout, report: &mut StageReport) -> StageResult<()> {
        for path in walk_files(&layout.deploy_root)? {
            let Some(rel) = RelPath::from_root(&layout.deploy_root, &path) else {
                report.skip("scan", path.display(), "path is not valid UTF-8 or not relative");
                continue;
            };
            let bytes = match fs::read(&path).op("read", &path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    report.record("scan", err);
                    continue;
                }
            };
            let disk_size = bytes.len() as u64;

            match layout.split_compressed(&rel) {
                Some(plain) => match decompress_bytes(&bytes) {
                    Ok(content) => {
                        self.insert(plain, Representation::Compressed, Fingerprint::new(&content, disk_size));
                    }
                    Err(err) => report.record("scan", StageError::io("decompress", &path, err)),
                },
                None => self.insert(rel, Representation::Plain, Fingerprint::new(&bytes, disk_size)),
            }
        }
        Ok(())
    }

    fn scan_bundles(&mut self, layout: &Layout, report: &mut StageReport) {
        for class in AssetClass::BUNDLED {
            let Some(artifact) = bundle::read_artifact(layout, class, report) else {
                continue;
            };
            let parsed = match bundle::parse_bundle(&artifact.text) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    report.record("scan", StageError::parse(&artifact.path, reason));
                    continue;
                }
            };
            // Tracked under the path restore would write it to, and only
            // when that is the path the marker names
            for entry in parsed.entries {
                match bundle::sanitize_entry_path(&entry.path) {
                    Some(rel) if rel.as_str() == entry.path => self.insert(
                        rel,
                        Representation::Bundled,
                        Fingerprint::new(entry.content.as_bytes(), 0),
                    ),
                    _ => report.skip("scan", &entry.path, "bundle entry path is rewritten on restore"),
                }
            }
        }
    }

    fn scan_archive(&mut self, layout: &Layout, report: &mut StageReport) {
        if !layout.archive_root.is_dir() {
            return;
        }
        let files = match walk_files(&layout.archive_root) {
            Ok(files) => files,
            Err(err) => {
                report.record("scan", err);
                return;
            }
        };
        for path in files {
            let Some(rel) = RelPath::from_root(&layout.archive_root, &path) else {
                continue;
            };
            match fs::read(&path).op("read", &path) {
                Ok(bytes) => {
                    let size = bytes.len() as u64;
                    self.insert(rel, Representation::Archived, Fingerprint::new(&bytes, size));
                }
                Err(err) => report.record("scan", err),
            }
        }
    }

    /// Record that `rep` of `rel` exists with the given content.
    pub fn insert(&mut self, rel: RelPath, rep: Representation, fingerprint: Fingerprint) {
        let class = AssetClass::from_path(rel.as_str());
        self.records
            .entry(rel)
            .or_insert_with(|| AssetRecord::new(class))
            .copies[rep.index()] = Some(fingerprint);
    }

    /// Record that `rep` of `rel` no longer exists.
    pub fn remove(&mut self, rel: &RelPath, rep: Representation) -> Option<Fingerprint> {
        let record = self.records.get_mut(rel)?;
        let removed = record.copies[rep.index()].take();
        if record.is_empty() {
            self.records.remove(rel);
        }
        removed
    }

    pub fn get(&self, rel: &RelPath) -> Option<&AssetRecord> {
        self.records.get(rel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelPath, &AssetRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Find a copy, other than `target`, that holds the same content.
    ///
    /// Only representations listed in `allowed` count as survivors. Content
    /// involving a bundled copy is compared modulo one trailing newline.
    /// Returns the reason for refusal when no such copy exists.
    pub fn surviving_copy(
        &self,
        rel: &RelPath,
        target: Representation,
        allowed: &[Representation],
    ) -> Result<Representation, String> {
        let record = self
            .records
            .get(rel)
            .ok_or_else(|| "asset is not tracked".to_string())?;
        let target_fp = record
            .get(target)
            .ok_or_else(|| format!("no {target} copy exists"))?;

        let mut notes = Vec::new();
        for &rep in allowed {
            if rep == target {
                continue;
            }
            match record.get(rep) {
                Some(fp) => {
                    let loose = rep == Representation::Bundled || target == Representation::Bundled;
                    if fp.same_content(target_fp, loose) {
                        return Ok(rep);
                    }
                    notes.push(format!("{rep} copy differs"));
                }
                None => notes.push(format!("no {rep} copy")),
            }
        }
        Err(format!(
            "would remove the last copy of its content ({})",
            notes.join(", ")
        ))
    }
}

/// Log a one-line overview of the map.
pub fn log_overview(inventory: &Inventory) {
    let mut counts = [0usize; 4];
    for (_, record) in inventory.iter() {
        for rep in record.present() {
            counts[rep.index()] += 1;
        }
    }
    log!(
        "scan";
        "{} assets: {} plain, {} compressed, {} bundled, {} archived",
        inventory.len(), counts[0], counts[1], counts[2], counts[3]
    );
}
