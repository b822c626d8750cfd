//! Orchestration of the staging pipeline.
//!
//! ```text
//! forward:  FULL_SOURCE → BUNDLED → COMPRESSED → MINIMAL
//!           bundle+entry   compress   archive+prune
//! restore:  any state → archive copies → bundle entries → decompressed siblings
//! ```
//!
//! [`Orchestrator`] is the only caller of destructive operations (delete,
//! move, overwrite). It owns the run's [`StageReport`] and rebuilds the
//! [`Inventory`] before every stage, so each stage starts from the real
//! filesystem state and a run interrupted between stages can simply be
//! re-run.

mod entry;
mod forward;
mod restore;
mod state;

pub use state::PipelineState;

use std::path::Path;

use crate::asset::Inventory;
use crate::bundle::{UnbundleOutcome, WritePolicy, unbundle_file};
use crate::config::Layout;
use crate::core::{StageReport, StageResult};
use crate::stage::{self, ArchiveOutcome, PruneOutcome};

pub struct Orchestrator<'a> {
    layout: &'a Layout,
    report: StageReport,
}

impl<'a> Orchestrator<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self {
            layout,
            report: StageReport::new(),
        }
    }

    pub const fn layout(&self) -> &Layout {
        self.layout
    }

    pub const fn report(&self) -> &StageReport {
        &self.report
    }

    pub fn into_report(self) -> StageReport {
        self.report
    }

    /// Scan all roots into a fresh representation map.
    pub fn inventory(&mut self) -> StageResult<Inventory> {
        Inventory::build(self.layout, &mut self.report)
    }

    /// Current inventory and the state it implies.
    pub fn state(&mut self) -> StageResult<(Inventory, PipelineState)> {
        let inventory = self.inventory()?;
        let state = PipelineState::detect(self.layout, &inventory);
        Ok((inventory, state))
    }

    /// Delete redundant representations.
    pub fn prune(&mut self, dry_run: bool) -> StageResult<PruneOutcome> {
        let mut inventory = self.inventory()?;
        Ok(stage::prune(self.layout, &mut inventory, dry_run, &mut self.report))
    }

    /// Move bundled sources to the archive root.
    pub fn archive(&mut self, dry_run: bool) -> StageResult<ArchiveOutcome> {
        let mut inventory = self.inventory()?;
        Ok(stage::archive(self.layout, &mut inventory, dry_run, &mut self.report))
    }

    /// Standalone recovery: reconstruct `artifact` under `dest`, overwriting.
    /// A malformed or unreadable artifact is reported, not fatal.
    pub fn unbundle(&mut self, artifact: &Path, dest: &Path) -> Option<UnbundleOutcome> {
        match unbundle_file(artifact, dest, WritePolicy::Overwrite, &mut self.report) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                self.report.record("unbundle", err);
                None
            }
        }
    }
}
