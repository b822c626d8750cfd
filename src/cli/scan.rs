//! Scan command implementation.
//!
//! Prints the representation map: every asset with its class, the copies
//! that exist and whether it belongs to the keep-set, followed by the
//! detected pipeline state.

use std::io::{Write, stdout};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::asset::{Inventory, RelPath, Representation, log_overview};
use crate::config::Layout;
use crate::core::AssetClass;
use crate::freshness::ContentHash;
use crate::log;
use crate::pipeline::{Orchestrator, PipelineState};

#[derive(Debug, Serialize)]
pub struct CopyRow {
    pub kind: Representation,
    pub hash: ContentHash,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct AssetRow<'a> {
    pub path: &'a RelPath,
    pub class: AssetClass,
    pub kept: bool,
    pub copies: Vec<CopyRow>,
}

#[derive(Debug, Serialize)]
pub struct ScanResult<'a> {
    pub deploy_root: &'a Path,
    pub archive_root: &'a Path,
    pub state: PipelineState,
    pub assets: Vec<AssetRow<'a>>,
}

/// Collect the report rows for `inventory`.
pub fn scan_result<'a>(
    layout: &'a Layout,
    inventory: &'a Inventory,
    state: PipelineState,
) -> ScanResult<'a> {
    let assets = inventory
        .iter()
        .map(|(rel, record)| AssetRow {
            path: rel,
            class: record.class,
            kept: layout.is_kept(rel),
            copies: record
                .present()
                .filter_map(|kind| {
                    let fp = record.get(kind)?;
                    Some(CopyRow {
                        kind,
                        hash: fp.exact,
                        size: fp.disk_size,
                    })
                })
                .collect(),
        })
        .collect();

    ScanResult {
        deploy_root: &layout.deploy_root,
        archive_root: &layout.archive_root,
        state,
        assets,
    }
}

/// Execute scan command
pub fn run_scan(orch: &mut Orchestrator<'_>, json: bool) -> Result<()> {
    let (inventory, state) = orch.state()?;
    let result = scan_result(orch.layout(), &inventory, state);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut out = stdout().lock();
    for row in &result.assets {
        let copies: Vec<_> = row.copies.iter().map(|c| c.kind.name()).collect();
        writeln!(
            out,
            "{:<44} {:<7} {}{}",
            row.path.as_str(),
            row.class.name(),
            copies.join(","),
            if row.kept { "  (keep)" } else { "" }
        )?;
    }
    drop(out);

    log_overview(&inventory);
    log!("state"; "deployment tree is {}", state);
    Ok(())
}
