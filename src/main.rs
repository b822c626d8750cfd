//! assetstage - stage web-ui assets for a storage-constrained filesystem.

mod asset;
mod bundle;
mod cli;
mod config;
mod core;
mod freshness;
mod logger;
mod pipeline;
mod stage;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::StageConfig;
use core::AssetClass;
use pipeline::Orchestrator;
use utils::path::resolve_against;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = StageConfig::load(&cli)?;
    let layout = config.layout()?;
    debug!(
        "config";
        "deploy root {}, archive root {}",
        layout.deploy_root.display(),
        layout.archive_root.display()
    );

    let mut orch = Orchestrator::new(&layout);
    run(&cli.command, &mut orch)?;

    let report = orch.into_report();
    if !matches!(cli.command, Commands::Scan { .. }) {
        report.print_summary();
    }
    Ok(report.exit_code())
}

fn run(command: &Commands, orch: &mut Orchestrator<'_>) -> Result<()> {
    match command {
        Commands::Scan { json } => cli::scan::run_scan(orch, *json)?,
        Commands::Bundle { class } => {
            let classes = match class {
                Some(class) => vec![AssetClass::from(*class)],
                None => AssetClass::BUNDLED.to_vec(),
            };
            orch.bundle(&classes).context("Bundling failed")?;
        }
        Commands::Unbundle { artifact, dest } => {
            let cwd = current_dir()?;
            let artifact = resolve_against(artifact, &cwd);
            let dest = dest.as_deref().map_or_else(
                || orch.layout().deploy_root.clone(),
                |dest| resolve_against(dest, &cwd),
            );
            orch.unbundle(&artifact, &dest);
        }
        Commands::Compress { paths } => {
            let cwd = current_dir()?;
            let paths: Vec<PathBuf> = paths.iter().map(|p| resolve_against(p, &cwd)).collect();
            orch.compress(&paths).context("Compression failed")?;
        }
        Commands::Prune { dry_run } => {
            orch.prune(*dry_run).context("Pruning failed")?;
        }
        Commands::Archive { dry_run } => {
            orch.archive(*dry_run).context("Archival failed")?;
        }
        Commands::Deploy { until } => {
            orch.deploy((*until).into()).context("Deploy failed")?;
        }
        Commands::Restore => {
            orch.restore().context("Restore failed")?;
        }
    }
    Ok(())
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current working directory")
}
