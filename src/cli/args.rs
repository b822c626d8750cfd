//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::AssetClass;
use crate::pipeline::PipelineState;

/// Stage web-ui assets for a storage-constrained filesystem
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: assetstage.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Deployment root (overrides `paths.deploy`)
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Archive root (overrides `paths.archive`)
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub archive: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show every asset, its representations and the pipeline state
    Scan {
        /// Print the inventory as JSON
        #[arg(long)]
        json: bool,
    },

    /// Regenerate bundles and rewrite entry page references
    #[command(visible_alias = "b")]
    Bundle {
        /// Only this asset class (default: both)
        #[arg(long, value_enum)]
        class: Option<ClassArg>,
    },

    /// Reconstruct per-file sources from a bundle artifact (overwrites)
    Unbundle {
        /// Bundle artifact to read
        #[arg(value_hint = clap::ValueHint::FilePath)]
        artifact: PathBuf,

        /// Destination root (default: the deployment root)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        dest: Option<PathBuf>,
    },

    /// Write compressed siblings
    Compress {
        /// Files to compress. If omitted, compresses the deployment set.
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Delete redundant representations
    Prune {
        /// Report what would be removed without removing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Move bundled sources to the archive root
    Archive {
        /// Report what would be moved without moving anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Run the forward flow
    #[command(visible_alias = "d")]
    Deploy {
        /// Last state to reach
        #[arg(long, value_enum, default_value = "minimal")]
        until: UntilArg,
    },

    /// Rebuild the per-file source tree (never overwrites)
    #[command(visible_alias = "r")]
    Restore,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassArg {
    Script,
    Style,
}

impl From<ClassArg> for AssetClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Script => Self::Script,
            ClassArg::Style => Self::Style,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UntilArg {
    Bundled,
    Compressed,
    Minimal,
}

impl From<UntilArg> for PipelineState {
    fn from(arg: UntilArg) -> Self {
        match arg {
            UntilArg::Bundled => Self::Bundled,
            UntilArg::Compressed => Self::Compressed,
            UntilArg::Minimal => Self::Minimal,
        }
    }
}
