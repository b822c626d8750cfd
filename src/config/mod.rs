//! Stage configuration management for `assetstage.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [paths] [bundle] [entry] [compress] [keep] [archive]
//! ├── error          # ConfigError, ConfigDiagnostics
//! ├── layout         # Layout: resolved configuration handed to every stage
//! ├── util           # config file discovery
//! └── mod.rs         # StageConfig (this file)
//! ```
//!
//! The keep-set and the priority tables are defined here and nowhere else;
//! every stage receives them through [`Layout`].

mod error;
mod layout;
pub mod section;
mod util;

pub use error::{ConfigDiagnostics, ConfigError};
pub use layout::Layout;

use section::{ArchiveConfig, BundleConfig, CompressConfig, EntryConfig, KeepConfig, PathsConfig};
use util::find_config_file;

use crate::{cli::Cli, debug, log, utils::path::resolve_against};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "assetstage.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing assetstage.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub base_dir: PathBuf,

    /// Deployment, archive and per-page resource directories
    pub paths: PathsConfig,

    /// Bundle artifact names, preludes and ordering
    pub bundle: BundleConfig,

    /// Entry markup page
    pub entry: EntryConfig,

    /// Compressed sibling settings
    pub compress: CompressConfig,

    /// Extra paths that always stay deployable
    pub keep: KeepConfig,

    /// Archival settings
    pub archive: ArchiveConfig,
}

impl StageConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// An explicit `-C` path must exist; otherwise `assetstage.toml` is
    /// searched upward from cwd and built-in defaults apply when absent.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match &cli.config {
            Some(explicit) => {
                let path = resolve_against(explicit, &cwd);
                if !path.is_file() {
                    bail!("Config file '{}' not found", explicit.display());
                }
                Some(path)
            }
            None => find_config_file(Path::new(CONFIG_FILE)),
        };

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => {
                debug!("config"; "no {} found, using defaults", CONFIG_FILE);
                Self::default()
            }
        };

        config.base_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.clone(), Path::to_path_buf);
        config.config_path = config_path;
        config.apply_cli(cli, &cwd);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let (config, ignored) = Self::parse_with_ignored(content)?;
        Self::warn_unknown_fields(&ignored);
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        debug!("config"; "loaded {}", path.display());
        Self::from_str(&content)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn warn_unknown_fields(fields: &[String]) {
        for field in fields {
            log!("warn"; "unknown config field `{}` ignored", field);
        }
    }

    /// CLI root overrides are relative to cwd, not to the config file.
    fn apply_cli(&mut self, cli: &Cli, cwd: &Path) {
        if let Some(root) = &cli.root {
            self.paths.deploy = resolve_against(root, cwd);
        }
        if let Some(archive) = &cli.archive {
            self.paths.archive = resolve_against(archive, cwd);
        }
    }

    /// Absolute deployment root.
    pub fn deploy_root(&self) -> PathBuf {
        resolve_against(&self.paths.deploy, &self.base_dir)
    }

    /// Absolute archive root.
    pub fn archive_root(&self) -> PathBuf {
        resolve_against(&self.paths.archive, &self.base_dir)
    }

    /// Validate all sections, collecting every problem before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.paths
            .validate(&self.deploy_root(), &self.archive_root(), &mut diag);
        self.bundle.validate(&mut diag);
        self.entry.validate(&mut diag);
        self.compress.validate(&mut diag);
        self.keep.validate(&mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Resolve into the form consumed by pipeline stages.
    pub fn layout(&self) -> Result<Layout> {
        Layout::from_config(self)
    }
}
