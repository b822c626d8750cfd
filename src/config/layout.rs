//! Resolved configuration handed to every pipeline stage.
//!
//! [`StageConfig`] mirrors the TOML file; [`Layout`] is what stages consume:
//! absolute roots, validated relative paths, the keep-set and both priority
//! tables, computed once per run.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::asset::RelPath;
use crate::core::{AssetClass, KeepSet, PriorityTable};
use crate::utils::path::with_suffix;

use super::StageConfig;
use super::section::CompressConfig;

#[derive(Debug, Clone)]
pub struct Layout {
    pub deploy_root: PathBuf,
    pub archive_root: PathBuf,
    pub pages_dir: Option<RelPath>,
    pub entry_page: RelPath,
    pub cache_bust: bool,
    pub script_bundle: RelPath,
    pub style_bundle: RelPath,
    pub script_prelude: Option<String>,
    pub script_priority: PriorityTable,
    pub style_priority: PriorityTable,
    pub suffix: String,
    pub level: u32,
    compress: CompressConfig,
    pub archive_enabled: bool,
    pub keep: KeepSet,
}

impl Layout {
    /// Build from a configuration. Fails on names that
    /// [`StageConfig::validate`] would reject.
    pub fn from_config(config: &StageConfig) -> Result<Self> {
        let parse = |field: &str, raw: &str| {
            RelPath::new(raw).with_context(|| format!("`{field}` = `{raw}` is not a relative path"))
        };

        let entry_page = parse("entry.page", &config.entry.page)?;
        let script_bundle = parse("bundle.script", &config.bundle.script)?;
        let style_bundle = parse("bundle.style", &config.bundle.style)?;
        let suffix = config.compress.suffix.clone();

        let keep = KeepSet::new(
            [&entry_page, &script_bundle, &style_bundle]
                .into_iter()
                .flat_map(|rel| [rel.clone(), rel.with_suffix(&suffix)])
                .chain(config.keep.extra.iter().filter_map(RelPath::new)),
        );

        let prelude = config.bundle.script_prelude.trim();

        Ok(Self {
            deploy_root: config.deploy_root(),
            archive_root: config.archive_root(),
            pages_dir: config.paths.pages_dir(),
            entry_page,
            cache_bust: config.entry.cache_bust,
            script_bundle,
            style_bundle,
            script_prelude: (!prelude.is_empty()).then(|| prelude.to_string()),
            script_priority: PriorityTable::new(&config.bundle.script_priority),
            style_priority: PriorityTable::new(&config.bundle.style_priority),
            level: config.compress.level.min(9),
            suffix,
            compress: config.compress.clone(),
            archive_enabled: config.archive.enabled,
            keep,
        })
    }

    /// Default layout rooted at arbitrary directories (test fixtures).
    #[cfg(test)]
    pub fn with_roots(deploy: &std::path::Path, archive: &std::path::Path) -> Self {
        let mut config = StageConfig::default();
        config.paths.deploy = deploy.to_path_buf();
        config.paths.archive = archive.to_path_buf();
        Self::from_config(&config).unwrap()
    }

    #[inline]
    pub fn deploy_path(&self, rel: &RelPath) -> PathBuf {
        rel.to_path(&self.deploy_root)
    }

    #[inline]
    pub fn archive_path(&self, rel: &RelPath) -> PathBuf {
        rel.to_path(&self.archive_root)
    }

    #[inline]
    pub fn compressed_rel(&self, rel: &RelPath) -> RelPath {
        rel.with_suffix(&self.suffix)
    }

    /// Deployment path of the compressed sibling of `rel`.
    pub fn compressed_path(&self, rel: &RelPath) -> PathBuf {
        with_suffix(&self.deploy_path(rel), &self.suffix)
    }

    /// If `rel` names a compressed sibling, the plain path it belongs to.
    pub fn split_compressed(&self, rel: &RelPath) -> Option<RelPath> {
        rel.strip_suffix(&self.suffix)
    }

    pub fn bundle_rel(&self, class: AssetClass) -> Option<&RelPath> {
        match class {
            AssetClass::Script => Some(&self.script_bundle),
            AssetClass::Style => Some(&self.style_bundle),
            _ => None,
        }
    }

    pub fn priority(&self, class: AssetClass) -> &PriorityTable {
        match class {
            AssetClass::Style => &self.style_priority,
            _ => &self.script_priority,
        }
    }

    pub fn prelude(&self, class: AssetClass) -> Option<&str> {
        match class {
            AssetClass::Script => self.script_prelude.as_deref(),
            _ => None,
        }
    }

    /// Loaded individually by the runtime router.
    pub fn is_page_resource(&self, rel: &RelPath) -> bool {
        self.pages_dir.as_ref().is_some_and(|dir| rel.is_under(dir))
    }

    #[inline]
    pub fn is_kept(&self, rel: &RelPath) -> bool {
        self.keep.contains(rel)
    }

    /// A script or style file that belongs in a bundle: outside the per-page
    /// directory and not itself a keep-set artifact.
    pub fn is_bundle_source(&self, rel: &RelPath) -> bool {
        AssetClass::from_path(rel.as_str()).is_bundled()
            && !self.is_page_resource(rel)
            && !self.is_kept(rel)
    }

    /// Whether the forward flow gives `rel` a compressed sibling: keep-set
    /// files, markup and per-page resources with a configured extension.
    pub fn should_compress(&self, rel: &RelPath) -> bool {
        if !self.compress.applies_to(rel.file_name()) || self.is_bundle_source(rel) {
            return false;
        }
        self.is_kept(rel)
            || self.is_page_resource(rel)
            || AssetClass::from_path(rel.as_str()) == AssetClass::Markup
    }
}
