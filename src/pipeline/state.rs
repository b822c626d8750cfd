//! Pipeline state detection.

use std::fmt;

use serde::Serialize;

use crate::asset::{Inventory, RelPath, Representation};
use crate::config::Layout;
use crate::core::AssetClass;

/// How far the forward flow has taken the deployment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineState {
    /// No bundle artifacts; every asset is a plain file.
    FullSource,
    /// Bundles exist, per-file sources are still present.
    Bundled,
    /// Bundles and the entry page have compressed siblings.
    Compressed,
    /// Nothing left to prune or archive.
    Minimal,
}

impl PipelineState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::FullSource => "full-source",
            Self::Bundled => "bundled",
            Self::Compressed => "compressed",
            Self::Minimal => "minimal",
        }
    }

    /// Derive the state from the representation map.
    pub fn detect(layout: &Layout, inventory: &Inventory) -> Self {
        let has = |rel: &RelPath, rep: Representation| inventory.get(rel).is_some_and(|record| record.has(rep));

        let bundles: Vec<_> = [&layout.script_bundle, &layout.style_bundle]
            .into_iter()
            .filter(|rel| has(*rel, Representation::Plain))
            .collect();
        if bundles.is_empty() {
            return Self::FullSource;
        }

        let compressed = bundles
            .into_iter()
            .chain(has(&layout.entry_page, Representation::Plain).then_some(&layout.entry_page))
            .all(|rel| has(rel, Representation::Compressed));
        if !compressed {
            return Self::Bundled;
        }

        let redundant = inventory.iter().any(|(rel, record)| {
            if layout.is_kept(rel) {
                return false;
            }
            if layout.is_bundle_source(rel) {
                return record.has(Representation::Plain) || record.has(Representation::Compressed);
            }
            (record.class == AssetClass::Markup || layout.is_page_resource(rel))
                && record.has(Representation::Plain)
                && record.has(Representation::Compressed)
        });
        if redundant { Self::Compressed } else { Self::Minimal }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::Fingerprint;
    use std::path::Path;

    fn put(inv: &mut Inventory, path: &str, rep: Representation) {
        inv.insert(RelPath::new(path).unwrap(), rep, Fingerprint::new(b"x", 1));
    }

    #[test]
    fn test_state_progression() {
        let layout = Layout::with_roots(Path::new("/d"), Path::new("/a"));
        let mut inv = Inventory::new();
        put(&mut inv, "index.html", Representation::Plain);
        put(&mut inv, "shared/utils.js", Representation::Plain);
        assert_eq!(PipelineState::detect(&layout, &inv), PipelineState::FullSource);

        put(&mut inv, "bundle.js", Representation::Plain);
        assert_eq!(PipelineState::detect(&layout, &inv), PipelineState::Bundled);

        put(&mut inv, "bundle.js", Representation::Compressed);
        put(&mut inv, "index.html", Representation::Compressed);
        assert_eq!(PipelineState::detect(&layout, &inv), PipelineState::Compressed);

        inv.remove(&RelPath::new("shared/utils.js").unwrap(), Representation::Plain);
        assert_eq!(PipelineState::detect(&layout, &inv), PipelineState::Minimal);
    }

    #[test]
    fn test_order_and_names() {
        assert!(PipelineState::FullSource < PipelineState::Bundled);
        assert!(PipelineState::Compressed < PipelineState::Minimal);
        assert_eq!(PipelineState::FullSource.to_string(), "full-source");
    }
}
