//! The keep-set: paths that always stay directly deployable.

use rustc_hash::FxHashSet;

use crate::asset::RelPath;

/// Relative paths exempt from pruning and archival.
#[derive(Debug, Clone, Default)]
pub struct KeepSet {
    paths: FxHashSet<RelPath>,
}

impl KeepSet {
    pub fn new(paths: impl IntoIterator<Item = RelPath>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    #[inline]
    pub fn contains(&self, path: &RelPath) -> bool {
        self.paths.contains(path)
    }

    /// Keep-set entries in lexicographic order.
    pub fn sorted(&self) -> Vec<&RelPath> {
        let mut paths: Vec<_> = self.paths.iter().collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_sorted() {
        let keep = KeepSet::new(
            ["index.html", "bundle.js", "bundle.js.gz", "index.html"]
                .into_iter()
                .filter_map(RelPath::new),
        );
        assert!(keep.contains(&RelPath::new("bundle.js.gz").unwrap()));
        assert!(!keep.contains(&RelPath::new("shared/utils.js").unwrap()));
        let sorted: Vec<_> = keep.sorted().into_iter().map(RelPath::as_str).collect();
        assert_eq!(sorted, ["bundle.js", "bundle.js.gz", "index.html"]);
    }
}
