//! Bundle ordering by priority table.

use rustc_hash::FxHashMap;

use crate::asset::RelPath;

/// Maps base file names to ranks (lower = earlier in the bundle).
///
/// A table entry matches either the full file name (`utils.js`) or its stem
/// (`utils`). Unranked files sort after every ranked one.
#[derive(Debug, Clone, Default)]
pub struct PriorityTable {
    ranks: FxHashMap<String, usize>,
}

impl PriorityTable {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranks = FxHashMap::default();
        for (rank, name) in names.into_iter().enumerate() {
            ranks.entry(name.as_ref().to_string()).or_insert(rank);
        }
        Self { ranks }
    }

    /// Rank of a file; unranked files get `usize::MAX`.
    pub fn rank(&self, path: &RelPath) -> usize {
        self.ranks
            .get(path.file_name())
            .or_else(|| self.ranks.get(path.file_stem()))
            .copied()
            .unwrap_or(usize::MAX)
    }

    /// Sort lexicographically, then stable-sort by rank.
    pub fn order(&self, paths: &mut [RelPath]) {
        paths.sort();
        paths.sort_by_key(|p| self.rank(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rels(names: &[&str]) -> Vec<RelPath> {
        names.iter().map(|n| RelPath::new(n).unwrap()).collect()
    }

    #[test]
    fn test_ranked_first_then_lexicographic() {
        let table = PriorityTable::new(["utils", "toast", "state", "theme"]);
        let mut files = rels(&["zeta.js", "utils.js", "alpha.js", "theme.js"]);
        table.order(&mut files);
        let names: Vec<_> = files.iter().map(RelPath::as_str).collect();
        assert_eq!(names, ["utils.js", "theme.js", "alpha.js", "zeta.js"]);
    }

    #[test]
    fn test_full_file_name_matches() {
        let table = PriorityTable::new(["variables.css", "layout.css"]);
        let mut files = rels(&["css/cards.css", "css/layout.css", "css/variables.css"]);
        table.order(&mut files);
        let names: Vec<_> = files.iter().map(RelPath::as_str).collect();
        assert_eq!(names, ["css/variables.css", "css/layout.css", "css/cards.css"]);
    }

    #[test]
    fn test_same_rank_keeps_path_order() {
        let table = PriorityTable::new(["utils"]);
        let mut files = rels(&["b/utils.js", "a/utils.js", "c.js"]);
        table.order(&mut files);
        let names: Vec<_> = files.iter().map(RelPath::as_str).collect();
        assert_eq!(names, ["a/utils.js", "b/utils.js", "c.js"]);
    }

    #[test]
    fn test_duplicate_names_keep_first_rank() {
        let table = PriorityTable::new(["state", "utils", "state"]);
        assert_eq!(table.rank(&RelPath::new("state.js").unwrap()), 0);
        assert_eq!(table.rank(&RelPath::new("utils.js").unwrap()), 1);
        assert_eq!(table.rank(&RelPath::new("other.js").unwrap()), usize::MAX);
    }
}
