//! Boundary markers.
//!
//! Each bundle entry is introduced by one marker line that carries the byte
//! length of the entry and its relative path:
//!
//! ```text
//! /*@asset 9 shared/utils.js */;
//! var U=1;
//!
//! ```
//!
//! The length makes entries self-delimiting, so content containing a line
//! that looks like a marker cannot split an entry. The trailing `;` appears
//! in script bundles only and terminates whatever statement the previous
//! file left open.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::AssetClass;

use super::sanitize::sanitize_entry_path;

/// Current marker line. Captures: declared length, relative path.
pub static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^/\*@asset ([0-9]+) (.+?) \*/;?\r?$").unwrap()
});

/// `/* path */` block marker written by older bundles.
pub static LEGACY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^/\* (.+?) \*/\r?$").unwrap());

/// `// --- path ---` line marker written by older script bundles.
pub static LEGACY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^// --- (.+?) ---\r?$").unwrap());

/// Whether `path` can be carried verbatim inside a marker line and comes
/// back unchanged when the entry is restored.
pub fn is_markable(path: &str) -> bool {
    !path.contains("*/")
        && !path.contains(['\n', '\r'])
        && sanitize_entry_path(path).is_some_and(|rel| rel.as_str() == path)
}

/// Render the marker line (newline included) for an entry of `len` bytes.
pub fn render(class: AssetClass, path: &str, len: usize) -> String {
    let terminator = if class == AssetClass::Script { ";" } else { "" };
    format!("/*@asset {len} {path} */{terminator}\n")
}
