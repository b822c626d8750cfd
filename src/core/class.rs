//! Asset classification by extension.

use std::path::Path;

use serde::Serialize;

/// Class of a web-ui asset.
///
/// Only `Script` and `Style` participate in bundling and archival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Script,
    Style,
    Markup,
    Other,
}

impl AssetClass {
    /// Classes that are merged into a bundle, in bundling order.
    pub const BUNDLED: [Self; 2] = [Self::Script, Self::Style];

    /// Classify a plain (uncompressed) path by its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("js" | "mjs") => Self::Script,
            Some("css") => Self::Style,
            Some("html" | "htm") => Self::Markup,
            _ => Self::Other,
        }
    }

    /// Whether files of this class are merged into a bundle.
    pub const fn is_bundled(self) -> bool {
        matches!(self, Self::Script | Self::Style)
    }

    /// Extensions scanned when collecting bundle sources.
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Script => &["js", "mjs"],
            Self::Style => &["css"],
            Self::Markup => &["html", "htm"],
            Self::Other => &[],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Markup => "markup",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
