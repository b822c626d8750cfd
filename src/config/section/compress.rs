//! `[compress]` section configuration.

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Appended to a file name to form its compressed sibling.
    pub suffix: String,
    /// Gzip level, 0-9.
    pub level: u32,
    /// Extensions that receive a compressed sibling during `deploy`.
    pub extensions: Vec<String>,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            suffix: ".gz".into(),
            level: 9,
            extensions: vec!["html".into(), "js".into(), "css".into()],
        }
    }
}

impl CompressConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.suffix.len() < 2 || !self.suffix.starts_with('.') || self.suffix.contains('/') {
            diag.error_with_hint(
                "compress.suffix",
                format!("`{}` is not a usable file suffix", self.suffix),
                "use something like `.gz`",
            );
        }
        if self.level > 9 {
            diag.error(
                "compress.level",
                format!("level {} is out of range 0-9", self.level),
            );
        }
    }

    /// Whether a plain file with this name gets a compressed sibling.
    pub fn applies_to(&self, file_name: &str) -> bool {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}
