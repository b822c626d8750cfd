//! `[bundle]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [bundle]
//! script = "bundle.js"
//! style = "bundle.css"
//! script_prelude = "'use strict';"
//! # shared utility modules first: later modules call into them
//! script_priority = ["utils", "toast", "state", "theme"]
//! # base rules first: later, more specific selectors override them
//! style_priority = ["variables", "layout"]
//! ```

use serde::{Deserialize, Serialize};

use crate::asset::RelPath;
use crate::config::ConfigDiagnostics;
use crate::core::AssetClass;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Script bundle, relative to the deployment root.
    pub script: String,
    /// Style bundle, relative to the deployment root.
    pub style: String,
    /// Mode-declaration line written at the top of the script bundle.
    /// Empty disables it.
    pub script_prelude: String,
    /// Script base names in load order.
    pub script_priority: Vec<String>,
    /// Style base names in override order.
    pub style_priority: Vec<String>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            script: "bundle.js".into(),
            style: "bundle.css".into(),
            script_prelude: "'use strict';".into(),
            script_priority: [
                "utils",
                "toast",
                "state",
                "theme",
                "alerts",
                "websocket",
                "mini-charts",
                "calibration-wizard",
                "safety",
                "fallback-pages",
                "router",
                "graphs",
                "mock-data",
            ]
            .map(String::from)
            .to_vec(),
            style_priority: [
                "variables",
                "layout",
                "cards",
                "charts",
                "responsive",
                "mobile-menu",
                "enhancements",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl BundleConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        Self::validate_name("bundle.script", &self.script, AssetClass::Script, diag);
        Self::validate_name("bundle.style", &self.style, AssetClass::Style, diag);
        if self.script == self.style {
            diag.error("bundle.style", "script and style bundles must be different files");
        }

        if self.script_prelude.contains('\n') {
            diag.error("bundle.script_prelude", "prelude must be a single line");
        }
    }

    fn validate_name(
        field: &'static str,
        name: &str,
        class: AssetClass,
        diag: &mut ConfigDiagnostics,
    ) {
        match RelPath::new(name) {
            Some(rel) if AssetClass::from_path(rel.as_str()) == class => {}
            Some(_) => diag.error_with_hint(
                field,
                format!("`{name}` does not have a {class} extension"),
                format!("use one of: {}", class.extensions().join(", ")),
            ),
            None => diag.error(field, format!("`{name}` is not a valid relative path")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let mut diag = ConfigDiagnostics::new();
        BundleConfig::default().validate(&mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_wrong_extension() {
        let mut diag = ConfigDiagnostics::new();
        BundleConfig {
            script: "bundle.css".into(),
            style: "bundle.js".into(),
            ..BundleConfig::default()
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 2);
        assert!(diag.errors()[0].hint.as_deref().unwrap().contains("js"));
    }

    #[test]
    fn test_multiline_prelude() {
        let mut diag = ConfigDiagnostics::new();
        BundleConfig {
            script_prelude: "'use strict';\nvar x;".into(),
            ..BundleConfig::default()
        }
        .validate(&mut diag);
        assert_eq!(diag.errors()[0].field, "bundle.script_prelude");
    }
}
