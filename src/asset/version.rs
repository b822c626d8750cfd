//! Cache-busting versions for bundle references.
//!
//! Uses a content hash rather than a timestamp, so regenerating an unchanged
//! bundle leaves the entry page byte-identical.

use std::hash::Hasher;

use rustc_hash::FxHasher;

/// Compute version string from content (first 8 hex chars of a 64-bit hash).
pub fn compute_version(content: &[u8]) -> String {
    let mut hasher = FxHasher::default();
    hasher.write(content);
    format!("{:016x}", hasher.finish())[..8].to_string()
}

/// Get versioned URL for an asset.
///
/// Returns `base_url?v=abc12345` format.
pub fn versioned_url(base_url: &str, version: &str) -> String {
    format!("{base_url}?v={version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_version() {
        let v1 = compute_version(b"body { color: red; }");
        assert_eq!(v1.len(), 8);

        // Same content = same version
        assert_eq!(v1, compute_version(b"body { color: red; }"));

        // Different content = different version
        assert_ne!(v1, compute_version(b"body { color: blue; }"));
    }

    #[test]
    fn test_versioned_url() {
        let url = versioned_url("bundle.css", &compute_version(b"body{}"));
        assert!(url.starts_with("bundle.css?v="));
        assert_eq!(url.len(), "bundle.css?v=".len() + 8);
    }
}
