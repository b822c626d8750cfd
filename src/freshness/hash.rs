//! Content hashing using blake3.
//!
//! Every representation in the inventory carries a [`Fingerprint`], so that
//! "this copy holds the same content as that one" is a cheap comparison.

use serde::{Serialize, Serializer};

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a byte slice.
    #[inline]
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 16 hex chars are enough to tell copies apart in logs
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Content with a trailing newline guaranteed (empty content stays empty).
///
/// Bundling stores entries in this form, so it defines equality between a
/// bundled entry and any other copy.
pub fn normalize_newline(bytes: &[u8]) -> std::borrow::Cow<'_, [u8]> {
    if bytes.is_empty() || bytes.ends_with(b"\n") {
        std::borrow::Cow::Borrowed(bytes)
    } else {
        let mut owned = Vec::with_capacity(bytes.len() + 1);
        owned.extend_from_slice(bytes);
        owned.push(b'\n');
        std::borrow::Cow::Owned(owned)
    }
}

/// Identity of one materialized copy of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fingerprint {
    /// Hash of the exact content.
    pub exact: ContentHash,
    /// Hash of the newline-normalized content.
    #[serde(skip)]
    pub loose: ContentHash,
    /// Bytes occupied on disk by this copy (compressed size for siblings).
    pub disk_size: u64,
}

impl Fingerprint {
    pub fn new(content: &[u8], disk_size: u64) -> Self {
        Self {
            exact: ContentHash::of(content),
            loose: ContentHash::of(&normalize_newline(content)),
            disk_size,
        }
    }

    /// Compare content; `loose` ignores a single missing trailing newline.
    #[inline]
    pub fn same_content(&self, other: &Self, loose: bool) -> bool {
        if loose {
            self.loose == other.loose
        } else {
            self.exact == other.exact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_newline() {
        assert_eq!(&*normalize_newline(b""), b"");
        assert_eq!(&*normalize_newline(b"var a;"), b"var a;\n");
        assert_eq!(&*normalize_newline(b"var a;\n"), b"var a;\n");
    }

    #[test]
    fn test_fingerprint_exact_vs_loose() {
        let a = Fingerprint::new(b"var U=1;", 8);
        let b = Fingerprint::new(b"var U=1;\n", 9);
        assert!(!a.same_content(&b, false));
        assert!(a.same_content(&b, true));

        let c = Fingerprint::new(b"var U=2;", 8);
        assert!(!a.same_content(&c, true));
    }

    #[test]
    fn test_content_hash_display() {
        let h = ContentHash::of(b"body{}");
        assert_eq!(h.to_string().len(), 16);
        assert_eq!(h.to_hex().len(), 64);
    }
}
