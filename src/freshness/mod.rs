//! Freshness and content identity.
//!
//! - **mtime**: is a derived file (compressed sibling, bundle) newer than its source
//! - **hash**: do two representations hold the same content

mod hash;
mod mtime;

pub use hash::{ContentHash, Fingerprint};
pub use mtime::{get_mtime, is_newer_than};
