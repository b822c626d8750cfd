//! Asset identity, scanning and the representation map.

mod inventory;
mod relpath;
mod scan;
pub mod version;

// Types
pub use inventory::{AssetRecord, Inventory, Representation, log_overview};
pub use relpath::RelPath;

// Scanning (read-only)
pub use scan::{scan_sources, walk_files};
