//! Per-representation stages: compression, archival and pruning.
//!
//! Archival and pruning are destructive; both consult the shared
//! [`Inventory`](crate::asset::Inventory) before touching a file and update
//! it afterwards. They are driven by the orchestrator in
//! [`pipeline`](crate::pipeline).

pub mod archive;
pub mod compress;
pub mod prune;

pub use archive::{ArchiveOutcome, archive};
pub use compress::{CompressOutcome, compress_file, decompress_file};
pub use prune::{PruneOutcome, prune};
