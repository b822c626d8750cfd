//! Core types - pure abstractions shared by every pipeline stage.

mod class;
mod error;
mod keep;
mod priority;
mod report;

pub use class::AssetClass;
pub use error::{IoResultExt, StageError, StageResult};
pub use keep::KeepSet;
pub use priority::PriorityTable;
pub use report::StageReport;
