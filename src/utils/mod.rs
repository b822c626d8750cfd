//! Small shared helpers.

pub mod fmt;
pub mod path;
