//! Service implementations for the interface traits

pub mod usage_index;

pub use usage_index::UsageIndex;
