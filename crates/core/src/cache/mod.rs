//! Caching of per-file syntax extraction results

pub mod parse_cache;

// Re-export the main cache type
pub use parse_cache::{ParseCache, SharedParseCache};
