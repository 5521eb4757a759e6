//! Configuration management for modmove

mod settings;

// Re-export main types
pub use settings::MoveConfig;
