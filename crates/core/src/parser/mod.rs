//! Rust source code parsing and analysis using tree-sitter

pub mod extractor;
pub mod rust_parser;
pub mod syntax;
pub mod utils;

// Re-export commonly used items
pub use rust_parser::RustParser;
pub use syntax::FileSyntax;
