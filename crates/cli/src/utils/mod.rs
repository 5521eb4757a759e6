pub mod project;

pub use project::{Project, find_manifest_dir, resolve_dir, resolve_file};
