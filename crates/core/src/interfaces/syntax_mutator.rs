use crate::types::TextRange;
use std::path::{Path, PathBuf};

/// Text-level mutations recorded against a snapshot.
///
/// Every method returns whether the edit was kept; an edit nested inside an
/// already recorded replacement is dropped.
pub trait SyntaxMutator {
    fn replace(&mut self, file: &Path, range: TextRange, text: String) -> bool;

    fn insert_before(&mut self, file: &Path, offset: usize, text: String) -> bool;

    fn insert_after(&mut self, file: &Path, offset: usize, text: String) -> bool;

    fn delete(&mut self, file: &Path, range: TextRange) -> bool {
        self.replace(file, range, String::new())
    }

    fn move_file(&mut self, from: PathBuf, to: PathBuf);

    /// Path text from segments
    fn path_from_text(&self, segments: &[String]) -> String {
        segments.join("::")
    }

    /// Restricted visibility clause for a crate-rooted scope path
    fn visibility_from_text(&self, scope_path: &str) -> String {
        if scope_path == "crate" {
            "pub(crate)".to_string()
        } else {
            format!("pub(in {scope_path})")
        }
    }

    fn newline(&self, indent: &str) -> String {
        format!("\n{indent}")
    }
}
