//! Ordered text edits plus one file move, applied copy-on-write

use crate::{
    error::{Error, Result},
    interfaces::SyntaxMutator,
    model::Workspace,
    types::TextRange,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub range: TextRange,
    pub text: String,
    /// Insertions at the same offset are applied in ascending order
    #[serde(skip)]
    order: (u8, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Everything a move changes, computed against one snapshot.
///
/// Nothing is applied until [`EditPlan::apply`], which builds a new
/// workspace and leaves the original untouched on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditPlan {
    edits: BTreeMap<PathBuf, Vec<TextEdit>>,
    file_move: Option<FileMove>,
    #[serde(skip)]
    next_seq: usize,
}

const BEFORE: u8 = 0;
const AFTER: u8 = 1;

impl EditPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.values().all(Vec::is_empty) && self.file_move.is_none()
    }

    pub fn file_move(&self) -> Option<&FileMove> {
        self.file_move.as_ref()
    }

    pub fn edits_for(&self, file: &Path) -> &[TextEdit] {
        self.edits.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edited_files(&self) -> impl Iterator<Item = &Path> {
        self.edits
            .iter()
            .filter(|(_, edits)| !edits.is_empty())
            .map(|(path, _)| path.as_path())
    }

    /// Where `path` ends up once the file move is applied
    pub fn moved_path(&self, path: &Path) -> PathBuf {
        match &self.file_move {
            Some(file_move) if file_move.from == path => file_move.to.clone(),
            _ => path.to_path_buf(),
        }
    }

    pub fn edit_count(&self) -> usize {
        self.edits.values().map(Vec::len).sum()
    }

    fn push(&mut self, file: &Path, mut range: TextRange, text: String, bias: u8) -> bool {
        let edits = self.edits.entry(file.to_path_buf()).or_default();

        // Overlapping deletions collapse into one
        if text.is_empty() && !range.is_empty() {
            while let Some(index) = edits.iter().position(|e| {
                e.text.is_empty()
                    && e.range.overlaps(range)
                    && !encloses(e.range, range)
                    && !encloses(range, e.range)
            }) {
                let other = edits.remove(index).range;
                range = TextRange::new(range.start.min(other.start), range.end.max(other.end));
            }
        }

        if edits
            .iter()
            .any(|e| !e.range.is_empty() && encloses(e.range, range))
        {
            debug!(
                "dropping edit {:?} in {}: inside an existing replacement",
                range,
                file.display()
            );
            return false;
        }
        if !range.is_empty() {
            edits.retain(|e| !encloses(range, e.range));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        edits.push(TextEdit {
            range,
            text,
            order: (bias, seq),
        });
        true
    }

    fn sorted(&self, file: &Path) -> Vec<&TextEdit> {
        let mut edits: Vec<&TextEdit> = self.edits_for(file).iter().collect();
        edits.sort_by_key(|e| (e.range.start, e.range.end, e.order));
        edits
    }

    /// Position of `range` after this plan's edits to `file`, or `None` when
    /// an edit touches it
    pub fn map_range(&self, file: &Path, range: TextRange) -> Option<TextRange> {
        let mut delta: isize = 0;
        for edit in self.edits_for(file) {
            let inside_insert =
                edit.range.is_empty() && range.start < edit.range.start && edit.range.start < range.end;
            if edit.range.overlaps(range) || inside_insert {
                return None;
            }
            if edit.range.end <= range.start {
                delta += edit.text.len() as isize - edit.range.len() as isize;
            }
        }
        let start = range.start as isize + delta;
        Some(TextRange::new(start as usize, start as usize + range.len()))
    }

    /// Apply to `workspace`, producing a new workspace
    pub fn apply(&self, workspace: &Workspace) -> Result<Workspace> {
        let mut result = workspace.clone();

        for file in self.edited_files() {
            let text = workspace.file_text(file).ok_or_else(|| Error::EditConflict {
                file: file.to_path_buf(),
                detail: "file is not part of the workspace".to_string(),
            })?;
            result.insert_file(file, apply_edits(file, text, &self.sorted(file))?);
        }

        if let Some(file_move) = &self.file_move {
            if result.contains(&file_move.to) {
                return Err(Error::EditConflict {
                    file: file_move.to.clone(),
                    detail: "destination already exists".to_string(),
                });
            }
            let text = result.remove_file(&file_move.from).ok_or_else(|| Error::EditConflict {
                file: file_move.from.clone(),
                detail: "moved file is not part of the workspace".to_string(),
            })?;
            result.insert_file(&file_move.to, text);
        }

        Ok(result)
    }
}

impl SyntaxMutator for EditPlan {
    fn replace(&mut self, file: &Path, range: TextRange, text: String) -> bool {
        self.push(file, range, text, AFTER)
    }

    fn insert_before(&mut self, file: &Path, offset: usize, text: String) -> bool {
        self.push(file, TextRange::empty(offset), text, BEFORE)
    }

    fn insert_after(&mut self, file: &Path, offset: usize, text: String) -> bool {
        self.push(file, TextRange::empty(offset), text, AFTER)
    }

    fn move_file(&mut self, from: PathBuf, to: PathBuf) {
        self.file_move = Some(FileMove { from, to });
    }
}

/// `outer` swallows `inner`: a non-empty range containing it, or an
/// insertion point strictly inside it
fn encloses(outer: TextRange, inner: TextRange) -> bool {
    if inner.is_empty() {
        outer.start < inner.start && inner.start < outer.end
    } else {
        outer.contains_range(inner)
    }
}

fn apply_edits(file: &Path, text: &str, edits: &[&TextEdit]) -> Result<String> {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    for edit in edits {
        if edit.range.start < cursor || edit.range.end > text.len() {
            return Err(Error::EditConflict {
                file: file.to_path_buf(),
                detail: format!(
                    "edit at {}..{} overlaps a previous edit",
                    edit.range.start, edit.range.end
                ),
            });
        }
        output.push_str(&text[cursor..edit.range.start]);
        output.push_str(&edit.text);
        cursor = edit.range.end;
    }
    output.push_str(&text[cursor..]);
    Ok(output)
}
