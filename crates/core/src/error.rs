use std::io;
use std::path::PathBuf;

/// Errors that can occur during modmove operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Module resolution error: {0}")]
    ModuleError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cannot move: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Conflict detection was cancelled")]
    Cancelled,

    #[error("Overlapping edits in {file}: {detail}")]
    EditConflict { file: PathBuf, detail: String },

    /// State that a committed step guarantees turned out to be missing.
    /// This is an engine bug, never a user error.
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

/// Reasons a move is rejected before anything is touched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("exactly one file can be moved at a time, got {0}")]
    FileCount(usize),

    #[error("{0} is not part of any module tree")]
    UnknownFile(PathBuf),

    #[error("{0} is a crate root")]
    CrateRoot(PathBuf),

    #[error("target module `{0}` does not exist")]
    UnknownTarget(String),

    #[error("`{target}` already contains an item named `{name}`")]
    NameCollision { target: String, name: String },

    #[error("a file already exists at {0}")]
    DestinationExists(PathBuf),

    #[error("{file} is declared by {count} module declarations")]
    AmbiguousDeclaration { file: PathBuf, count: usize },

    #[error("the declaration of {0} uses a #[path] attribute")]
    PathAttribute(PathBuf),

    #[error("`{target}` belongs to a different crate than {file}")]
    CrateMismatch { file: PathBuf, target: String },

    #[error("`{0}` is inside the module being moved")]
    MoveIntoSelf(String),

    #[error("{0} has file-backed child modules")]
    DirectorySubtree(PathBuf),
}

/// Result type alias for modmove operations
pub type Result<T> = std::result::Result<T, Error>;
