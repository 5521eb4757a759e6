//! modmove - Move a Rust module file to a new parent module without breaking paths
//!
//! This crate provides functionality to:
//! - Parse Rust source files and link them into module trees
//! - Resolve paths, imports and field accesses across those trees
//! - Detect visibility conflicts a move would introduce
//! - Plan and apply the edits that keep every path resolving after a move
pub mod cache;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod model;
pub mod parser;
pub mod refactor;
pub mod services;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Error, PreconditionError, Result};
pub use types::*;

// Re-export main API components
pub use config::MoveConfig;
pub use interfaces::{
    AlwaysConfirm, CancelToken, ConfirmationGate, NoProgress, ProgressReporter, RejectConflicts,
};
pub use model::{Program, Workspace};
pub use refactor::{
    ConflictReport, EditPlan, MoveEngine, MoveOutcome, MoveRequest, MoveSession, MoveState,
};
