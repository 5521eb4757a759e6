//! Program model: workspace files, module trees and resolved references

pub mod module_tree;
pub mod program;
pub mod resolve;
pub mod workspace;

pub use program::{
    FileData, ImplData, ItemData, ItemKind, ModuleData, ModuleKind, Program, RefData, ScopeData,
    ScopeKind,
};
pub use resolve::Namespace;
pub use workspace::Workspace;
