//! Traits at the seams of the move engine
//!
//! The engine only talks to the module tree, reference resolution, usage
//! search and text mutation through these traits. The crate ships one
//! implementation of each (the [`Program`](crate::model::Program) snapshot,
//! [`UsageIndex`](crate::services::UsageIndex) and
//! [`EditPlan`](crate::refactor::EditPlan)).

pub mod module_tree;
pub mod progress;
pub mod reference_resolver;
pub mod syntax_mutator;
pub mod usage_search;

pub use module_tree::ModuleTreeQuery;
pub use progress::{AlwaysConfirm, CancelToken, ConfirmationGate, NoProgress, ProgressReporter, RejectConflicts};
pub use reference_resolver::ReferenceResolver;
pub use syntax_mutator::SyntaxMutator;
pub use usage_search::{Usage, UsageSearch};
