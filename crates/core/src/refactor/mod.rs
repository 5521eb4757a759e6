//! The module-move refactoring: conflict analysis, the move state machine
//! and the edit plan it produces

pub mod conflicts;
pub mod edits;
pub mod engine;
pub mod rewriter;
pub mod usages;

pub use conflicts::{ConflictKey, ConflictReport, ConflictsDetector};
pub use edits::{EditPlan, FileMove, TextEdit};
pub use engine::{MoveEngine, MoveOutcome, MoveRequest, MoveSession, MoveState};
pub use rewriter::PathRewriter;
