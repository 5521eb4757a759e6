pub mod ids;
pub mod position;
pub mod target;
pub mod text_range;
pub mod visibility;

// Re-export commonly used types
pub use ids::{FieldId, FileId, ImplId, ItemId, ModuleId, RefId, ScopeId, SiteId, UseId};
pub use position::Position;
pub use target::Target;
pub use text_range::TextRange;
pub use visibility::Visibility;
