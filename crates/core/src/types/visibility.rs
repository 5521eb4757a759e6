use serde::Serialize;

use super::ids::ModuleId;

/// Resolved visibility of an item, field or module declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Visibility {
    /// `pub`
    Public,
    /// No modifier, or `pub(self)`
    Private,
    /// `pub(crate)`, `pub(super)` or `pub(in path)`, with the scope module resolved
    Restricted(ModuleId),
}

impl Visibility {
    pub fn is_private(&self) -> bool {
        matches!(self, Visibility::Private)
    }

    pub fn restricted_scope(&self) -> Option<ModuleId> {
        match self {
            Visibility::Restricted(scope) => Some(*scope),
            _ => None,
        }
    }
}
