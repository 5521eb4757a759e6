use serde::Serialize;

use super::ids::{FieldId, ItemId, ModuleId};

/// A definition a path occurrence or field site resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Target {
    Module(ModuleId),
    Item(ItemId),
    /// Enum variant by index into the enum's variant list
    Variant(ItemId, usize),
    Field(FieldId),
}

impl Target {
    pub fn as_module(&self) -> Option<ModuleId> {
        match self {
            Target::Module(module) => Some(*module),
            _ => None,
        }
    }
}
