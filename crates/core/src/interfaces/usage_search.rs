use crate::types::{ItemId, RefId, Target};
use serde::Serialize;

/// One place a definition is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Usage {
    /// A `mod name;` item declaring the module
    Declaration(ItemId),
    /// A path inside a `use` declaration
    Import(RefId),
    /// Any other path
    Reference(RefId),
}

impl Usage {
    pub fn reference(&self) -> Option<RefId> {
        match self {
            Usage::Declaration(_) => None,
            Usage::Import(r) | Usage::Reference(r) => Some(*r),
        }
    }
}

pub trait UsageSearch {
    fn find_all_usages(&self, targets: &[Target]) -> Vec<Usage>;
}
