//! Index types into a [`Program`](crate::model::Program) snapshot.
//!
//! Ids are only meaningful for the snapshot that produced them; a rebuilt
//! snapshot hands out fresh ids.

use serde::Serialize;

macro_rules! snapshot_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
            pub struct $name(pub(crate) usize);

            impl $name {
                pub fn index(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

snapshot_id!(
    /// A source file of the workspace
    FileId,
    /// A module: crate root, file-backed or inline
    ModuleId,
    /// A named item (including module declarations and associated items)
    ItemId,
    /// A struct or union field
    FieldId,
    /// A path occurrence
    RefId,
    /// A lexical scope: a module body or a block
    ScopeId,
    /// A `use` declaration
    UseId,
    /// An `impl` block
    ImplId,
    /// A field access, method call or destructuring site
    SiteId,
);
