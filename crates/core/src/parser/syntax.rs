//! Position-based facts extracted from one source file.
//!
//! Nothing here knows which module the file belongs to; linking files into a
//! module tree is done by [`Program`](crate::model::Program). This keeps a
//! `FileSyntax` reusable for any snapshot containing the same text.

use crate::types::TextRange;

/// Lexical container of an item, path or block inside one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalScope {
    /// Top level of the file
    Root,
    /// Body of the inline `mod` item with this index in [`FileSyntax::items`]
    Module(usize),
    /// The block with this index in [`FileSyntax::blocks`]
    Block(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxVisibility {
    Private,
    Public,
    /// `pub(crate)`
    Crate,
    /// `pub(super)` or `pub(in path)`; the index points at the scope path
    Restricted(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxField {
    /// `None` for positional fields
    pub name: Option<String>,
    pub visibility: SyntaxVisibility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxItemKind {
    Module {
        /// Braced body of an inline module, `None` for `mod name;`
        body: Option<TextRange>,
        /// Value of a `#[path = "..."]` attribute
        path_attr: Option<String>,
    },
    Struct {
        fields: Vec<SyntaxField>,
        tuple: bool,
    },
    Union {
        fields: Vec<SyntaxField>,
    },
    Enum {
        variants: Vec<String>,
    },
    Function,
    Trait,
    Const,
    Static,
    TypeAlias,
    Macro,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxItem {
    pub name: String,
    pub kind: SyntaxItemKind,
    pub visibility: SyntaxVisibility,
    /// Range of the `visibility_modifier` node, if any
    pub visibility_range: Option<TextRange>,
    /// The item node itself
    pub range: TextRange,
    /// The item plus its leading attributes and doc comments
    pub full_range: TextRange,
    pub scope: LocalScope,
    /// Set for associated items of an `impl` block
    pub impl_index: Option<usize>,
}

impl SyntaxItem {
    /// `mod name;` without a body
    pub fn is_module_declaration(&self) -> bool {
        matches!(self.kind, SyntaxItemKind::Module { body: None, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxBlock {
    pub range: TextRange,
    pub parent: LocalScope,
}

/// A `use` list element, needed to split it out of its group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseGroupElement {
    pub element: TextRange,
    /// What to delete to drop the element together with its separator
    pub removal: TextRange,
    /// Only element of its list
    pub sole: bool,
    /// The list is the top-level argument of the declaration
    pub top_level: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathContext {
    Plain,
    Import {
        use_index: usize,
        group: Option<UseGroupElement>,
    },
    /// Scope path of a `pub(super)` / `pub(in ...)` clause
    Visibility { modifier: TextRange },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxPath {
    pub range: TextRange,
    pub text: String,
    /// Logical segments, including the prefix of enclosing use groups
    pub segments: Vec<String>,
    /// Index of the path this one is the qualifier of
    pub parent: Option<usize>,
    pub context: PathContext,
    pub scope: LocalScope,
}

impl SyntaxPath {
    /// One or more `super` segments and nothing else
    pub fn is_pure_super_chain(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| s == "super")
    }

    /// Only `self` / `super` segments
    pub fn is_relative_chain(&self) -> bool {
        !self.segments.is_empty()
            && self.segments.iter().all(|s| s == "super" || s == "self")
    }

    pub fn in_visibility(&self) -> bool {
        matches!(self.context, PathContext::Visibility { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseEntry {
    pub segments: Vec<String>,
    pub alias: Option<String>,
    pub glob: bool,
}

impl UseEntry {
    /// Name this entry brings into scope
    pub fn binding(&self) -> Option<&str> {
        if self.glob {
            return None;
        }
        match self.alias.as_deref() {
            Some("_") => None,
            Some(alias) => Some(alias),
            None => self.segments.last().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxUse {
    pub range: TextRange,
    pub scope: LocalScope,
    /// Visibility text including the trailing space, e.g. `"pub "`
    pub visibility: String,
    pub entries: Vec<UseEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxImpl {
    pub range: TextRange,
    pub scope: LocalScope,
    /// Path of the implementing type
    pub self_path: Option<usize>,
    pub is_trait_impl: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    Named(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    SelfValue,
    Binding(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSiteKind {
    FieldAccess { receiver: Receiver, field: FieldKey },
    MethodCall { receiver: Receiver, name: String },
    StructLiteralField { path: usize, field: FieldKey },
    StructPatternField { path: usize, field: FieldKey },
    TupleStructPattern { path: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSite {
    pub range: TextRange,
    pub kind: FieldSiteKind,
}

/// A local binding whose type can be read off the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxBinding {
    pub name: String,
    pub type_path: usize,
    /// Where the binding is in scope
    pub visible: TextRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSyntax {
    pub items: Vec<SyntaxItem>,
    pub blocks: Vec<SyntaxBlock>,
    pub paths: Vec<SyntaxPath>,
    pub uses: Vec<SyntaxUse>,
    pub impls: Vec<SyntaxImpl>,
    pub sites: Vec<FieldSite>,
    pub bindings: Vec<SyntaxBinding>,
    /// Offset where the file's own body ends
    pub len: usize,
}
