//! Name, path and field resolution over a [`Program`] snapshot.
//!
//! Resolution is best-effort: names coming from std, external crates, local
//! variables or macros resolve to nothing. Namespaces are not distinguished,
//! and glob imports are consulted after items and explicit imports.

use super::program::{ItemKind, Program, ScopeKind};
use crate::{
    parser::syntax::{FieldKey, FieldSiteKind, Receiver, SyntaxItemKind},
    types::{FieldId, FileId, ItemId, ModuleId, ScopeId, SiteId, Target, TextRange, UseId},
};

/// Guards against import cycles (`use a::x; use b::x;` pointing at each other)
const MAX_RESOLVE_DEPTH: usize = 8;

/// Namespace the last segment of a path is looked up in. Qualifier segments
/// always use the type namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Type,
    Value,
}

impl Namespace {
    pub fn admits(self, kind: ItemKind) -> bool {
        match self {
            Namespace::Type => matches!(
                kind,
                ItemKind::Module
                    | ItemKind::Struct
                    | ItemKind::Union
                    | ItemKind::Enum
                    | ItemKind::Trait
                    | ItemKind::TypeAlias
            ),
            Namespace::Value => matches!(
                kind,
                ItemKind::Function | ItemKind::Const | ItemKind::Static | ItemKind::Struct
            ),
        }
    }
}

impl Program {
    /// Resolve `segments` as written in `scope`.
    ///
    /// `exclude` is the use declaration the path belongs to, which must not
    /// resolve through its own bindings; `self_type` is what `Self` names.
    pub fn resolve_path(
        &self,
        scope: ScopeId,
        segments: &[String],
        exclude: Option<UseId>,
        self_type: Option<ItemId>,
    ) -> Option<Target> {
        self.resolve_path_in(scope, segments, exclude, self_type, Namespace::Type)
    }

    /// [`Program::resolve_path`] with the namespace of the last segment given
    pub fn resolve_path_in(
        &self,
        scope: ScopeId,
        segments: &[String],
        exclude: Option<UseId>,
        self_type: Option<ItemId>,
        namespace: Namespace,
    ) -> Option<Target> {
        self.resolve_path_at(scope, segments, exclude, self_type, namespace, 0)
    }

    fn resolve_path_at(
        &self,
        scope: ScopeId,
        segments: &[String],
        exclude: Option<UseId>,
        self_type: Option<ItemId>,
        namespace: Namespace,
        depth: usize,
    ) -> Option<Target> {
        if depth > MAX_RESOLVE_DEPTH {
            return None;
        }
        let (first, rest) = segments.split_first()?;
        let module = self.scopes[scope.index()].module;
        let namespace_at = |index: usize| {
            if index + 1 == segments.len() {
                namespace
            } else {
                Namespace::Type
            }
        };

        let mut target = match first.as_str() {
            "crate" => Target::Module(self.modules[module.index()].crate_root),
            "self" => Target::Module(module),
            "super" => Target::Module(self.modules[module.index()].parent?),
            "Self" => Target::Item(self_type?),
            name => self.lookup_in_scope_chain(scope, name, exclude, namespace_at(0), depth)?,
        };

        for (index, segment) in rest.iter().enumerate() {
            target = match (segment.as_str(), target) {
                ("super", Target::Module(m)) => Target::Module(self.modules[m.index()].parent?),
                ("self", Target::Module(m)) => Target::Module(m),
                (name, current) => self.member(current, name, namespace_at(index + 1), depth)?,
            };
        }
        Some(target)
    }

    /// First-segment lookup: blocks outward, then the enclosing module
    fn lookup_in_scope_chain(
        &self,
        scope: ScopeId,
        name: &str,
        exclude: Option<UseId>,
        namespace: Namespace,
        depth: usize,
    ) -> Option<Target> {
        let mut current = Some(scope);
        while let Some(scope) = current {
            if let Some(target) = self.lookup_in_scope(scope, name, exclude, namespace, depth) {
                return Some(target);
            }
            current = self.scopes[scope.index()].parent;
        }
        None
    }

    fn lookup_in_scope(
        &self,
        scope: ScopeId,
        name: &str,
        exclude: Option<UseId>,
        namespace: Namespace,
        depth: usize,
    ) -> Option<Target> {
        let data = &self.scopes[scope.index()];

        // `fn b` and `mod b` may share a scope
        let mut named = data
            .items
            .iter()
            .copied()
            .filter(|&item| self.items[item.index()].name == name);
        let first = named.clone().next();
        if let Some(item) = named
            .find(|&item| namespace.admits(self.items[item.index()].kind))
            .or(first)
        {
            return Some(self.item_target(item));
        }

        let uses = data.uses.iter().filter(|&&u| Some(u) != exclude);
        for &use_id in uses.clone() {
            let use_scope = self.uses[use_id.index()].scope;
            for entry in &self.use_syntax(use_id).entries {
                if entry.binding() == Some(name) {
                    if let Some(target) = self.resolve_path_at(
                        use_scope,
                        &entry.segments,
                        Some(use_id),
                        None,
                        Namespace::Type,
                        depth + 1,
                    ) {
                        return Some(target);
                    }
                }
            }
        }

        for &use_id in uses {
            let use_scope = self.uses[use_id.index()].scope;
            for entry in self.use_syntax(use_id).entries.iter().filter(|e| e.glob) {
                let base = self.resolve_path_at(
                    use_scope,
                    &entry.segments,
                    Some(use_id),
                    None,
                    Namespace::Type,
                    depth + 1,
                );
                if let Some(target) = base.and_then(|b| self.member(b, name, namespace, depth + 1)) {
                    return Some(target);
                }
            }
        }
        None
    }

    /// `name` looked up inside `target`: module namespace, enum variant or
    /// inherent associated item
    fn member(&self, target: Target, name: &str, namespace: Namespace, depth: usize) -> Option<Target> {
        match target {
            Target::Module(module) => {
                let scope = self.modules[module.index()].scope;
                self.lookup_in_scope(scope, name, None, namespace, depth + 1)
            }
            Target::Item(item) => {
                let variant = match &self.item_syntax(item).kind {
                    SyntaxItemKind::Enum { variants } => variants.iter().position(|v| v == name),
                    _ => None,
                };
                match variant {
                    Some(index) => Some(Target::Variant(item, index)),
                    None => self.inherent_member(item, name),
                }
            }
            Target::Variant(..) | Target::Field(_) => None,
        }
    }

    pub(super) fn item_target(&self, item: ItemId) -> Target {
        let data = &self.items[item.index()];
        match (data.kind, data.child_module) {
            (ItemKind::Module, Some(module)) => Target::Module(module),
            _ => Target::Item(item),
        }
    }

    /// Associated item of an inherent impl of `ty`
    pub fn inherent_member(&self, ty: ItemId, name: &str) -> Option<Target> {
        self.inherent_impls
            .get(&ty)?
            .iter()
            .flat_map(|i| self.impls[i.index()].items.iter())
            .find(|&&item| self.items[item.index()].name == name)
            .map(|&item| Target::Item(item))
    }

    pub fn field_of(&self, ty: ItemId, key: &FieldKey) -> Option<FieldId> {
        self.items[ty.index()]
            .fields
            .iter()
            .copied()
            .find(|&field| {
                let data = &self.fields[field.index()];
                match key {
                    FieldKey::Named(name) => data.name.as_deref() == Some(name.as_str()),
                    FieldKey::Index(index) => data.name.is_none() && data.index == *index,
                }
            })
    }

    pub(super) fn resolve_site_uncached(&self, id: SiteId) -> Option<Target> {
        let data = &self.sites[id.index()];
        let site = self.site_syntax(id);

        match &site.kind {
            FieldSiteKind::FieldAccess { receiver, field } => {
                let ty = self.receiver_type(data.file, site.range, receiver)?;
                self.field_of(ty, field).map(Target::Field)
            }
            FieldSiteKind::MethodCall { receiver, name } => {
                let ty = self.receiver_type(data.file, site.range, receiver)?;
                self.inherent_member(ty, name)
            }
            FieldSiteKind::StructLiteralField { path, field }
            | FieldSiteKind::StructPatternField { path, field } => {
                let ty = self.path_type(data.file, *path)?;
                self.field_of(ty, field).map(Target::Field)
            }
            FieldSiteKind::TupleStructPattern { path } => {
                let ty = self.path_type(data.file, *path)?;
                (self.items[ty.index()].kind == ItemKind::Struct).then_some(Target::Item(ty))
            }
        }
    }

    /// Struct, union or enum a type path of `file` resolved to
    fn path_type(&self, file: FileId, local_path: usize) -> Option<ItemId> {
        match self.refs[self.ref_in_file(file, local_path).index()].target? {
            Target::Item(item) if self.items[item.index()].kind.is_type() => Some(item),
            _ => None,
        }
    }

    fn receiver_type(&self, file: FileId, range: TextRange, receiver: &Receiver) -> Option<ItemId> {
        match receiver {
            Receiver::SelfValue => self
                .impl_at(file, range)
                .and_then(|i| self.impls[i.index()].self_type),
            Receiver::Binding(name) => self.files[file.index()]
                .syntax
                .bindings
                .iter()
                .filter(|b| &b.name == name && b.visible.contains(range.start))
                .max_by_key(|b| b.visible.start)
                .and_then(|b| self.path_type(file, b.type_path)),
            Receiver::Unknown => None,
        }
    }

    /// Name bound in `scope` itself by an item or explicit import
    pub fn binds_name(&self, scope: ScopeId, name: &str, ignore: Option<ItemId>) -> bool {
        let data = &self.scopes[scope.index()];
        let by_item = data
            .items
            .iter()
            .any(|&item| Some(item) != ignore && self.items[item.index()].name == name);
        by_item || self.imports_name(scope, name)
    }

    /// Name bound in `scope` itself by an explicit import
    pub fn imports_name(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.index()].uses.iter().any(|&u| {
            self.use_syntax(u)
                .entries
                .iter()
                .any(|e| e.binding() == Some(name))
        })
    }

    /// Scopes from `scope` outward to its module scope, inclusive
    pub fn scope_chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        let mut current = scope;
        while let Some(parent) = self.scopes[current.index()].parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub fn is_module_scope(&self, scope: ScopeId) -> bool {
        matches!(self.scopes[scope.index()].kind, ScopeKind::Module(_))
    }

    /// Module a scope belongs to
    pub fn scope_module(&self, scope: ScopeId) -> ModuleId {
        self.scopes[scope.index()].module
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Program, Workspace};
    use crate::types::Target;

    fn program(files: &[(&str, &str)]) -> Program {
        let mut workspace = Workspace::new(".").with_crate_root("src/lib.rs");
        for (path, text) in files {
            workspace.insert_file(path, *text);
        }
        Program::from_workspace(workspace).unwrap()
    }

    fn target_of(program: &Program, text: &str) -> Option<Target> {
        let id = program
            .ref_ids()
            .find(|&r| program.ref_syntax(r).text == text)
            .unwrap_or_else(|| panic!("no path `{text}`"));
        program.reference(id).target
    }

    #[test]
    fn test_relative_and_absolute_paths() {
        let program = program(&[
            ("src/lib.rs", "mod a;\nmod c;\n"),
            ("src/a.rs", "pub mod b;\nfn f() { super::c::g(); }\n"),
            ("src/a/b.rs", "pub struct Thing;\n"),
            ("src/c.rs", "pub fn g() { let _ = crate::a::b::Thing; }\n"),
        ]);
        let root = program.crate_roots().next().unwrap();
        let c = program.module_by_path(root, "crate::c").unwrap();
        let b = program.module_by_path(root, "crate::a::b").unwrap();

        assert_eq!(target_of(&program, "super::c"), Some(Target::Module(c)));
        assert_eq!(target_of(&program, "crate::a::b"), Some(Target::Module(b)));
        assert!(matches!(
            target_of(&program, "crate::a::b::Thing"),
            Some(Target::Item(_))
        ));
    }

    #[test]
    fn test_imports_aliases_and_globs() {
        let program = program(&[
            (
                "src/lib.rs",
                "mod a;\nuse a::Thing as Renamed;\nuse a::*;\nfn f() { Renamed::new(); Other::default(); }\n",
            ),
            (
                "src/a.rs",
                "pub struct Thing;\nimpl Thing { pub fn new() -> Self { Thing } }\npub struct Other;\n",
            ),
        ]);

        assert!(matches!(target_of(&program, "Renamed::new"), Some(Target::Item(_))));
        assert!(matches!(target_of(&program, "Other"), Some(Target::Item(_))));
        // unresolved associated function of a type without inherent impl
        assert_eq!(target_of(&program, "Other::default"), None);
    }

    #[test]
    fn test_enum_variants_and_self() {
        let program = program(&[(
            "src/lib.rs",
            "enum E { A, B }\nimpl E { fn make() -> Self { Self::A } }\nfn f() { let _ = E::B; }\n",
        )]);
        assert!(matches!(target_of(&program, "Self::A"), Some(Target::Variant(_, 0))));
        assert!(matches!(target_of(&program, "E::B"), Some(Target::Variant(_, 1))));
    }

    #[test]
    fn test_field_sites_resolve() {
        let program = program(&[(
            "src/lib.rs",
            r#"
pub struct Point { pub x: i32, y: i32 }
impl Point {
    fn sum(&self) -> i32 { self.x + self.y }
}
fn f(p: Point) -> i32 {
    let q = Point { x: 1, y: 2 };
    let Point { x, .. } = q;
    p.sum() + x
}
"#,
        )]);

        let resolved = program
            .site_ids()
            .filter(|&s| program.site(s).target.is_some())
            .count();
        // self.x, self.y, two literal fields, one pattern field, one method call
        assert_eq!(resolved, 6);
    }
}
