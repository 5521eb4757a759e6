//! [`ModuleTreeQuery`] and [`ReferenceResolver`] over a [`Program`] snapshot

use super::program::Program;
use crate::{
    interfaces::{ModuleTreeQuery, ReferenceResolver},
    types::{ModuleId, RefId, SiteId, Target, Visibility},
};

impl ModuleTreeQuery for Program {
    fn parent_of(&self, module: ModuleId) -> Option<ModuleId> {
        self.module(module).parent
    }

    fn crate_root_of(&self, module: ModuleId) -> ModuleId {
        self.module(module).crate_root
    }

    fn visibility_of(&self, module: ModuleId) -> Visibility {
        self.module(module).visibility
    }

    fn child_module_named(&self, module: ModuleId, name: &str) -> Option<ModuleId> {
        self.child_module(module, name)
    }
}

impl ReferenceResolver for Program {
    fn resolve(&self, reference: RefId) -> Option<Target> {
        self.reference(reference).target
    }

    fn resolve_site(&self, site: SiteId) -> Option<Target> {
        self.site(site).target
    }
}

impl Program {
    /// Whether `target` can be named from `from`, ignoring the path used to reach it
    pub fn target_visible_from(&self, target: Target, from: ModuleId) -> bool {
        match target {
            Target::Module(module) => self.module_visible_from(module, from),
            _ => {
                let (visibility, owner) = self.target_visibility(target);
                self.is_visible_from(visibility, owner, from)
            }
        }
    }

    /// `module` itself or one of its descendants
    pub fn is_in_subtree(&self, module: ModuleId, root: ModuleId) -> bool {
        self.is_ancestor_or_self(root, module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Workspace;

    fn program() -> Program {
        let workspace = Workspace::new(".")
            .with_crate_root("src/lib.rs")
            .with_file("src/lib.rs", "mod a;\npub mod c;\n")
            .with_file("src/a.rs", "mod b;\npub(super) mod x {}\n")
            .with_file("src/a/b.rs", "")
            .with_file("src/c.rs", "pub(crate) mod d {}\n");
        Program::from_workspace(workspace).unwrap()
    }

    #[test]
    fn test_ancestors_and_lca() {
        let program = program();
        let root = program.crate_roots().next().unwrap();
        let b = program.module_by_path(root, "crate::a::b").unwrap();
        let a = program.parent_of(b).unwrap();
        let d = program.module_by_path(root, "crate::c::d").unwrap();

        assert_eq!(program.ancestors(b), vec![b, a, root]);
        assert_eq!(program.lowest_common_ancestor(b, d), root);
        assert_eq!(program.lowest_common_ancestor(b, a), a);
        assert!(program.is_in_subtree(b, a));
        assert!(!program.is_in_subtree(a, b));
        assert_eq!(program.child_module_named(a, "b"), Some(b));
        assert_eq!(program.child_module_named(a, "c"), None);
    }

    #[test]
    fn test_module_visibility() {
        let program = program();
        let root = program.crate_roots().next().unwrap();
        let a = program.module_by_path(root, "crate::a").unwrap();
        let b = program.module_by_path(root, "crate::a::b").unwrap();
        let c = program.module_by_path(root, "crate::c").unwrap();
        let d = program.module_by_path(root, "crate::c::d").unwrap();
        let x = program.module_by_path(root, "crate::a::x").unwrap();

        // private `mod b;` is only visible inside `a`
        assert!(program.module_visible_from(b, a));
        assert!(program.module_visible_from(b, b));
        assert!(!program.module_visible_from(b, c));
        // `pub(crate)` and `pub(super)`
        assert!(program.module_visible_from(d, a));
        assert!(program.module_visible_from(x, c));
        assert!(program.module_visible_from(root, b));
    }
}
