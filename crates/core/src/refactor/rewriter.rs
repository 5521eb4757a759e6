//! Identity-preserving path and visibility rendering

use crate::{
    interfaces::{ModuleTreeQuery, SyntaxMutator},
    model::Program,
    types::ModuleId,
};

/// Pure helper; never touches the module tree
pub struct PathRewriter<'p> {
    program: &'p Program,
}

impl<'p> PathRewriter<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    /// `crate` followed by a crate-relative path
    pub fn crate_rooted(relative: &[String]) -> Vec<String> {
        let mut segments = Vec::with_capacity(relative.len() + 1);
        segments.push("crate".to_string());
        segments.extend(relative.iter().cloned());
        segments
    }

    pub fn module_segments(&self, module: ModuleId) -> Vec<String> {
        Self::crate_rooted(&self.program.crate_relative_segments(module))
    }

    /// Scope a restricted clause needs once its item lives under
    /// `new_parent`, or `None` when `old_scope` still covers it
    pub fn recomputed_scope(&self, old_scope: ModuleId, new_parent: ModuleId) -> Option<ModuleId> {
        let scope = self.program.lowest_common_ancestor(old_scope, new_parent);
        (scope != old_scope).then_some(scope)
    }

    /// `pub(crate)` for a crate root, `pub(in crate::a::b)` otherwise
    pub fn visibility_clause(&self, mutator: &dyn SyntaxMutator, scope: ModuleId) -> String {
        let path = mutator.path_from_text(&self.module_segments(scope));
        mutator.visibility_from_text(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Workspace;
    use crate::refactor::EditPlan;

    #[test]
    fn test_scope_recomputation_and_rendering() {
        let workspace = Workspace::new(".")
            .with_crate_root("src/lib.rs")
            .with_file("src/lib.rs", "mod a { pub mod x {} }\nmod c {}\n");
        let program = Program::from_workspace(workspace).unwrap();
        let root = program.crate_roots().next().unwrap();
        let a = program.module_by_path(root, "crate::a").unwrap();
        let x = program.module_by_path(root, "crate::a::x").unwrap();
        let c = program.module_by_path(root, "crate::c").unwrap();

        let rewriter = PathRewriter::new(&program);
        assert_eq!(rewriter.recomputed_scope(a, x), None);
        assert_eq!(rewriter.recomputed_scope(a, c), Some(root));

        let plan = EditPlan::new();
        assert_eq!(rewriter.visibility_clause(&plan, root), "pub(crate)");
        assert_eq!(rewriter.visibility_clause(&plan, x), "pub(in crate::a::x)");
        assert_eq!(
            PathRewriter::crate_rooted(&[]),
            vec!["crate".to_string()]
        );
    }
}
