//! Module hierarchy queries

use crate::types::{ModuleId, Visibility};

/// Read-only view of the module trees of a snapshot
pub trait ModuleTreeQuery {
    fn parent_of(&self, module: ModuleId) -> Option<ModuleId>;

    fn crate_root_of(&self, module: ModuleId) -> ModuleId;

    /// Visibility of the module's own declaration
    fn visibility_of(&self, module: ModuleId) -> Visibility;

    fn child_module_named(&self, module: ModuleId, name: &str) -> Option<ModuleId>;

    /// `module`, its parent, ..., up to and including the crate root
    fn ancestors(&self, module: ModuleId) -> Vec<ModuleId> {
        let mut chain = vec![module];
        let mut current = module;
        while let Some(parent) = self.parent_of(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    fn is_ancestor_or_self(&self, ancestor: ModuleId, module: ModuleId) -> bool {
        self.ancestors(module).contains(&ancestor)
    }

    fn lowest_common_ancestor(&self, a: ModuleId, b: ModuleId) -> ModuleId {
        let chain = self.ancestors(b);
        self.ancestors(a)
            .into_iter()
            .find(|m| chain.contains(m))
            .unwrap_or_else(|| self.crate_root_of(a))
    }

    /// Whether something with `visibility`, declared in `owner`, can be named from `from`
    fn is_visible_from(&self, visibility: Visibility, owner: ModuleId, from: ModuleId) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Private => self.is_ancestor_or_self(owner, from),
            Visibility::Restricted(scope) => self.is_ancestor_or_self(scope, from),
        }
    }

    /// Whether the declaration of `module` can be named from `from`
    fn module_visible_from(&self, module: ModuleId, from: ModuleId) -> bool {
        match self.parent_of(module) {
            None => true,
            Some(parent) => self.is_visible_from(self.visibility_of(module), parent, from),
        }
    }
}
