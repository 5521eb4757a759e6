//! Reverse index from definitions to the paths naming them

use crate::{
    interfaces::{ReferenceResolver, Usage, UsageSearch},
    model::Program,
    types::{RefId, Target},
};
use std::collections::HashMap;
use tracing::debug;

/// Usage search backed by the resolutions of one snapshot
pub struct UsageIndex<'p> {
    program: &'p Program,
    by_target: HashMap<Target, Vec<RefId>>,
}

impl<'p> UsageIndex<'p> {
    pub fn new(program: &'p Program) -> Self {
        let mut by_target: HashMap<Target, Vec<RefId>> = HashMap::new();
        for reference in program.ref_ids() {
            if let Some(target) = program.resolve(reference) {
                by_target.entry(target).or_default().push(reference);
            }
        }
        debug!("indexed {} resolved targets", by_target.len());
        Self { program, by_target }
    }
}

impl UsageSearch for UsageIndex<'_> {
    fn find_all_usages(&self, targets: &[Target]) -> Vec<Usage> {
        let mut usages = Vec::new();
        for target in targets {
            if let Target::Module(module) = target {
                let file = self.program.module(*module).file;
                if self.program.file_module(file) == *module {
                    usages.extend(
                        self.program
                            .declarations_of(file)
                            .iter()
                            .map(|&item| Usage::Declaration(item)),
                    );
                }
            }
            for &reference in self.by_target.get(target).into_iter().flatten() {
                let usage = match self.program.use_of_ref(reference) {
                    Some(_) => Usage::Import(reference),
                    None => Usage::Reference(reference),
                };
                usages.push(usage);
            }
        }
        usages.sort();
        usages.dedup();
        usages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Workspace;

    #[test]
    fn test_usages_of_file_module() {
        let workspace = Workspace::new(".")
            .with_crate_root("src/lib.rs")
            .with_file("src/lib.rs", "mod a;\nuse a::b::Thing;\nfn f() { a::b::helper(); }\n")
            .with_file("src/a.rs", "pub mod b;\n")
            .with_file("src/a/b.rs", "pub struct Thing;\npub fn helper() {}\n");
        let program = Program::from_workspace(workspace).unwrap();
        let root = program.crate_roots().next().unwrap();
        let b = program.module_by_path(root, "crate::a::b").unwrap();

        let usages = UsageIndex::new(&program).find_all_usages(&[Target::Module(b)]);
        let declarations = usages
            .iter()
            .filter(|u| matches!(u, Usage::Declaration(_)))
            .count();
        let imports = usages.iter().filter(|u| matches!(u, Usage::Import(_))).count();
        let others = usages
            .iter()
            .filter(|u| matches!(u, Usage::Reference(_)))
            .count();
        assert_eq!((declarations, imports, others), (1, 1, 1));
    }
}
