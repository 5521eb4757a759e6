//! Classification and grouping of the usages of a moved module

use crate::{
    error::{Error, Result},
    interfaces::{ReferenceResolver, Usage},
    model::Program,
    types::{FileId, ItemId, ModuleId, RefId, Target},
};
use std::collections::BTreeMap;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedUsages {
    /// The `mod name;` item in the old parent
    pub declaration: ItemId,
    pub imports: Vec<RefId>,
    pub others: Vec<RefId>,
}

impl ClassifiedUsages {
    pub fn len(&self) -> usize {
        1 + self.imports.len() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Import and other usages, in order
    pub fn references(&self) -> impl Iterator<Item = RefId> + '_ {
        self.imports.iter().chain(self.others.iter()).copied()
    }
}

/// Split `usages` of `moved` into declaration, import and other buckets.
///
/// `self`/`super`-only paths written inside the moved subtree stay valid
/// wherever the subtree goes, so they are not usages for the move.
pub fn classify(program: &Program, moved: ModuleId, usages: Vec<Usage>) -> Result<ClassifiedUsages> {
    let mut declarations = Vec::new();
    let mut imports = Vec::new();
    let mut others = Vec::new();

    for usage in usages {
        match usage {
            Usage::Declaration(item) => declarations.push(item),
            Usage::Import(reference) | Usage::Reference(reference) => {
                let inside = program.is_in_subtree(program.reference(reference).module, moved);
                if inside && program.ref_syntax(reference).is_relative_chain() {
                    continue;
                }
                match usage {
                    Usage::Import(_) => imports.push(reference),
                    _ => others.push(reference),
                }
            }
        }
    }

    match declarations.as_slice() {
        [declaration] => Ok(ClassifiedUsages {
            declaration: *declaration,
            imports,
            others,
        }),
        found => {
            let message = format!(
                "module `{}` has {} declarations, expected exactly one",
                program.module_path(moved),
                found.len()
            );
            error!("{message}");
            Err(Error::Invariant(message))
        }
    }
}

/// Usages sharing a containing module and literal text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageGroup {
    pub module: ModuleId,
    pub text: String,
    pub references: Vec<RefId>,
}

pub fn group_usages(program: &Program, references: &[RefId]) -> Vec<UsageGroup> {
    let mut groups: BTreeMap<(ModuleId, String), Vec<RefId>> = BTreeMap::new();
    for &reference in references {
        let key = (
            program.reference(reference).module,
            program.ref_syntax(reference).text.clone(),
        );
        groups.entry(key).or_default().push(reference);
    }
    groups
        .into_iter()
        .map(|((module, text), references)| UsageGroup {
            module,
            text,
            references,
        })
        .collect()
}

/// Paths in the moved file that resolve outside the moved subtree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutsideReferences {
    references: BTreeMap<RefId, Target>,
}

impl OutsideReferences {
    pub fn collect(program: &Program, file: FileId, moved: ModuleId) -> Self {
        let references = program
            .refs_in_file(file)
            .filter_map(|reference| {
                let target = program.resolve(reference)?;
                let inside = program.is_in_subtree(program.target_module(target), moved);
                (!inside).then_some((reference, target))
            })
            .collect();
        Self { references }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RefId, Target)> + '_ {
        self.references.iter().map(|(&r, &t)| (r, t))
    }

    pub fn get(&self, reference: RefId) -> Option<Target> {
        self.references.get(&reference).copied()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// A pure `super` chain that is not the qualifier of a longer pure chain
pub fn is_outermost_super_chain(program: &Program, reference: RefId) -> bool {
    program.ref_syntax(reference).is_pure_super_chain()
        && program
            .reference(reference)
            .parent
            .is_none_or(|parent| !program.ref_syntax(parent).is_pure_super_chain())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::UsageSearch;
    use crate::model::Workspace;
    use crate::services::UsageIndex;
    use std::path::Path;

    fn program() -> Program {
        let workspace = Workspace::new(".")
            .with_crate_root("src/lib.rs")
            .with_file("src/lib.rs", "mod a;\nmod d;\n")
            .with_file(
                "src/a.rs",
                "pub mod b;\nuse self::b::Thing;\nfn f() { b::Thing; b::Thing; self::b::Thing; }\n",
            )
            .with_file(
                "src/a/b.rs",
                "pub struct Thing;\nmod inner { use super::Thing; fn g() { super::super::helper(); } }\n",
            )
            .with_file("src/d.rs", "");
        Program::from_workspace(workspace).unwrap()
    }

    fn moved(program: &Program) -> ModuleId {
        let root = program.crate_roots().next().unwrap();
        program.module_by_path(root, "crate::a::b").unwrap()
    }

    #[test]
    fn test_classify_and_group() -> Result<()> {
        let program = program();
        let b = moved(&program);
        let usages = UsageIndex::new(&program).find_all_usages(&[Target::Module(b)]);
        let classified = classify(&program, b, usages)?;

        assert_eq!(classified.imports.len(), 1);
        // `super` inside `inner` names the moved module itself and is skipped
        assert_eq!(classified.others.len(), 3);

        let groups = group_usages(&program, &classified.others);
        let texts: Vec<_> = groups.iter().map(|g| (g.text.as_str(), g.references.len())).collect();
        assert_eq!(texts, vec![("b", 2), ("self::b", 1)]);
        Ok(())
    }

    #[test]
    fn test_outside_references() {
        let program = program();
        let b = moved(&program);
        let file = program.file_id(Path::new("src/a/b.rs")).unwrap();
        let outside = OutsideReferences::collect(&program, file, b);

        let texts: Vec<_> = outside
            .iter()
            .map(|(r, _)| program.ref_syntax(r).text.as_str())
            .collect();
        assert_eq!(texts, vec!["super::super"]);
        let chain = outside.iter().next().unwrap().0;
        assert!(is_outermost_super_chain(&program, chain));
    }
}
