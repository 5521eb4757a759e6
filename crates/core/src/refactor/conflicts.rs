//! Visibility analysis of a planned move
//!
//! Read-only over the snapshot: the detector only reports what would stop
//! resolving, it never decides how to fix it.

use super::usages::{ClassifiedUsages, OutsideReferences, is_outermost_super_chain};
use crate::{
    error::{Error, Result},
    interfaces::{ModuleTreeQuery, ProgressReporter, ReferenceResolver},
    model::{ItemKind, Program},
    parser::syntax::FieldSiteKind,
    types::{FileId, ModuleId, RefId, SiteId, Target, TextRange},
};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Element a conflict is attached to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConflictKey {
    pub file: PathBuf,
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    #[serde(serialize_with = "serialize_conflicts")]
    conflicts: BTreeMap<ConflictKey, Vec<String>>,
    /// The moved declaration must become `pub` to stay reachable
    pub must_publicize: bool,
}

impl ConflictReport {
    pub fn add(&mut self, key: ConflictKey, message: String) {
        let messages = self.conflicts.entry(key).or_default();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    /// No conflicts; the publicize flag is not a conflict
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConflictKey, &[String])> {
        self.conflicts.iter().map(|(k, m)| (k, m.as_slice()))
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.conflicts.values().flatten().map(String::as_str)
    }
}

#[derive(Serialize)]
struct ConflictEntry<'a> {
    file: &'a Path,
    offset: usize,
    text: &'a str,
    messages: &'a [String],
}

fn serialize_conflicts<S: Serializer>(
    conflicts: &BTreeMap<ConflictKey, Vec<String>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(conflicts.iter().map(|(key, messages)| ConflictEntry {
        file: &key.file,
        offset: key.offset,
        text: &key.text,
        messages,
    }))
}

pub struct ConflictsDetector<'p> {
    program: &'p Program,
    progress: &'p dyn ProgressReporter,
    done: usize,
    total: usize,
}

impl<'p> ConflictsDetector<'p> {
    pub fn new(program: &'p Program, progress: &'p dyn ProgressReporter) -> Self {
        Self {
            program,
            progress,
            done: 0,
            total: 0,
        }
    }

    /// Conflicts of moving `moved_file` under `new_parent`
    pub fn detect(
        mut self,
        usages: &ClassifiedUsages,
        moved_file: FileId,
        outside: &OutsideReferences,
        new_parent: ModuleId,
    ) -> Result<ConflictReport> {
        let program = self.program;
        if self.progress.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let moved = program.file_module(moved_file);
        let sites: Vec<SiteId> = program.sites_in_file(moved_file).collect();
        self.total = usages.len() - 1 + outside.len() + sites.len();

        let mut report = ConflictReport::default();
        for reference in usages.references() {
            self.tick()?;
            self.check_inside_reference(&mut report, reference, moved, new_parent);
        }
        for (reference, target) in outside.iter() {
            self.tick()?;
            self.check_outside_reference(&mut report, reference, target, new_parent);
        }
        for site in sites {
            self.tick()?;
            self.check_site(&mut report, site, moved, new_parent);
        }

        debug!(
            "conflict detection for {}: {} conflicts, must publicize: {}",
            program.module_path(moved),
            report.len(),
            report.must_publicize
        );
        Ok(report)
    }

    fn tick(&mut self) -> Result<()> {
        if self.progress.is_cancelled() {
            debug!("conflict detection cancelled after {} elements", self.done);
            return Err(Error::Cancelled);
        }
        self.progress.report(self.done, self.total);
        self.done += 1;
        Ok(())
    }

    fn check_inside_reference(
        &self,
        report: &mut ConflictReport,
        reference: RefId,
        moved: ModuleId,
        new_parent: ModuleId,
    ) {
        let program = self.program;
        let from = program.reference(reference).module;
        if program.is_in_subtree(from, moved) || program.ref_syntax(reference).in_visibility() {
            return;
        }

        for module in program.ancestors(new_parent).into_iter().rev() {
            if !program.module_visible_from(module, from) {
                report.add(
                    self.ref_key(reference),
                    format!(
                        "module `{}` is not accessible from `{}`",
                        program.module_path(module),
                        program.module_path(from)
                    ),
                );
            }
        }
        if !program.is_in_subtree(from, new_parent) {
            report.must_publicize = true;
        }
    }

    fn check_outside_reference(
        &self,
        report: &mut ConflictReport,
        reference: RefId,
        target: Target,
        new_parent: ModuleId,
    ) {
        let program = self.program;
        let path = program.ref_syntax(reference);
        if path.in_visibility() {
            return;
        }

        if path.is_pure_super_chain() {
            if !is_outermost_super_chain(program, reference) {
                return;
            }
            let Target::Module(module) = target else {
                return;
            };
            let root = program.crate_root_of(module);
            for ancestor in program.ancestors(module) {
                if ancestor != root && !program.module_visible_from(ancestor, new_parent) {
                    report.add(
                        self.ref_key(reference),
                        format!(
                            "module `{}` is not accessible from `{}`",
                            program.module_path(ancestor),
                            program.module_path(new_parent)
                        ),
                    );
                }
            }
        } else if !program.target_visible_from(target, new_parent) {
            report.add(
                self.ref_key(reference),
                format!(
                    "{} `{}` is not accessible from `{}`",
                    self.describe(target),
                    program.target_path(target),
                    program.module_path(new_parent)
                ),
            );
        }
    }

    fn check_site(
        &self,
        report: &mut ConflictReport,
        site: SiteId,
        moved: ModuleId,
        new_parent: ModuleId,
    ) {
        let program = self.program;
        let Some(target) = program.resolve_site(site) else {
            return;
        };
        if program.is_in_subtree(program.target_module(target), moved) {
            return;
        }

        match (&program.site_syntax(site).kind, target) {
            (FieldSiteKind::TupleStructPattern { .. }, Target::Item(item)) => {
                let hidden = program
                    .item(item)
                    .fields
                    .iter()
                    .any(|&f| !program.target_visible_from(Target::Field(f), new_parent));
                if hidden {
                    report.add(
                        self.site_key(site),
                        format!(
                            "struct `{}` has fields that are not accessible from `{}`",
                            program.target_path(target),
                            program.module_path(new_parent)
                        ),
                    );
                }
            }
            _ if !program.target_visible_from(target, new_parent) => {
                report.add(
                    self.site_key(site),
                    format!(
                        "{} `{}` is not accessible from `{}`",
                        self.describe(target),
                        program.target_path(target),
                        program.module_path(new_parent)
                    ),
                );
            }
            _ => {}
        }
    }

    fn describe(&self, target: Target) -> &'static str {
        match target {
            Target::Module(_) => "module",
            Target::Variant(..) => "variant",
            Target::Field(_) => "field",
            Target::Item(item) => {
                let data = self.program.item(item);
                match data.kind {
                    ItemKind::Function if data.impl_owner.is_some() => "method",
                    ItemKind::Function => "function",
                    ItemKind::Struct => "struct",
                    ItemKind::Union => "union",
                    ItemKind::Enum => "enum",
                    ItemKind::Trait => "trait",
                    ItemKind::Const => "constant",
                    ItemKind::Static => "static",
                    ItemKind::TypeAlias => "type alias",
                    ItemKind::Macro => "macro",
                    ItemKind::Module => "module",
                }
            }
        }
    }

    fn ref_key(&self, reference: RefId) -> ConflictKey {
        let path = self.program.ref_syntax(reference);
        let file = self.program.reference(reference).file;
        ConflictKey {
            file: self.program.file(file).path.clone(),
            offset: path.range.start,
            text: path.text.clone(),
        }
    }

    fn site_key(&self, site: SiteId) -> ConflictKey {
        let range: TextRange = self.program.site_syntax(site).range;
        let file = self.program.file(self.program.site(site).file);
        ConflictKey {
            file: file.path.clone(),
            offset: range.start,
            text: range.slice(&file.text).to_string(),
        }
    }
}
