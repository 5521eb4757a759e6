//! The move procedure as an explicit state machine.
//!
//! A [`MoveSession`] walks one request through validation, conflict
//! detection, confirmation and the rewriting steps. Every step reads the
//! snapshot the session was created with and only records edits in its
//! [`EditPlan`]; the caller decides whether to apply the plan.

use super::conflicts::{ConflictReport, ConflictsDetector};
use super::edits::EditPlan;
use super::rewriter::PathRewriter;
use super::usages::{ClassifiedUsages, OutsideReferences, classify, group_usages, is_outermost_super_chain};
use crate::{
    cache::{ParseCache, SharedParseCache},
    config::MoveConfig,
    error::{Error, PreconditionError, Result},
    interfaces::{
        AlwaysConfirm, ConfirmationGate, ModuleTreeQuery, ProgressReporter, ReferenceResolver,
        SyntaxMutator, UsageSearch,
    },
    model::{ModuleKind, Namespace, Program, Workspace},
    parser::syntax::{PathContext, SyntaxItemKind, SyntaxVisibility},
    parser::utils::{indentation, line_extended_range, line_start},
    services::UsageIndex,
    types::{FileId, ItemId, ModuleId, RefId, ScopeId, Target, TextRange},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MoveState {
    Validate,
    DetectConflicts,
    ConfirmWithCaller,
    AdjustInternalVisibilityScopes,
    RelocateDeclaration,
    RetargetImportUsages,
    RetargetOtherUsages,
    RewriteInternalRelativePaths,
    Done,
    Cancelled,
}

impl MoveState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MoveState::Done | MoveState::Cancelled)
    }
}

/// Files to move and the module that becomes their parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub files: Vec<PathBuf>,
    pub target: ModuleId,
}

impl MoveRequest {
    pub fn new(file: impl Into<PathBuf>, target: ModuleId) -> Self {
        Self {
            files: vec![file.into()],
            target,
        }
    }
}

/// Facts established by validation
#[derive(Debug, Clone)]
struct MoveContext {
    moved: ModuleId,
    file: FileId,
    declaration: ItemId,
    old_parent: ModuleId,
    new_parent: ModuleId,
    name: String,
    old_path: PathBuf,
    new_path: PathBuf,
    /// `crate::...::name` once moved
    new_segments: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub state: MoveState,
    pub report: ConflictReport,
    pub plan: EditPlan,
    /// Destination of the moved file, once validated
    pub new_path: Option<PathBuf>,
}

pub struct MoveSession<'p> {
    program: &'p Program,
    config: &'p MoveConfig,
    request: MoveRequest,
    state: MoveState,
    context: Option<MoveContext>,
    usages: Option<ClassifiedUsages>,
    outside: OutsideReferences,
    report: ConflictReport,
    plan: EditPlan,
}

impl<'p> MoveSession<'p> {
    pub fn new(program: &'p Program, config: &'p MoveConfig, request: MoveRequest) -> Self {
        Self {
            program,
            config,
            request,
            state: MoveState::Validate,
            context: None,
            usages: None,
            outside: OutsideReferences::default(),
            report: ConflictReport::default(),
            plan: EditPlan::new(),
        }
    }

    pub fn state(&self) -> MoveState {
        self.state
    }

    pub fn report(&self) -> &ConflictReport {
        &self.report
    }

    pub fn plan(&self) -> &EditPlan {
        &self.plan
    }

    /// Run the current step and move to the next state
    pub fn advance(
        &mut self,
        gate: &dyn ConfirmationGate,
        progress: &dyn ProgressReporter,
    ) -> Result<MoveState> {
        let next = match self.state {
            MoveState::Validate => {
                self.validate()?;
                MoveState::DetectConflicts
            }
            MoveState::DetectConflicts => match self.detect_conflicts(progress) {
                Ok(()) => MoveState::ConfirmWithCaller,
                Err(Error::Cancelled) => {
                    self.cancel();
                    return Err(Error::Cancelled);
                }
                Err(e) => return Err(e),
            },
            MoveState::ConfirmWithCaller => {
                if gate.confirm(&self.report) {
                    MoveState::AdjustInternalVisibilityScopes
                } else {
                    info!("move declined with {} conflicts", self.report.len());
                    self.cancel();
                    MoveState::Cancelled
                }
            }
            MoveState::AdjustInternalVisibilityScopes => {
                self.adjust_visibility_scopes()?;
                MoveState::RelocateDeclaration
            }
            MoveState::RelocateDeclaration => {
                self.relocate_declaration()?;
                MoveState::RetargetImportUsages
            }
            MoveState::RetargetImportUsages => {
                self.retarget_imports()?;
                MoveState::RetargetOtherUsages
            }
            MoveState::RetargetOtherUsages => {
                self.retarget_others()?;
                MoveState::RewriteInternalRelativePaths
            }
            MoveState::RewriteInternalRelativePaths => {
                self.rewrite_relative_paths()?;
                MoveState::Done
            }
            state @ (MoveState::Done | MoveState::Cancelled) => state,
        };

        debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(next)
    }

    /// Advance until the session is done or declined
    pub fn run(
        mut self,
        gate: &dyn ConfirmationGate,
        progress: &dyn ProgressReporter,
    ) -> Result<MoveOutcome> {
        while !self.state.is_terminal() {
            self.advance(gate, progress)?;
        }
        Ok(self.into_outcome())
    }

    pub fn into_outcome(self) -> MoveOutcome {
        MoveOutcome {
            state: self.state,
            report: self.report,
            plan: self.plan,
            new_path: self.context.map(|c| c.new_path),
        }
    }

    fn cancel(&mut self) {
        self.plan = EditPlan::new();
        self.state = MoveState::Cancelled;
    }

    fn context(&self) -> Result<&MoveContext> {
        self.context
            .as_ref()
            .ok_or_else(|| invariant("move context missing after validation"))
    }

    fn validate(&mut self) -> Result<()> {
        let program = self.program;
        let file = match self.request.files.as_slice() {
            [file] => file,
            files => return Err(PreconditionError::FileCount(files.len()).into()),
        };
        let file_id = program
            .file_id(file)
            .ok_or_else(|| PreconditionError::UnknownFile(file.clone()))?;
        let old_path = program.file(file_id).path.clone();
        let moved = program.file_module(file_id);
        if program.module(moved).kind == ModuleKind::CrateRoot {
            return Err(PreconditionError::CrateRoot(old_path).into());
        }

        let new_parent = self.request.target;
        if !program.module_ids().any(|m| m == new_parent) {
            return Err(PreconditionError::UnknownTarget(format!("#{}", new_parent.index())).into());
        }
        let target_path = program.module_path(new_parent);
        if program.crate_root_of(new_parent) != program.crate_root_of(moved) {
            return Err(PreconditionError::CrateMismatch {
                file: old_path,
                target: target_path,
            }
            .into());
        }
        if program.is_in_subtree(new_parent, moved) {
            return Err(PreconditionError::MoveIntoSelf(target_path).into());
        }

        let declaration = match program.declarations_of(file_id) {
            [declaration] => *declaration,
            declarations => {
                return Err(PreconditionError::AmbiguousDeclaration {
                    file: old_path,
                    count: declarations.len(),
                }
                .into());
            }
        };
        if let SyntaxItemKind::Module {
            path_attr: Some(_), ..
        } = &program.item_syntax(declaration).kind
        {
            return Err(PreconditionError::PathAttribute(old_path).into());
        }
        let has_file_children = program.module_ids().any(|m| {
            m != moved
                && program.is_in_subtree(m, moved)
                && program.module(m).kind == ModuleKind::File
        });
        if has_file_children {
            return Err(PreconditionError::DirectorySubtree(old_path).into());
        }

        // values such as `fn b` live beside `mod b`
        let name = program.module(moved).name.clone();
        let type_item_named = program.module_items(new_parent).iter().any(|&item| {
            let data = program.item(item);
            data.name == name && Namespace::Type.admits(data.kind)
        });
        if program.child_module_named(new_parent, &name).is_some()
            || type_item_named
            || program.imports_name(program.module(new_parent).scope, &name)
        {
            return Err(PreconditionError::NameCollision {
                target: target_path,
                name,
            }
            .into());
        }

        let dir = &program.module(new_parent).dir;
        let new_path = if old_path.file_name().and_then(|n| n.to_str()) == Some("mod.rs") {
            dir.join(&name).join("mod.rs")
        } else {
            dir.join(format!("{name}.rs"))
        };
        if program.workspace().contains(&new_path) {
            return Err(PreconditionError::DestinationExists(new_path).into());
        }

        let old_parent = program
            .module(moved)
            .parent
            .ok_or_else(|| invariant("non-root module without a parent"))?;
        let mut new_segments = PathRewriter::new(program).module_segments(new_parent);
        new_segments.push(name.clone());

        info!(
            "moving {} ({}) into {}",
            old_path.display(),
            program.module_path(moved),
            target_path
        );
        self.context = Some(MoveContext {
            moved,
            file: file_id,
            declaration,
            old_parent,
            new_parent,
            name,
            old_path,
            new_path,
            new_segments,
        });
        Ok(())
    }

    fn detect_conflicts(&mut self, progress: &dyn ProgressReporter) -> Result<()> {
        let program = self.program;
        let context = self.context()?.clone();

        let usages = UsageIndex::new(program).find_all_usages(&[Target::Module(context.moved)]);
        let classified = classify(program, context.moved, usages)?;
        if classified.declaration != context.declaration {
            return Err(invariant("usage search found a different module declaration"));
        }
        let outside = OutsideReferences::collect(program, context.file, context.moved);
        let report = ConflictsDetector::new(program, progress).detect(
            &classified,
            context.file,
            &outside,
            context.new_parent,
        )?;

        debug!(
            "{} import usages, {} other usages, {} outside references",
            classified.imports.len(),
            classified.others.len(),
            outside.len()
        );
        self.usages = Some(classified);
        self.outside = outside;
        self.report = report;
        Ok(())
    }

    fn adjust_visibility_scopes(&mut self) -> Result<()> {
        let program = self.program;
        let context = self.context()?.clone();
        let rewriter = PathRewriter::new(program);

        for reference in program.refs_in_file(context.file) {
            let path = program.ref_syntax(reference);
            let PathContext::Visibility { modifier } = &path.context else {
                continue;
            };
            if program.reference(reference).parent.is_some() {
                continue;
            }
            let Some(Target::Module(scope)) = program.resolve(reference) else {
                continue;
            };
            if program.is_in_subtree(scope, context.moved) {
                continue;
            }

            let new_scope = match rewriter.recomputed_scope(scope, context.new_parent) {
                Some(new_scope) => new_scope,
                None if is_relative(&path.segments) => scope,
                None => continue,
            };
            let clause = rewriter.visibility_clause(&self.plan, new_scope);
            debug!("visibility `{}` becomes `{}`", path.text, clause);
            self.plan.replace(&context.old_path, *modifier, clause);
        }
        Ok(())
    }

    fn relocate_declaration(&mut self) -> Result<()> {
        let program = self.program;
        let context = self.context()?.clone();
        let rewriter = PathRewriter::new(program);

        let declaration = program.item_syntax(context.declaration);
        let source_file = program.file(program.item(context.declaration).file);
        let source_text = source_file.text.as_str();
        let base = declaration.full_range.start;
        let mut text = declaration.full_range.slice(source_text).to_string();

        match (&declaration.visibility, declaration.visibility_range) {
            (SyntaxVisibility::Restricted(_), Some(range)) => {
                if let Some(scope) = program.module(context.moved).visibility.restricted_scope() {
                    let scope = rewriter
                        .recomputed_scope(scope, context.new_parent)
                        .unwrap_or(scope);
                    let clause = rewriter.visibility_clause(&self.plan, scope);
                    text.replace_range(range.start - base..range.end - base, &clause);
                }
            }
            (SyntaxVisibility::Private, _)
                if self.report.must_publicize && self.config.publicize_declarations =>
            {
                text.insert_str(declaration.range.start - base, "pub ");
            }
            _ => {}
        }

        self.plan.delete(
            &source_file.path,
            line_extended_range(source_text, declaration.full_range),
        );

        let destination = program.module(context.new_parent);
        let scope = destination.scope;
        let dest_file = program.file(destination.file);
        let indent = body_indent(program, scope);
        let text = reindent(&text, indentation(source_text, base), &indent);

        let last_declaration = program
            .module_items(context.new_parent)
            .iter()
            .map(|&item| program.item_syntax(item))
            .filter(|item| item.is_module_declaration())
            .map(|item| item.range)
            .max_by_key(|range| range.end);
        let last_use = last_use_range(program, scope);

        let inserted = match last_declaration.or(last_use) {
            Some(anchor) => {
                let line = format!("{}{text}", self.plan.newline(&indent));
                self.plan.insert_after(&dest_file.path, anchor.end, line)
            }
            None => insert_at_body_start_or_end(
                &mut self.plan,
                program,
                scope,
                &dest_file.path,
                &dest_file.text,
                &indent,
                &text,
            ),
        };
        if !inserted {
            return Err(invariant("module declaration insertion was dropped"));
        }

        debug!(
            "relocating `mod {}` from {} to {}",
            context.name,
            program.module_path(context.old_parent),
            program.module_path(context.new_parent)
        );
        self.plan
            .move_file(context.old_path.clone(), context.new_path.clone());
        Ok(())
    }

    fn retarget_imports(&mut self) -> Result<()> {
        let program = self.program;
        let context = self.context()?.clone();
        let imports = self
            .usages
            .as_ref()
            .map(|u| u.imports.clone())
            .ok_or_else(|| invariant("usages missing after conflict detection"))?;
        let new_text = self.plan.path_from_text(&context.new_segments);

        for reference in imports {
            let path = program.ref_syntax(reference);
            let file = program.file(program.reference(reference).file);

            match (&path.context, program.use_of_ref(reference)) {
                (PathContext::Import { group: Some(group), .. }, Some(use_id)) => {
                    let statement = program.use_syntax(use_id);
                    let remainder = &file.text[path.range.end..group.element.end];
                    let line = format!("{}use {}{};", statement.visibility, new_text, remainder);
                    if group.sole && group.top_level {
                        self.plan.replace(&file.path, statement.range, line);
                    } else {
                        let indent = indentation(&file.text, statement.range.start);
                        self.plan.delete(&file.path, group.removal);
                        self.plan.insert_after(
                            &file.path,
                            statement.range.end,
                            format!("\n{indent}{line}"),
                        );
                    }
                }
                _ => {
                    self.plan.replace(&file.path, path.range, new_text.clone());
                }
            }
        }
        Ok(())
    }

    fn retarget_others(&mut self) -> Result<()> {
        let program = self.program;
        let context = self.context()?.clone();
        let others = self
            .usages
            .as_ref()
            .map(|u| u.others.clone())
            .ok_or_else(|| invariant("usages missing after conflict detection"))?;
        if others.is_empty() {
            return Ok(());
        }

        let trial = program.rebuild(self.plan.apply(program.workspace())?)?;
        let trial_moved = trial
            .file_id(&context.new_path)
            .map(|file| trial.file_module(file))
            .ok_or_else(|| invariant("moved file is not part of the trial snapshot"))?;
        let expected = context.new_segments.join("::");
        if trial.module_path(trial_moved) != expected {
            return Err(invariant(&format!(
                "moved module resolves to `{}` instead of `{}`",
                trial.module_path(trial_moved),
                expected
            )));
        }

        let new_text = self.plan.path_from_text(&context.new_segments);
        let mut pending = Vec::new();
        for reference in others {
            if self.resolves_in_trial(&trial, trial_moved, reference) {
                continue;
            }
            if program.ref_syntax(reference).in_visibility() {
                self.replace_reference(reference, &new_text);
            } else {
                pending.push(reference);
            }
        }

        for group in group_usages(program, &pending) {
            let imported = group.references.len() > self.config.import_threshold
                && self.synthesize_import(&context, group.module, &group.references, &new_text);
            if imported {
                debug!(
                    "imported `{}` for {} usages `{}` in {}",
                    new_text,
                    group.references.len(),
                    group.text,
                    program.module_path(group.module)
                );
                for &reference in &group.references {
                    self.replace_reference(reference, &context.name);
                }
            } else {
                for &reference in &group.references {
                    self.replace_reference(reference, &new_text);
                }
            }
        }
        Ok(())
    }

    fn resolves_in_trial(&self, trial: &Program, trial_moved: ModuleId, reference: RefId) -> bool {
        let path = self.program.ref_syntax(reference);
        let file_path = &self.program.file(self.program.reference(reference).file).path;
        let Some(range) = self.plan.map_range(file_path, path.range) else {
            return false;
        };
        let Some(trial_file) = trial.file_id(&self.plan.moved_path(file_path)) else {
            return false;
        };
        trial.refs_in_file(trial_file).any(|r| {
            trial.ref_syntax(r).range == range && trial.resolve(r) == Some(Target::Module(trial_moved))
        })
    }

    /// Add `use crate::...::name;` for a group of usages in `module`, or
    /// report that the short name cannot be bound there
    fn synthesize_import(
        &mut self,
        context: &MoveContext,
        module: ModuleId,
        references: &[RefId],
        new_text: &str,
    ) -> bool {
        let program = self.program;
        if module == context.new_parent {
            return false;
        }

        let chains: Vec<Vec<ScopeId>> = references
            .iter()
            .map(|&r| program.scope_chain(program.reference(r).scope))
            .collect();
        let Some(first) = chains.first() else {
            return false;
        };
        let Some(common) = first
            .iter()
            .position(|scope| chains.iter().all(|chain| chain.contains(scope)))
        else {
            return false;
        };
        let Some(insertion) = first[common..]
            .iter()
            .copied()
            .find(|&s| program.is_module_scope(s) || !program.scope(s).uses.is_empty())
        else {
            return false;
        };

        let shadowed = chains.iter().any(|chain| {
            chain
                .iter()
                .take_while(|&&s| s != insertion)
                .chain(std::iter::once(&insertion))
                .any(|&s| program.binds_name(s, &context.name, Some(context.declaration)))
        });
        if shadowed {
            debug!(
                "`{}` is already bound in {}, keeping absolute paths",
                context.name,
                program.module_path(module)
            );
            return false;
        }

        let file = program.file(program.scope(insertion).file);
        let line = format!("use {new_text};");
        let indent = body_indent(program, insertion);
        let inserted = match last_use_range(program, insertion) {
            Some(anchor) => {
                let line = format!("{}{line}", self.plan.newline(&indent));
                self.plan.insert_after(&file.path, anchor.end, line)
            }
            None => insert_at_body_start_or_end(
                &mut self.plan,
                program,
                insertion,
                &file.path,
                &file.text,
                &indent,
                &line,
            ),
        };
        if !inserted {
            debug!(
                "import of `{}` in {} was dropped, keeping absolute paths",
                new_text,
                program.module_path(module)
            );
        }
        inserted
    }

    fn replace_reference(&mut self, reference: RefId, text: &str) {
        let path = self.program.ref_syntax(reference);
        let file = &self.program.file(self.program.reference(reference).file).path;
        self.plan.replace(file, path.range, text.to_string());
    }

    fn rewrite_relative_paths(&mut self) -> Result<()> {
        let program = self.program;
        let context = self.context()?.clone();
        let rewriter = PathRewriter::new(program);

        let chains: Vec<(RefId, ModuleId)> = self
            .outside
            .iter()
            .filter(|&(reference, _)| {
                is_outermost_super_chain(program, reference)
                    && !program.ref_syntax(reference).in_visibility()
            })
            .filter_map(|(reference, target)| target.as_module().map(|m| (reference, m)))
            .collect();

        for (reference, module) in chains {
            let path = program.ref_syntax(reference);
            let text = self.plan.path_from_text(&rewriter.module_segments(module));
            debug!("`{}` becomes `{}`", path.text, text);
            self.plan.replace(&context.old_path, path.range, text);
        }
        Ok(())
    }
}

/// Session factory holding the configuration and a parse cache shared by
/// every snapshot it builds
pub struct MoveEngine {
    config: MoveConfig,
    cache: SharedParseCache,
}

impl MoveEngine {
    pub fn new(config: MoveConfig) -> Result<Self> {
        let cache = ParseCache::shared(config.cache_capacity)?;
        Ok(Self { config, cache })
    }

    pub fn config(&self) -> &MoveConfig {
        &self.config
    }

    pub fn snapshot(&self, workspace: Workspace) -> Result<Program> {
        Program::build(workspace, Arc::clone(&self.cache))
    }

    /// Request moving `file` under the module at `target` (`crate::a::b`)
    pub fn request(&self, program: &Program, file: &Path, target: &str) -> Result<MoveRequest> {
        let file_id = program
            .file_id(file)
            .ok_or_else(|| PreconditionError::UnknownFile(file.to_path_buf()))?;
        let root = program.crate_root_of(program.file_module(file_id));
        let module = program
            .module_by_path(root, target)
            .ok_or_else(|| PreconditionError::UnknownTarget(target.to_string()))?;
        Ok(MoveRequest::new(file, module))
    }

    pub fn session<'p>(&'p self, program: &'p Program, request: MoveRequest) -> MoveSession<'p> {
        MoveSession::new(program, &self.config, request)
    }

    /// Validate and detect conflicts without planning any edit
    pub fn check(
        &self,
        program: &Program,
        request: MoveRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<ConflictReport> {
        let mut session = self.session(program, request);
        while session.state() != MoveState::ConfirmWithCaller {
            session.advance(&AlwaysConfirm, progress)?;
        }
        Ok(session.report)
    }

    pub fn plan(
        &self,
        program: &Program,
        request: MoveRequest,
        gate: &dyn ConfirmationGate,
        progress: &dyn ProgressReporter,
    ) -> Result<MoveOutcome> {
        self.session(program, request).run(gate, progress)
    }

    /// Plan and apply a move, returning the outcome and the resulting
    /// workspace (unchanged when the move was declined)
    pub fn execute(
        &self,
        workspace: Workspace,
        file: &Path,
        target: &str,
        gate: &dyn ConfirmationGate,
        progress: &dyn ProgressReporter,
    ) -> Result<(MoveOutcome, Workspace)> {
        let program = self.snapshot(workspace)?;
        let request = self.request(&program, file, target)?;
        let outcome = self.plan(&program, request, gate, progress)?;
        let result = match outcome.state {
            MoveState::Done => outcome.plan.apply(program.workspace())?,
            _ => program.workspace().clone(),
        };
        info!(
            "move finished in state {:?} with {} edits",
            outcome.state,
            outcome.plan.edit_count()
        );
        Ok((outcome, result))
    }
}

fn invariant(message: &str) -> Error {
    error!("{message}");
    Error::Invariant(message.to_string())
}

fn is_relative(segments: &[String]) -> bool {
    matches!(
        segments.first().map(String::as_str),
        Some("self") | Some("super")
    )
}

/// Indentation of the lines inside a scope's body
fn body_indent(program: &Program, scope: ScopeId) -> String {
    let data = program.scope(scope);
    let file = program.file(data.file);
    if data.range.start == 0 && data.range.end == file.text.len() {
        return String::new();
    }
    let first = data
        .items
        .iter()
        .map(|&item| program.item_syntax(item).full_range.start)
        .chain(data.uses.iter().map(|&u| program.use_syntax(u).range.start))
        .min();
    match first {
        Some(offset) if line_start(&file.text, offset) > data.range.start => {
            indentation(&file.text, offset).to_string()
        }
        _ => format!("{}    ", indentation(&file.text, data.range.start)),
    }
}

fn last_use_range(program: &Program, scope: ScopeId) -> Option<TextRange> {
    program
        .scope(scope)
        .uses
        .iter()
        .map(|&u| program.use_syntax(u).range)
        .max_by_key(|range| range.end)
}

/// Insert `line` before the first item of `scope`, or at the end of its body.
/// Returns whether the plan kept the insertion.
fn insert_at_body_start_or_end(
    plan: &mut EditPlan,
    program: &Program,
    scope: ScopeId,
    path: &Path,
    text: &str,
    indent: &str,
    line: &str,
) -> bool {
    let data = program.scope(scope);
    let file_level = data.range.start == 0 && data.range.end == text.len();
    let first_item = data
        .items
        .iter()
        .map(|&item| program.item_syntax(item).full_range.start)
        .min();

    if let Some(offset) = first_item {
        let start = line_start(text, offset);
        let after_brace = data.range.start + 1;
        return if start >= data.range.start && text[start..offset].trim().is_empty() {
            plan.insert_before(path, start, format!("{indent}{line}\n\n"))
        } else if !file_level
            && after_brace <= offset
            && text[after_brace..offset].trim().is_empty()
        {
            // `mod m { fn f() {} }`: break the line after `{`
            plan.replace(
                path,
                TextRange::new(after_brace, offset),
                format!("\n{indent}{line}\n{indent}"),
            )
        } else {
            plan.insert_before(path, offset, format!("{line}\n{indent}"))
        };
    }

    if file_level {
        let (offset, body) = if text.trim().is_empty() {
            (0, format!("{line}\n"))
        } else if text.ends_with('\n') {
            (text.len(), format!("{line}\n"))
        } else {
            (text.len(), format!("\n{line}\n"))
        };
        return plan.insert_after(path, offset, body);
    }

    // Inline module body `{ ... }` without items
    let inner = TextRange::new(data.range.start + 1, data.range.end.saturating_sub(1));
    let outer_indent = indentation(text, data.range.start);
    if inner.slice(text).trim().is_empty() {
        plan.replace(path, inner, format!("\n{indent}{line}\n{outer_indent}"))
    } else {
        let close = line_start(text, inner.end);
        if close > inner.start && text[close..inner.end].trim().is_empty() {
            plan.insert_before(path, close, format!("{indent}{line}\n"))
        } else {
            plan.insert_before(path, inner.end, format!(" {line} "))
        }
    }
}

/// Move continuation lines of `text` from `from` indentation to `to`
fn reindent(text: &str, from: &str, to: &str) -> String {
    let mut lines = text.split('\n');
    let mut result = lines.next().unwrap_or_default().to_string();
    for line in lines {
        result.push('\n');
        if line.trim().is_empty() {
            continue;
        }
        result.push_str(to);
        result.push_str(line.strip_prefix(from).unwrap_or(line));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{AlwaysConfirm, NoProgress, RejectConflicts};

    fn workspace() -> Workspace {
        Workspace::new(".")
            .with_crate_root("src/lib.rs")
            .with_file("src/lib.rs", "mod a;\nmod c;\n")
            .with_file("src/a.rs", "pub mod b;\nfn f() { super::a::b::Thing; }\n")
            .with_file("src/a/b.rs", "pub struct Thing;\n")
            .with_file("src/c.rs", "")
    }

    fn session_for<'p>(
        engine: &'p MoveEngine,
        program: &'p Program,
        target: &str,
    ) -> MoveSession<'p> {
        let request = engine
            .request(program, Path::new("src/a/b.rs"), target)
            .unwrap();
        engine.session(program, request)
    }

    #[test]
    fn test_states_advance_in_order() -> Result<()> {
        let engine = MoveEngine::new(MoveConfig::default())?;
        let program = engine.snapshot(workspace())?;
        let mut session = session_for(&engine, &program, "crate::c");

        let mut states = vec![session.state()];
        while !session.state().is_terminal() {
            states.push(session.advance(&AlwaysConfirm, &NoProgress)?);
        }
        assert_eq!(
            states,
            vec![
                MoveState::Validate,
                MoveState::DetectConflicts,
                MoveState::ConfirmWithCaller,
                MoveState::AdjustInternalVisibilityScopes,
                MoveState::RelocateDeclaration,
                MoveState::RetargetImportUsages,
                MoveState::RetargetOtherUsages,
                MoveState::RewriteInternalRelativePaths,
                MoveState::Done,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_declined_session_has_empty_plan() -> Result<()> {
        let engine = MoveEngine::new(MoveConfig::default())?;
        // `hidden` is private to `c`, so `a` loses access to `b`
        let workspace = workspace().with_file("src/c.rs", "mod hidden {}\n");
        let program = engine.snapshot(workspace)?;
        let outcome = session_for(&engine, &program, "crate::c::hidden")
            .run(&RejectConflicts, &NoProgress)?;

        assert_eq!(outcome.state, MoveState::Cancelled);
        assert!(!outcome.report.is_empty());
        assert!(outcome.plan.is_empty());
        Ok(())
    }

    #[test]
    fn test_relocation_into_inline_module() -> Result<()> {
        let engine = MoveEngine::new(MoveConfig::default())?;
        let workspace = workspace().with_file("src/c.rs", "pub mod inner {}\n");
        let program = engine.snapshot(workspace)?;
        let outcome = session_for(&engine, &program, "crate::c::inner")
            .run(&AlwaysConfirm, &NoProgress)?;

        assert_eq!(outcome.state, MoveState::Done);
        assert_eq!(outcome.new_path, Some(PathBuf::from("src/c/inner/b.rs")));
        let applied = outcome.plan.apply(program.workspace())?;
        assert_eq!(
            applied.file_text(Path::new("src/c.rs")),
            Some("pub mod inner {\n    pub mod b;\n}\n")
        );
        assert_eq!(
            applied.file_text(Path::new("src/a.rs")),
            Some("fn f() { crate::c::inner::b::Thing; }\n")
        );
        Ok(())
    }

    #[test]
    fn test_dropped_import_keeps_absolute_paths() -> Result<()> {
        let engine = MoveEngine::new(MoveConfig::default())?;
        let user = "mod inner {\n    fn h() {\n        crate::a::b::f();\n        crate::a::b::f();\n        crate::a::b::f();\n    }\n}\n";
        let workspace = Workspace::new(".")
            .with_crate_root("src/lib.rs")
            .with_file("src/lib.rs", "pub mod a;\npub mod c;\nmod user;\n")
            .with_file("src/a.rs", "pub mod b;\n")
            .with_file("src/a/b.rs", "pub fn f() {}\n")
            .with_file("src/c.rs", "")
            .with_file("src/user.rs", user);
        let program = engine.snapshot(workspace)?;
        let mut session = session_for(&engine, &program, "crate::c");
        while session.state() != MoveState::RetargetOtherUsages {
            session.advance(&AlwaysConfirm, &NoProgress)?;
        }

        // a replacement already spans the line the import would go before
        let user_path = Path::new("src/user.rs");
        assert!(session.plan.replace(user_path, TextRange::new(10, 16), "{\n    ".to_string()));
        let outcome = session.run(&AlwaysConfirm, &NoProgress)?;

        let applied = outcome.plan.apply(program.workspace())?;
        let expected = user.replace("crate::a::b", "crate::c::b");
        assert_eq!(applied.file_text(user_path), Some(expected.as_str()));
        Ok(())
    }

    #[test]
    fn test_reindent() {
        assert_eq!(
            reindent("#[cfg(test)]\n    mod b;", "    ", ""),
            "#[cfg(test)]\nmod b;"
        );
        assert_eq!(reindent("mod b;", "", "    "), "mod b;");
    }
}
