//! Immutable snapshot of every crate in a [`Workspace`].
//!
//! Building a `Program` parses each reachable file once, links the files into
//! one module tree per crate root and resolves every path occurrence and
//! field site eagerly. Ids handed out by a snapshot index its flat tables and
//! are only valid for that snapshot; edits produce a new workspace from which
//! a new snapshot is rebuilt.

use super::resolve::Namespace;
use super::workspace::{Workspace, normalize};
use crate::{
    cache::{ParseCache, SharedParseCache, parse_cache::DEFAULT_CACHE_CAPACITY},
    error::{Error, Result},
    parser::syntax::{
        FileSyntax, LocalScope, PathContext, SyntaxItemKind, SyntaxPath, SyntaxVisibility,
    },
    types::{
        FieldId, FileId, ImplId, ItemId, ModuleId, RefId, ScopeId, SiteId, Target, TextRange,
        UseId, Visibility,
    },
};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModuleKind {
    /// `lib.rs`, `main.rs` or any other crate target
    CrateRoot,
    /// Backed by its own file through `mod name;`
    File,
    /// `mod name { ... }`
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemKind {
    Module,
    Struct,
    Union,
    Enum,
    Function,
    Trait,
    Const,
    Static,
    TypeAlias,
    Macro,
}

impl ItemKind {
    fn from_syntax(kind: &SyntaxItemKind) -> Self {
        match kind {
            SyntaxItemKind::Module { .. } => ItemKind::Module,
            SyntaxItemKind::Struct { .. } => ItemKind::Struct,
            SyntaxItemKind::Union { .. } => ItemKind::Union,
            SyntaxItemKind::Enum { .. } => ItemKind::Enum,
            SyntaxItemKind::Function => ItemKind::Function,
            SyntaxItemKind::Trait => ItemKind::Trait,
            SyntaxItemKind::Const => ItemKind::Const,
            SyntaxItemKind::Static => ItemKind::Static,
            SyntaxItemKind::TypeAlias => ItemKind::TypeAlias,
            SyntaxItemKind::Macro => ItemKind::Macro,
        }
    }

    /// Kinds that own fields or variants and can carry inherent impls
    pub fn is_type(&self) -> bool {
        matches!(self, ItemKind::Struct | ItemKind::Union | ItemKind::Enum)
    }
}

#[derive(Debug, Clone)]
pub struct FileData {
    pub path: PathBuf,
    pub text: String,
    pub syntax: Arc<FileSyntax>,
    /// The module this file is the body of
    pub module: ModuleId,
    item_base: usize,
    ref_base: usize,
    use_base: usize,
    impl_base: usize,
    site_base: usize,
}

#[derive(Debug, Clone)]
pub struct ModuleData {
    pub name: String,
    pub kind: ModuleKind,
    pub parent: Option<ModuleId>,
    pub crate_root: ModuleId,
    pub file: FileId,
    /// The `mod` item introducing this module
    pub decl: Option<ItemId>,
    /// Body scope
    pub scope: ScopeId,
    pub visibility: Visibility,
    /// Directory in which `mod child;` looks for files
    pub dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ItemData {
    pub name: String,
    pub kind: ItemKind,
    pub visibility: Visibility,
    /// Module whose namespace (or one of whose blocks) holds the item
    pub module: ModuleId,
    pub file: FileId,
    /// Index into the file's [`FileSyntax::items`]
    pub local: usize,
    pub scope: ScopeId,
    pub impl_owner: Option<ImplId>,
    pub fields: Vec<FieldId>,
    /// For `mod` items, the module they introduce
    pub child_module: Option<ModuleId>,
}

#[derive(Debug, Clone)]
pub struct FieldData {
    pub owner: ItemId,
    pub name: Option<String>,
    pub index: usize,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module(ModuleId),
    Block,
}

#[derive(Debug, Clone)]
pub struct ScopeData {
    pub kind: ScopeKind,
    /// Enclosing scope; module scopes do not see their parent's names
    pub parent: Option<ScopeId>,
    pub module: ModuleId,
    pub file: FileId,
    pub range: TextRange,
    pub items: Vec<ItemId>,
    pub uses: Vec<UseId>,
}

#[derive(Debug, Clone)]
pub struct UseData {
    pub file: FileId,
    pub local: usize,
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
pub struct RefData {
    pub file: FileId,
    pub local: usize,
    pub module: ModuleId,
    pub scope: ScopeId,
    /// The path this one qualifies
    pub parent: Option<RefId>,
    pub target: Option<Target>,
}

#[derive(Debug, Clone)]
pub struct ImplData {
    pub file: FileId,
    pub local: usize,
    pub scope: ScopeId,
    pub self_type: Option<ItemId>,
    pub is_trait_impl: bool,
    pub items: Vec<ItemId>,
}

#[derive(Debug, Clone)]
pub struct SiteData {
    pub file: FileId,
    pub local: usize,
    pub target: Option<Target>,
}

/// Module-tree snapshot with every resolution precomputed
pub struct Program {
    workspace: Workspace,
    cache: SharedParseCache,
    pub(super) files: Vec<FileData>,
    file_index: HashMap<PathBuf, FileId>,
    pub(super) modules: Vec<ModuleData>,
    pub(super) items: Vec<ItemData>,
    pub(super) fields: Vec<FieldData>,
    pub(super) scopes: Vec<ScopeData>,
    pub(super) uses: Vec<UseData>,
    pub(super) refs: Vec<RefData>,
    pub(super) impls: Vec<ImplData>,
    pub(super) sites: Vec<SiteData>,
    file_decls: HashMap<FileId, Vec<ItemId>>,
    pub(super) inherent_impls: HashMap<ItemId, Vec<ImplId>>,
}

struct ModuleSeed {
    name: String,
    kind: ModuleKind,
    parent: Option<ModuleId>,
    decl: Option<ItemId>,
}

struct PendingDeclaration {
    item: ItemId,
    name: String,
    parent: ModuleId,
    candidates: Vec<PathBuf>,
}

/// Scopes created for one file's blocks and inline modules
struct LocalScopes {
    root: ScopeId,
    blocks: Vec<Option<ScopeId>>,
    inline_modules: Vec<Option<ModuleId>>,
}

impl Program {
    pub fn from_workspace(workspace: Workspace) -> Result<Self> {
        Self::build(workspace, ParseCache::shared(DEFAULT_CACHE_CAPACITY)?)
    }

    pub fn build(workspace: Workspace, cache: SharedParseCache) -> Result<Self> {
        let mut program = Program {
            workspace,
            cache,
            files: Vec::new(),
            file_index: HashMap::new(),
            modules: Vec::new(),
            items: Vec::new(),
            fields: Vec::new(),
            scopes: Vec::new(),
            uses: Vec::new(),
            refs: Vec::new(),
            impls: Vec::new(),
            sites: Vec::new(),
            file_decls: HashMap::new(),
            inherent_impls: HashMap::new(),
        };

        let roots = program.workspace.crate_roots().to_vec();
        for root in roots {
            if program.file_index.contains_key(&root) {
                warn!("{} is already part of another crate", root.display());
                continue;
            }
            let Some(text) = program.workspace.file_text(&root).map(str::to_string) else {
                warn!("crate root {} is not loaded", root.display());
                continue;
            };
            let name = root
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "crate".to_string());

            let mut pending = VecDeque::new();
            let seed = ModuleSeed {
                name,
                kind: ModuleKind::CrateRoot,
                parent: None,
                decl: None,
            };
            program.instantiate(&root, text, seed, &mut pending)?;
            while let Some(declaration) = pending.pop_front() {
                program.link_declaration(declaration, &mut pending)?;
            }
        }

        program.resolve_impls();
        program.resolve_references();
        program.resolve_visibilities();
        program.resolve_sites();

        debug!(
            "Built snapshot: {} files, {} modules, {} items, {} paths",
            program.files.len(),
            program.modules.len(),
            program.items.len(),
            program.refs.len()
        );
        Ok(program)
    }

    /// New snapshot of `workspace` sharing this snapshot's parse cache
    pub fn rebuild(&self, workspace: Workspace) -> Result<Self> {
        Self::build(workspace, Arc::clone(&self.cache))
    }

    fn parse(&self, text: &str) -> Result<Arc<FileSyntax>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| Error::Invariant("parse cache lock poisoned".to_string()))?;
        cache.get_or_parse(text)
    }

    fn link_declaration(
        &mut self,
        declaration: PendingDeclaration,
        pending: &mut VecDeque<PendingDeclaration>,
    ) -> Result<()> {
        let Some(path) = declaration
            .candidates
            .iter()
            .find(|c| self.workspace.contains(c))
            .cloned()
        else {
            debug!(
                "no file found for module `{}` (tried {:?})",
                declaration.name, declaration.candidates
            );
            return Ok(());
        };

        let module = match self.file_index.get(&path) {
            Some(&file) => {
                let module = self.files[file.index()].module;
                if self.modules[module.index()].kind == ModuleKind::CrateRoot {
                    warn!("`mod {};` points at crate root {}", declaration.name, path.display());
                    return Ok(());
                }
                module
            }
            None => {
                let text = self
                    .workspace
                    .file_text(&path)
                    .map(str::to_string)
                    .unwrap_or_default();
                let seed = ModuleSeed {
                    name: declaration.name,
                    kind: ModuleKind::File,
                    parent: Some(declaration.parent),
                    decl: Some(declaration.item),
                };
                self.instantiate(&path, text, seed, pending)?
            }
        };

        let file = self.modules[module.index()].file;
        self.items[declaration.item.index()].child_module = Some(module);
        self.file_decls.entry(file).or_default().push(declaration.item);
        Ok(())
    }

    fn instantiate(
        &mut self,
        path: &Path,
        text: String,
        seed: ModuleSeed,
        pending: &mut VecDeque<PendingDeclaration>,
    ) -> Result<ModuleId> {
        let syntax = self.parse(&text)?;
        let file = FileId(self.files.len());
        let module = ModuleId(self.modules.len());
        let crate_root = seed
            .parent
            .map(|p| self.modules[p.index()].crate_root)
            .unwrap_or(module);

        let root = self.push_scope(
            ScopeKind::Module(module),
            None,
            module,
            file,
            TextRange::new(0, text.len()),
        );
        self.modules.push(ModuleData {
            name: seed.name,
            kind: seed.kind,
            parent: seed.parent,
            crate_root,
            file,
            decl: seed.decl,
            scope: root,
            visibility: Visibility::Public,
            dir: owned_dir(path, seed.kind),
        });
        self.files.push(FileData {
            path: path.to_path_buf(),
            text,
            syntax: Arc::clone(&syntax),
            module,
            item_base: 0,
            ref_base: 0,
            use_base: 0,
            impl_base: 0,
            site_base: 0,
        });
        self.file_index.insert(path.to_path_buf(), file);

        let mut local = LocalScopes {
            root,
            blocks: vec![None; syntax.blocks.len()],
            inline_modules: vec![None; syntax.items.len()],
        };
        for block in 0..syntax.blocks.len() {
            self.ensure_scope(&syntax, file, &mut local, LocalScope::Block(block));
        }
        for (index, item) in syntax.items.iter().enumerate() {
            if matches!(item.kind, SyntaxItemKind::Module { body: Some(_), .. }) {
                self.ensure_scope(&syntax, file, &mut local, LocalScope::Module(index));
            }
        }

        let impl_base = self.impls.len();
        for (index, syntax_impl) in syntax.impls.iter().enumerate() {
            let scope = self.ensure_scope(&syntax, file, &mut local, syntax_impl.scope);
            self.impls.push(ImplData {
                file,
                local: index,
                scope,
                self_type: None,
                is_trait_impl: syntax_impl.is_trait_impl,
                items: Vec::new(),
            });
        }

        let item_base = self.items.len();
        for (index, item) in syntax.items.iter().enumerate() {
            let id = ItemId(self.items.len());
            let scope = self.ensure_scope(&syntax, file, &mut local, item.scope);
            let owner = self.scopes[scope.index()].module;
            let impl_owner = item.impl_index.map(|k| ImplId(impl_base + k));

            let syntax_fields = match &item.kind {
                SyntaxItemKind::Struct { fields, .. } | SyntaxItemKind::Union { fields } => {
                    fields.as_slice()
                }
                _ => &[],
            };
            let mut fields = Vec::with_capacity(syntax_fields.len());
            for (field_index, field) in syntax_fields.iter().enumerate() {
                fields.push(FieldId(self.fields.len()));
                self.fields.push(FieldData {
                    owner: id,
                    name: field.name.clone(),
                    index: field_index,
                    visibility: Visibility::Private,
                });
            }

            let child_module = local.inline_modules[index];
            self.items.push(ItemData {
                name: item.name.clone(),
                kind: ItemKind::from_syntax(&item.kind),
                visibility: Visibility::Private,
                module: owner,
                file,
                local: index,
                scope,
                impl_owner,
                fields,
                child_module,
            });

            match impl_owner {
                Some(owner_impl) => self.impls[owner_impl.index()].items.push(id),
                None => self.scopes[scope.index()].items.push(id),
            }
            if let Some(child) = child_module {
                self.modules[child.index()].decl = Some(id);
            }
            if let SyntaxItemKind::Module {
                body: None,
                path_attr,
            } = &item.kind
            {
                pending.push_back(PendingDeclaration {
                    item: id,
                    name: item.name.clone(),
                    parent: owner,
                    candidates: self.candidate_files(path, owner, &item.name, path_attr.as_deref()),
                });
            }
        }

        let use_base = self.uses.len();
        for (index, syntax_use) in syntax.uses.iter().enumerate() {
            let id = UseId(self.uses.len());
            let scope = self.ensure_scope(&syntax, file, &mut local, syntax_use.scope);
            self.uses.push(UseData {
                file,
                local: index,
                scope,
            });
            self.scopes[scope.index()].uses.push(id);
        }

        let ref_base = self.refs.len();
        for (index, syntax_path) in syntax.paths.iter().enumerate() {
            let scope = self.ensure_scope(&syntax, file, &mut local, syntax_path.scope);
            self.refs.push(RefData {
                file,
                local: index,
                module: self.scopes[scope.index()].module,
                scope,
                parent: syntax_path.parent.map(|p| RefId(ref_base + p)),
                target: None,
            });
        }

        let site_base = self.sites.len();
        for index in 0..syntax.sites.len() {
            self.sites.push(SiteData {
                file,
                local: index,
                target: None,
            });
        }

        let data = &mut self.files[file.index()];
        data.item_base = item_base;
        data.ref_base = ref_base;
        data.use_base = use_base;
        data.impl_base = impl_base;
        data.site_base = site_base;

        debug!("instantiated {} as module #{}", path.display(), module.index());
        Ok(module)
    }

    fn ensure_scope(
        &mut self,
        syntax: &FileSyntax,
        file: FileId,
        local: &mut LocalScopes,
        at: LocalScope,
    ) -> ScopeId {
        match at {
            LocalScope::Root => local.root,
            LocalScope::Block(block) => {
                if let Some(scope) = local.blocks[block] {
                    return scope;
                }
                let parent = self.ensure_scope(syntax, file, local, syntax.blocks[block].parent);
                let module = self.scopes[parent.index()].module;
                let scope = self.push_scope(
                    ScopeKind::Block,
                    Some(parent),
                    module,
                    file,
                    syntax.blocks[block].range,
                );
                local.blocks[block] = Some(scope);
                scope
            }
            LocalScope::Module(index) => {
                if let Some(module) = local.inline_modules[index] {
                    return self.modules[module.index()].scope;
                }
                let item = &syntax.items[index];
                let outer = self.ensure_scope(syntax, file, local, item.scope);
                let parent = self.scopes[outer.index()].module;
                let body = match &item.kind {
                    SyntaxItemKind::Module {
                        body: Some(body), ..
                    } => *body,
                    _ => item.range,
                };

                let module = ModuleId(self.modules.len());
                let scope = self.push_scope(ScopeKind::Module(module), None, module, file, body);
                let parent_data = &self.modules[parent.index()];
                let data = ModuleData {
                    name: item.name.clone(),
                    kind: ModuleKind::Inline,
                    parent: Some(parent),
                    crate_root: parent_data.crate_root,
                    file,
                    decl: None,
                    scope,
                    visibility: Visibility::Private,
                    dir: parent_data.dir.join(&item.name),
                };
                self.modules.push(data);
                local.inline_modules[index] = Some(module);
                scope
            }
        }
    }

    fn push_scope(
        &mut self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        module: ModuleId,
        file: FileId,
        range: TextRange,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeData {
            kind,
            parent,
            module,
            file,
            range,
            items: Vec::new(),
            uses: Vec::new(),
        });
        id
    }

    fn candidate_files(
        &self,
        declaring_file: &Path,
        owner: ModuleId,
        name: &str,
        path_attr: Option<&str>,
    ) -> Vec<PathBuf> {
        match path_attr {
            Some(path) => {
                let dir = declaring_file.parent().unwrap_or(Path::new(""));
                vec![normalize(&dir.join(path))]
            }
            None => {
                let dir = &self.modules[owner.index()].dir;
                vec![
                    normalize(&dir.join(format!("{name}.rs"))),
                    normalize(&dir.join(name).join("mod.rs")),
                ]
            }
        }
    }

    fn resolve_impls(&mut self) {
        let self_types: Vec<Option<ItemId>> = (0..self.impls.len())
            .map(|index| {
                let data = &self.impls[index];
                let file = &self.files[data.file.index()];
                let path = file.syntax.impls[data.local].self_path?;
                let segments = &file.syntax.paths[path].segments;
                match self.resolve_path(data.scope, segments, None, None)? {
                    Target::Item(item) if self.items[item.index()].kind.is_type() => Some(item),
                    _ => None,
                }
            })
            .collect();

        for (index, self_type) in self_types.into_iter().enumerate() {
            self.impls[index].self_type = self_type;
            if let Some(self_type) = self_type {
                if !self.impls[index].is_trait_impl {
                    self.inherent_impls
                        .entry(self_type)
                        .or_default()
                        .push(ImplId(index));
                }
            }
        }
    }

    fn resolve_references(&mut self) {
        let targets: Vec<Option<Target>> = (0..self.refs.len())
            .map(|index| self.resolve_reference(RefId(index)))
            .collect();
        for (data, target) in self.refs.iter_mut().zip(targets) {
            data.target = target;
        }
    }

    fn resolve_reference(&self, id: RefId) -> Option<Target> {
        let data = &self.refs[id.index()];
        let path = self.ref_syntax(id);
        let exclude = match &path.context {
            PathContext::Import { use_index, .. } => {
                Some(UseId(self.files[data.file.index()].use_base + use_index))
            }
            _ => None,
        };
        let self_type = if path.segments.first().map(String::as_str) == Some("Self") {
            self.impl_at(data.file, path.range)
                .and_then(|i| self.impls[i.index()].self_type)
        } else {
            None
        };
        // qualifiers, imports and visibility scopes name types or modules
        let namespace = match (&path.context, path.parent) {
            (PathContext::Plain, None) => Namespace::Value,
            _ => Namespace::Type,
        };
        self.resolve_path_in(data.scope, &path.segments, exclude, self_type, namespace)
    }

    fn resolve_visibilities(&mut self) {
        let item_visibilities: Vec<Visibility> = self
            .items
            .iter()
            .map(|item| {
                let syntax = &self.files[item.file.index()].syntax.items[item.local];
                match item.impl_owner {
                    Some(owner) if self.impls[owner.index()].is_trait_impl => Visibility::Public,
                    _ => self.resolve_visibility(item.file, item.module, &syntax.visibility),
                }
            })
            .collect();

        let field_visibilities: Vec<Visibility> = self
            .fields
            .iter()
            .map(|field| {
                let owner = &self.items[field.owner.index()];
                let syntax = &self.files[owner.file.index()].syntax.items[owner.local];
                match &syntax.kind {
                    SyntaxItemKind::Struct { fields, .. } | SyntaxItemKind::Union { fields } => {
                        self.resolve_visibility(owner.file, owner.module, &fields[field.index].visibility)
                    }
                    _ => Visibility::Private,
                }
            })
            .collect();

        for (item, visibility) in self.items.iter_mut().zip(item_visibilities) {
            item.visibility = visibility;
        }
        for (field, visibility) in self.fields.iter_mut().zip(field_visibilities) {
            field.visibility = visibility;
        }
        for index in 0..self.modules.len() {
            let visibility = match (self.modules[index].kind, self.modules[index].decl) {
                (ModuleKind::CrateRoot, _) | (_, None) => Visibility::Public,
                (_, Some(decl)) => self.items[decl.index()].visibility,
            };
            self.modules[index].visibility = visibility;
        }
    }

    fn resolve_visibility(
        &self,
        file: FileId,
        module: ModuleId,
        visibility: &SyntaxVisibility,
    ) -> Visibility {
        match visibility {
            SyntaxVisibility::Public => Visibility::Public,
            SyntaxVisibility::Private => Visibility::Private,
            SyntaxVisibility::Crate => {
                Visibility::Restricted(self.modules[module.index()].crate_root)
            }
            SyntaxVisibility::Restricted(path) => {
                let id = RefId(self.files[file.index()].ref_base + path);
                match self.refs[id.index()].target {
                    Some(Target::Module(scope)) => Visibility::Restricted(scope),
                    _ => {
                        debug!("unresolved visibility scope `{}`", self.ref_syntax(id).text);
                        Visibility::Public
                    }
                }
            }
        }
    }

    fn resolve_sites(&mut self) {
        let targets: Vec<Option<Target>> = (0..self.sites.len())
            .map(|index| self.resolve_site_uncached(SiteId(index)))
            .collect();
        for (site, target) in self.sites.iter_mut().zip(targets) {
            site.target = target;
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn cache(&self) -> &SharedParseCache {
        &self.cache
    }

    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.file_index.get(&normalize(path)).copied()
    }

    pub fn file(&self, id: FileId) -> &FileData {
        &self.files[id.index()]
    }

    pub fn module(&self, id: ModuleId) -> &ModuleData {
        &self.modules[id.index()]
    }

    pub fn item(&self, id: ItemId) -> &ItemData {
        &self.items[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &FieldData {
        &self.fields[id.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.index()]
    }

    pub fn use_data(&self, id: UseId) -> &UseData {
        &self.uses[id.index()]
    }

    pub fn reference(&self, id: RefId) -> &RefData {
        &self.refs[id.index()]
    }

    pub fn impl_data(&self, id: ImplId) -> &ImplData {
        &self.impls[id.index()]
    }

    pub fn site(&self, id: SiteId) -> &SiteData {
        &self.sites[id.index()]
    }

    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        (0..self.modules.len()).map(ModuleId)
    }

    pub fn ref_ids(&self) -> impl Iterator<Item = RefId> + '_ {
        (0..self.refs.len()).map(RefId)
    }

    pub fn site_ids(&self) -> impl Iterator<Item = SiteId> + '_ {
        (0..self.sites.len()).map(SiteId)
    }

    pub fn ref_syntax(&self, id: RefId) -> &SyntaxPath {
        let data = &self.refs[id.index()];
        &self.files[data.file.index()].syntax.paths[data.local]
    }

    pub fn item_syntax(&self, id: ItemId) -> &crate::parser::syntax::SyntaxItem {
        let data = &self.items[id.index()];
        &self.files[data.file.index()].syntax.items[data.local]
    }

    pub fn use_syntax(&self, id: UseId) -> &crate::parser::syntax::SyntaxUse {
        let data = &self.uses[id.index()];
        &self.files[data.file.index()].syntax.uses[data.local]
    }

    pub fn site_syntax(&self, id: SiteId) -> &crate::parser::syntax::FieldSite {
        let data = &self.sites[id.index()];
        &self.files[data.file.index()].syntax.sites[data.local]
    }

    /// The use declaration an import-context path belongs to
    pub fn use_of_ref(&self, id: RefId) -> Option<UseId> {
        match &self.ref_syntax(id).context {
            PathContext::Import { use_index, .. } => {
                let file = &self.files[self.refs[id.index()].file.index()];
                Some(UseId(file.use_base + use_index))
            }
            _ => None,
        }
    }

    /// Module whose body is the given file
    pub fn file_module(&self, id: FileId) -> ModuleId {
        self.files[id.index()].module
    }

    /// Every `mod name;` item pointing at the file
    pub fn declarations_of(&self, id: FileId) -> &[ItemId] {
        self.file_decls.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn refs_in_file(&self, id: FileId) -> impl Iterator<Item = RefId> + '_ {
        let file = &self.files[id.index()];
        (file.ref_base..file.ref_base + file.syntax.paths.len()).map(RefId)
    }

    pub fn sites_in_file(&self, id: FileId) -> impl Iterator<Item = SiteId> + '_ {
        let file = &self.files[id.index()];
        (file.site_base..file.site_base + file.syntax.sites.len()).map(SiteId)
    }

    /// Innermost `impl` block of `file` containing `range`
    pub fn impl_at(&self, file: FileId, range: TextRange) -> Option<ImplId> {
        let data = &self.files[file.index()];
        data.syntax
            .impls
            .iter()
            .enumerate()
            .filter(|(_, i)| i.range.contains_range(range))
            .min_by_key(|(_, i)| i.range.len())
            .map(|(index, _)| ImplId(data.impl_base + index))
    }

    /// Innermost scope of `file` containing `offset`
    pub fn scope_at(&self, file: FileId, offset: usize) -> ScopeId {
        let root = self.modules[self.files[file.index()].module.index()].scope;
        self.scopes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.file == file && s.range.contains(offset))
            .min_by_key(|(_, s)| s.range.len())
            .map(|(index, _)| ScopeId(index))
            .unwrap_or(root)
    }

    pub(super) fn ref_in_file(&self, file: FileId, local: usize) -> RefId {
        RefId(self.files[file.index()].ref_base + local)
    }

    /// `crate::a::b` for a module, `crate` for a crate root
    pub fn module_path(&self, module: ModuleId) -> String {
        let mut segments = vec!["crate".to_string()];
        segments.extend(self.crate_relative_segments(module));
        segments.join("::")
    }

    /// Names from below the crate root down to `module`
    pub fn crate_relative_segments(&self, module: ModuleId) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = module;
        while let Some(parent) = self.modules[current.index()].parent {
            segments.push(self.modules[current.index()].name.clone());
            current = parent;
        }
        segments.reverse();
        segments
    }

    /// Module at `path` (`crate`, `crate::a::b` or `a::b`) in the crate of `crate_root`
    pub fn module_by_path(&self, crate_root: ModuleId, path: &str) -> Option<ModuleId> {
        let mut current = self.modules[crate_root.index()].crate_root;
        for segment in path.split("::").map(str::trim).filter(|s| !s.is_empty()) {
            if segment == "crate" {
                continue;
            }
            current = self.child_module(current, segment)?;
        }
        Some(current)
    }

    /// Child module declared directly in `module`'s namespace
    pub fn child_module(&self, module: ModuleId, name: &str) -> Option<ModuleId> {
        let scope = self.modules[module.index()].scope;
        self.scopes[scope.index()]
            .items
            .iter()
            .map(|&item| &self.items[item.index()])
            .find(|item| item.kind == ItemKind::Module && item.name == name)
            .and_then(|item| item.child_module)
    }

    /// Items declared directly in `module`'s namespace
    pub fn module_items(&self, module: ModuleId) -> &[ItemId] {
        &self.scopes[self.modules[module.index()].scope.index()].items
    }

    pub fn crate_roots(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.module_ids()
            .filter(|&m| self.modules[m.index()].kind == ModuleKind::CrateRoot)
    }

    pub fn child_modules(&self, module: ModuleId) -> Vec<ModuleId> {
        self.module_ids()
            .filter(|&m| self.modules[m.index()].parent == Some(module))
            .collect()
    }

    /// Module a definition lives in
    pub fn target_module(&self, target: Target) -> ModuleId {
        match target {
            Target::Module(module) => module,
            Target::Item(item) | Target::Variant(item, _) => self.items[item.index()].module,
            Target::Field(field) => {
                self.items[self.fields[field.index()].owner.index()].module
            }
        }
    }

    /// Visibility of a definition and the module that visibility is relative to
    pub fn target_visibility(&self, target: Target) -> (Visibility, ModuleId) {
        match target {
            Target::Module(module) => {
                let data = &self.modules[module.index()];
                (data.visibility, data.parent.unwrap_or(module))
            }
            Target::Item(item) => {
                let data = &self.items[item.index()];
                (data.visibility, data.module)
            }
            Target::Variant(item, _) => (Visibility::Public, self.items[item.index()].module),
            Target::Field(field) => {
                let data = &self.fields[field.index()];
                (data.visibility, self.items[data.owner.index()].module)
            }
        }
    }

    /// Human-readable path of a definition
    pub fn target_path(&self, target: Target) -> String {
        match target {
            Target::Module(module) => self.module_path(module),
            Target::Item(item) => self.item_path(item),
            Target::Variant(item, index) => {
                let variant = match &self.item_syntax(item).kind {
                    SyntaxItemKind::Enum { variants } => variants.get(index).cloned(),
                    _ => None,
                };
                format!("{}::{}", self.item_path(item), variant.unwrap_or_default())
            }
            Target::Field(field) => {
                let data = &self.fields[field.index()];
                let name = data
                    .name
                    .clone()
                    .unwrap_or_else(|| data.index.to_string());
                format!("{}.{}", self.item_path(data.owner), name)
            }
        }
    }

    fn item_path(&self, item: ItemId) -> String {
        let data = &self.items[item.index()];
        let owner = data
            .impl_owner
            .and_then(|i| self.impls[i.index()].self_type)
            .map(|t| self.item_path(t))
            .unwrap_or_else(|| self.module_path(data.module));
        format!("{}::{}", owner, data.name)
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("files", &self.files.len())
            .field("modules", &self.modules.len())
            .field("items", &self.items.len())
            .field("refs", &self.refs.len())
            .finish()
    }
}

/// Directory in which a module's `mod child;` declarations look for files
fn owned_dir(path: &Path, kind: ModuleKind) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("")).to_path_buf();
    let owns_parent = kind == ModuleKind::CrateRoot
        || path.file_name().and_then(|n| n.to_str()) == Some("mod.rs");
    if owns_parent {
        return parent;
    }
    match path.file_stem() {
        Some(stem) => parent.join(stem),
        None => parent,
    }
}
