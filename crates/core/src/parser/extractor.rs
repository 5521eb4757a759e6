use super::syntax::{
    FieldKey, FieldSite, FieldSiteKind, FileSyntax, LocalScope, PathContext, Receiver,
    SyntaxBinding, SyntaxBlock, SyntaxField, SyntaxImpl, SyntaxItem, SyntaxItemKind, SyntaxPath,
    SyntaxUse, SyntaxVisibility, UseEntry, UseGroupElement,
};
use super::utils::{node_range, node_text};
use crate::{error::Result, types::TextRange};
use std::collections::{HashMap, HashSet};
use tree_sitter::{Node, Tree};

/// Node kinds that can form (part of) a path
const PATH_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "scoped_identifier",
    "scoped_type_identifier",
    "self",
    "super",
    "crate",
];

/// Kinds whose `name` child is a definition, not a reference
const DEFINITION_KINDS: &[&str] = &[
    "struct_item",
    "enum_item",
    "union_item",
    "function_item",
    "function_signature_item",
    "trait_item",
    "const_item",
    "static_item",
    "type_item",
    "mod_item",
    "enum_variant",
    "macro_definition",
    "associated_type",
    "type_parameter",
];

#[derive(Debug, Clone, Copy)]
struct WalkContext {
    scope: LocalScope,
    impl_index: Option<usize>,
    in_trait: bool,
}

/// Walks a tree-sitter tree and records everything the module-move analysis
/// needs from a single file.
pub struct SyntaxExtractor<'a> {
    source: &'a str,
    syntax: FileSyntax,
    node_paths: HashMap<usize, usize>,
    method_fields: HashSet<usize>,
}

impl<'a> SyntaxExtractor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            syntax: FileSyntax::default(),
            node_paths: HashMap::new(),
            method_fields: HashSet::new(),
        }
    }

    pub fn extract(mut self, tree: &Tree) -> Result<FileSyntax> {
        let root = tree.root_node();
        self.syntax.len = self.source.len();

        let ctx = WalkContext {
            scope: LocalScope::Root,
            impl_index: None,
            in_trait: false,
        };
        self.walk_children(&root, ctx);
        // Sites refer to paths by index, so they are collected once all paths exist
        self.collect_sites(&root);

        Ok(self.syntax)
    }

    fn walk(&mut self, node: &Node, ctx: WalkContext) {
        match node.kind() {
            "attribute_item" | "inner_attribute_item" | "token_tree" | "line_comment"
            | "block_comment" | "visibility_modifier" | "macro_invocation" => {}
            "macro_definition" => {
                self.record_item(node, SyntaxItemKind::Macro, ctx);
            }
            "use_declaration" => self.handle_use(node, ctx),
            "mod_item" => self.handle_module(node, ctx),
            "struct_item" | "union_item" => self.handle_struct(node, ctx),
            "enum_item" => self.handle_enum(node, ctx),
            "trait_item" => self.handle_trait(node, ctx),
            "impl_item" => self.handle_impl(node, ctx),
            "function_item" | "function_signature_item" => {
                self.handle_simple_item(node, SyntaxItemKind::Function, ctx)
            }
            "const_item" => self.handle_simple_item(node, SyntaxItemKind::Const, ctx),
            "static_item" => self.handle_simple_item(node, SyntaxItemKind::Static, ctx),
            "type_item" => self.handle_simple_item(node, SyntaxItemKind::TypeAlias, ctx),
            "block" => {
                let index = self.syntax.blocks.len();
                self.syntax.blocks.push(SyntaxBlock {
                    range: node_range(node),
                    parent: ctx.scope,
                });
                let inner = WalkContext {
                    scope: LocalScope::Block(index),
                    impl_index: None,
                    in_trait: false,
                };
                self.walk_children(node, inner);
            }
            "scoped_identifier" | "scoped_type_identifier" => {
                if self
                    .collect_path(node, None, &[], &PathContext::Plain, ctx.scope)
                    .is_none()
                {
                    self.walk_children(node, ctx);
                }
            }
            "type_identifier" => {
                self.collect_path(node, None, &[], &PathContext::Plain, ctx.scope);
            }
            _ => self.walk_children(node, ctx),
        }
    }

    fn walk_children(&mut self, node: &Node, ctx: WalkContext) {
        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return;
        }
        loop {
            let child = cursor.node();
            let field = cursor.field_name();
            let is_definition_name =
                field == Some("name") && DEFINITION_KINDS.contains(&node.kind());

            if !is_definition_name {
                if child.kind() == "identifier" && is_identifier_path(node.kind(), field) {
                    self.collect_path(&child, None, &[], &PathContext::Plain, ctx.scope);
                } else {
                    self.walk(&child, ctx);
                }
            }

            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    fn handle_module(&mut self, node: &Node, ctx: WalkContext) {
        let body = node.child_by_field_name("body");
        let kind = SyntaxItemKind::Module {
            body: body.as_ref().map(node_range),
            path_attr: self.path_attribute(node),
        };

        if let (Some(index), Some(body)) = (self.record_item(node, kind, ctx), body) {
            let inner = WalkContext {
                scope: LocalScope::Module(index),
                impl_index: None,
                in_trait: false,
            };
            self.walk_children(&body, inner);
        }
    }

    fn handle_struct(&mut self, node: &Node, ctx: WalkContext) {
        let mut fields = Vec::new();
        let mut tuple = false;

        if let Some(body) = node.child_by_field_name("body") {
            match body.kind() {
                "field_declaration_list" => {
                    let declarations: Vec<Node> = body
                        .named_children(&mut body.walk())
                        .filter(|n| n.kind() == "field_declaration")
                        .collect();
                    for declaration in declarations {
                        let name = declaration
                            .child_by_field_name("name")
                            .map(|n| node_text(&n, self.source).to_string());
                        let visibility = self.child_visibility(&declaration, ctx);
                        fields.push(SyntaxField { name, visibility });
                    }
                }
                "ordered_field_declaration_list" => {
                    tuple = true;
                    let mut pending = None;
                    let mut cursor = body.walk();
                    if cursor.goto_first_child() {
                        loop {
                            let child = cursor.node();
                            if child.kind() == "visibility_modifier" {
                                pending = Some(self.visibility(&child, ctx));
                            } else if cursor.field_name() == Some("type") {
                                fields.push(SyntaxField {
                                    name: None,
                                    visibility: pending.take().unwrap_or(SyntaxVisibility::Private),
                                });
                            }
                            if !cursor.goto_next_sibling() {
                                break;
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let kind = if node.kind() == "union_item" {
            SyntaxItemKind::Union { fields }
        } else {
            SyntaxItemKind::Struct { fields, tuple }
        };
        self.record_item(node, kind, ctx);
        self.walk_children(node, ctx);
    }

    fn handle_enum(&mut self, node: &Node, ctx: WalkContext) {
        let variants = node
            .child_by_field_name("body")
            .map(|body| {
                body.named_children(&mut body.walk())
                    .filter(|n| n.kind() == "enum_variant")
                    .filter_map(|n| n.child_by_field_name("name"))
                    .map(|n| node_text(&n, self.source).to_string())
                    .collect()
            })
            .unwrap_or_default();

        self.record_item(node, SyntaxItemKind::Enum { variants }, ctx);
        self.walk_children(node, ctx);
    }

    fn handle_trait(&mut self, node: &Node, ctx: WalkContext) {
        self.record_item(node, SyntaxItemKind::Trait, ctx);
        let inner = WalkContext {
            in_trait: true,
            ..ctx
        };
        self.walk_children(node, inner);
    }

    fn handle_simple_item(&mut self, node: &Node, kind: SyntaxItemKind, ctx: WalkContext) {
        self.record_item(node, kind, ctx);
        self.walk_children(node, ctx);
    }

    fn handle_impl(&mut self, node: &Node, ctx: WalkContext) {
        let mut body = None;
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if cursor.field_name() == Some("body") {
                    body = Some(child);
                } else {
                    self.walk(&child, ctx);
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        let self_path = node
            .child_by_field_name("type")
            .and_then(|t| self.type_path_index(&t));
        let index = self.syntax.impls.len();
        self.syntax.impls.push(SyntaxImpl {
            range: node_range(node),
            scope: ctx.scope,
            self_path,
            is_trait_impl: node.child_by_field_name("trait").is_some(),
        });

        if let Some(body) = body {
            let inner = WalkContext {
                impl_index: Some(index),
                in_trait: false,
                ..ctx
            };
            self.walk_children(&body, inner);
        }
    }

    fn record_item(
        &mut self,
        node: &Node,
        kind: SyntaxItemKind,
        ctx: WalkContext,
    ) -> Option<usize> {
        if ctx.in_trait {
            return None;
        }
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(&n, self.source).to_string())?;

        let visibility_node = find_child(node, "visibility_modifier");
        let visibility = match &visibility_node {
            Some(v) => self.visibility(v, ctx),
            None => SyntaxVisibility::Private,
        };

        let index = self.syntax.items.len();
        self.syntax.items.push(SyntaxItem {
            name,
            kind,
            visibility,
            visibility_range: visibility_node.as_ref().map(node_range),
            range: node_range(node),
            full_range: TextRange::new(self.extended_start(node), node.end_byte()),
            scope: ctx.scope,
            impl_index: ctx.impl_index,
        });
        Some(index)
    }

    fn child_visibility(&mut self, node: &Node, ctx: WalkContext) -> SyntaxVisibility {
        match find_child(node, "visibility_modifier") {
            Some(v) => self.visibility(&v, ctx),
            None => SyntaxVisibility::Private,
        }
    }

    fn visibility(&mut self, node: &Node, ctx: WalkContext) -> SyntaxVisibility {
        let compact: String = node_text(node, self.source)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        match compact.as_str() {
            "pub" => return SyntaxVisibility::Public,
            "crate" | "pub(crate)" => return SyntaxVisibility::Crate,
            "pub(self)" => return SyntaxVisibility::Private,
            _ => {}
        }

        let scope_path = if compact.starts_with("pub(in") {
            node.named_children(&mut node.walk())
                .filter(|n| PATH_KINDS.contains(&n.kind()))
                .last()
        } else if compact == "pub(super)" {
            find_child(node, "super")
        } else {
            None
        };

        let context = PathContext::Visibility {
            modifier: node_range(node),
        };
        scope_path
            .and_then(|p| self.collect_path(&p, None, &[], &context, ctx.scope))
            .map(SyntaxVisibility::Restricted)
            .unwrap_or(SyntaxVisibility::Public)
    }

    /// Start of the leading attributes and doc comments attached to `node`
    fn extended_start(&self, node: &Node) -> usize {
        let mut start = node.start_byte();
        let mut sibling = node.prev_sibling();
        while let Some(s) = sibling {
            let attached = match s.kind() {
                "attribute_item" => true,
                "line_comment" | "block_comment" => {
                    let text = node_text(&s, self.source);
                    text.starts_with("///") || text.starts_with("/**")
                }
                _ => false,
            };
            if !attached {
                break;
            }
            start = s.start_byte();
            sibling = s.prev_sibling();
        }
        start
    }

    fn path_attribute(&self, node: &Node) -> Option<String> {
        let mut sibling = node.prev_sibling();
        while let Some(s) = sibling {
            match s.kind() {
                "attribute_item" => {
                    let text = node_text(&s, self.source);
                    let inner = text.trim_start_matches("#[").trim_end_matches(']').trim();
                    if let Some(value) = inner.strip_prefix("path") {
                        let value = value.trim_start();
                        if let Some(value) = value.strip_prefix('=') {
                            return Some(value.trim().trim_matches('"').to_string());
                        }
                    }
                }
                "line_comment" | "block_comment" => {}
                _ => break,
            }
            sibling = s.prev_sibling();
        }
        None
    }

    fn collect_path(
        &mut self,
        node: &Node,
        parent: Option<usize>,
        prefix: &[String],
        context: &PathContext,
        scope: LocalScope,
    ) -> Option<usize> {
        let mut segments = prefix.to_vec();
        segments.extend(self.path_segments(node)?);

        let index = self.syntax.paths.len();
        self.syntax.paths.push(SyntaxPath {
            range: node_range(node),
            text: node_text(node, self.source).to_string(),
            segments,
            parent,
            context: context.clone(),
            scope,
        });
        self.node_paths.insert(node.id(), index);

        if matches!(node.kind(), "scoped_identifier" | "scoped_type_identifier") {
            if let Some(qualifier) = node.child_by_field_name("path") {
                if PATH_KINDS.contains(&qualifier.kind()) {
                    self.collect_path(&qualifier, Some(index), prefix, context, scope);
                }
            }
        }

        Some(index)
    }

    fn path_segments(&self, node: &Node) -> Option<Vec<String>> {
        match node.kind() {
            "identifier" | "type_identifier" => Some(vec![node_text(node, self.source).to_string()]),
            "self" | "super" | "crate" => Some(vec![node.kind().to_string()]),
            "scoped_identifier" | "scoped_type_identifier" => {
                // A leading `::` has no qualifier and names an external crate
                let qualifier = node.child_by_field_name("path")?;
                let mut segments = self.path_segments(&qualifier)?;
                let name = node.child_by_field_name("name")?;
                segments.push(node_text(&name, self.source).to_string());
                Some(segments)
            }
            _ => None,
        }
    }

    fn handle_use(&mut self, node: &Node, ctx: WalkContext) {
        let visibility = match find_child(node, "visibility_modifier") {
            Some(v) => {
                self.visibility(&v, ctx);
                format!("{} ", node_text(&v, self.source))
            }
            None => String::new(),
        };

        let use_index = self.syntax.uses.len();
        self.syntax.uses.push(SyntaxUse {
            range: node_range(node),
            scope: ctx.scope,
            visibility,
            entries: Vec::new(),
        });

        if let Some(argument) = node.child_by_field_name("argument") {
            self.use_clause(&argument, &[], use_index, None, true, ctx.scope);
        }
    }

    fn use_clause(
        &mut self,
        node: &Node,
        prefix: &[String],
        use_index: usize,
        group: Option<UseGroupElement>,
        top_level: bool,
        scope: LocalScope,
    ) {
        let context = PathContext::Import { use_index, group };

        match node.kind() {
            "use_as_clause" => {
                let alias = node
                    .child_by_field_name("alias")
                    .map(|n| node_text(&n, self.source).to_string());
                if let Some(path) = node.child_by_field_name("path") {
                    if let Some(segments) = self.use_path(&path, prefix, &context, scope) {
                        self.push_use_entry(use_index, segments, alias, false);
                    }
                }
            }
            "use_wildcard" => {
                let path = node
                    .named_children(&mut node.walk())
                    .find(|n| PATH_KINDS.contains(&n.kind()));
                let segments = match path {
                    Some(path) => self.use_path(&path, prefix, &context, scope),
                    None => Some(prefix.to_vec()),
                };
                if let Some(segments) = segments {
                    self.push_use_entry(use_index, segments, None, true);
                }
            }
            "scoped_use_list" => {
                let mut next_prefix = prefix.to_vec();
                if let Some(path) = node.child_by_field_name("path") {
                    match self.use_path(&path, prefix, &context, scope) {
                        Some(segments) => next_prefix = segments,
                        None => return,
                    }
                }
                if let Some(list) = node.child_by_field_name("list") {
                    self.use_list(&list, &next_prefix, use_index, top_level, scope);
                }
            }
            "use_list" => self.use_list(node, prefix, use_index, top_level, scope),
            kind if PATH_KINDS.contains(&kind) => {
                if let Some(segments) = self.use_path(node, prefix, &context, scope) {
                    self.push_use_entry(use_index, segments, None, false);
                }
            }
            _ => {}
        }
    }

    /// Segments of a path inside a use tree. `self` inside a group names the
    /// group's prefix and is not recorded as a path of its own.
    fn use_path(
        &mut self,
        path: &Node,
        prefix: &[String],
        context: &PathContext,
        scope: LocalScope,
    ) -> Option<Vec<String>> {
        if path.kind() == "self" && !prefix.is_empty() {
            return Some(prefix.to_vec());
        }
        let index = self.collect_path(path, None, prefix, context, scope)?;
        Some(self.syntax.paths[index].segments.clone())
    }

    fn use_list(
        &mut self,
        list: &Node,
        prefix: &[String],
        use_index: usize,
        top_level: bool,
        scope: LocalScope,
    ) {
        let elements: Vec<Node> = list
            .named_children(&mut list.walk())
            .filter(|n| !matches!(n.kind(), "line_comment" | "block_comment"))
            .collect();
        let count = elements.len();

        for (i, element) in elements.iter().enumerate() {
            let removal = if i + 1 < count {
                TextRange::new(element.start_byte(), elements[i + 1].start_byte())
            } else if i > 0 {
                TextRange::new(elements[i - 1].end_byte(), element.end_byte())
            } else {
                node_range(element)
            };
            let group = UseGroupElement {
                element: node_range(element),
                removal,
                sole: count == 1,
                top_level,
            };
            self.use_clause(element, prefix, use_index, Some(group), false, scope);
        }
    }

    fn push_use_entry(
        &mut self,
        use_index: usize,
        segments: Vec<String>,
        alias: Option<String>,
        glob: bool,
    ) {
        self.syntax.uses[use_index].entries.push(UseEntry {
            segments,
            alias,
            glob,
        });
    }

    fn collect_sites(&mut self, node: &Node) {
        match node.kind() {
            "attribute_item" | "inner_attribute_item" | "token_tree" | "macro_invocation" => {
                return;
            }
            "call_expression" => self.method_call_site(node),
            "field_expression" if !self.method_fields.contains(&node.id()) => {
                if let (Some(value), Some(field)) = (
                    node.child_by_field_name("value"),
                    node.child_by_field_name("field"),
                ) {
                    let site = FieldSiteKind::FieldAccess {
                        receiver: self.receiver(&value),
                        field: self.field_key(&field),
                    };
                    self.push_site(node, site);
                }
            }
            "struct_expression" => self.struct_literal_sites(node),
            "struct_pattern" => {
                if let Some(path) = node
                    .child_by_field_name("type")
                    .and_then(|t| self.type_path_index(&t))
                {
                    let patterns: Vec<Node> = node
                        .named_children(&mut node.walk())
                        .filter(|n| n.kind() == "field_pattern")
                        .collect();
                    for pattern in patterns {
                        if let Some(name) = pattern.child_by_field_name("name") {
                            let field = FieldKey::Named(node_text(&name, self.source).to_string());
                            self.push_site(&pattern, FieldSiteKind::StructPatternField { path, field });
                        }
                    }
                }
            }
            "tuple_struct_pattern" => {
                if let Some(path) = node
                    .child_by_field_name("type")
                    .and_then(|t| self.type_path_index(&t))
                {
                    self.push_site(node, FieldSiteKind::TupleStructPattern { path });
                }
            }
            "let_declaration" => self.let_binding(node),
            "parameter" => self.parameter_binding(node),
            _ => {}
        }

        for child in node.children(&mut node.walk()) {
            self.collect_sites(&child);
        }
    }

    fn method_call_site(&mut self, node: &Node) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        if function.kind() != "field_expression" {
            return;
        }
        if let (Some(value), Some(field)) = (
            function.child_by_field_name("value"),
            function.child_by_field_name("field"),
        ) {
            self.method_fields.insert(function.id());
            let site = FieldSiteKind::MethodCall {
                receiver: self.receiver(&value),
                name: node_text(&field, self.source).to_string(),
            };
            self.push_site(&function, site);
        }
    }

    fn struct_literal_sites(&mut self, node: &Node) {
        let Some(path) = node
            .child_by_field_name("name")
            .and_then(|n| self.type_path_index(&n))
        else {
            return;
        };
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        let initializers: Vec<Node> = body.named_children(&mut body.walk()).collect();
        for initializer in initializers {
            let field = match initializer.kind() {
                "shorthand_field_initializer" => find_child(&initializer, "identifier")
                    .map(|n| FieldKey::Named(node_text(&n, self.source).to_string())),
                "field_initializer" => initializer
                    .child_by_field_name("field")
                    .map(|n| self.field_key(&n)),
                _ => None,
            };
            if let Some(field) = field {
                self.push_site(&initializer, FieldSiteKind::StructLiteralField { path, field });
            }
        }
    }

    fn let_binding(&mut self, node: &Node) {
        let Some(pattern) = node.child_by_field_name("pattern") else {
            return;
        };
        if pattern.kind() != "identifier" {
            return;
        }
        let type_path = node
            .child_by_field_name("type")
            .and_then(|t| self.type_path_index(&t))
            .or_else(|| {
                node.child_by_field_name("value")
                    .and_then(|v| self.value_type_path(&v))
            });

        if let Some(type_path) = type_path {
            let end = node
                .parent()
                .map(|p| p.end_byte())
                .unwrap_or(self.source.len());
            self.syntax.bindings.push(SyntaxBinding {
                name: node_text(&pattern, self.source).to_string(),
                type_path,
                visible: TextRange::new(node.end_byte(), end),
            });
        }
    }

    fn parameter_binding(&mut self, node: &Node) {
        let (Some(pattern), Some(ty)) = (
            node.child_by_field_name("pattern"),
            node.child_by_field_name("type"),
        ) else {
            return;
        };
        if pattern.kind() != "identifier" {
            return;
        }
        let Some(type_path) = self.type_path_index(&ty) else {
            return;
        };
        // parameter -> parameters -> function
        let visible = node
            .parent()
            .and_then(|p| p.parent())
            .map(|f| node_range(&f))
            .unwrap_or_else(|| node_range(node));
        self.syntax.bindings.push(SyntaxBinding {
            name: node_text(&pattern, self.source).to_string(),
            type_path,
            visible,
        });
    }

    /// Type of `Foo { .. }`, `Foo::new(..)` or `Foo::default()`
    fn value_type_path(&self, value: &Node) -> Option<usize> {
        match value.kind() {
            "struct_expression" => value
                .child_by_field_name("name")
                .and_then(|n| self.type_path_index(&n)),
            "call_expression" => {
                let function = value.child_by_field_name("function")?;
                if function.kind() != "scoped_identifier" {
                    return None;
                }
                let name = function.child_by_field_name("name")?;
                match node_text(&name, self.source) {
                    "new" | "default" => function
                        .child_by_field_name("path")
                        .and_then(|p| self.type_path_index(&p)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn type_path_index(&self, node: &Node) -> Option<usize> {
        match node.kind() {
            "reference_type" | "generic_type" => node
                .child_by_field_name("type")
                .and_then(|t| self.type_path_index(&t)),
            _ => self.node_paths.get(&node.id()).copied(),
        }
    }

    fn receiver(&self, value: &Node) -> Receiver {
        match value.kind() {
            "self" => Receiver::SelfValue,
            "identifier" => Receiver::Binding(node_text(value, self.source).to_string()),
            _ => Receiver::Unknown,
        }
    }

    fn field_key(&self, node: &Node) -> FieldKey {
        let text = node_text(node, self.source);
        match (node.kind(), text.parse::<usize>()) {
            ("integer_literal", Ok(index)) => FieldKey::Index(index),
            _ => FieldKey::Named(text.to_string()),
        }
    }

    fn push_site(&mut self, node: &Node, kind: FieldSiteKind) {
        self.syntax.sites.push(FieldSite {
            range: node_range(node),
            kind,
        });
    }
}

/// Identifier children that name an item rather than a local
fn is_identifier_path(parent_kind: &str, field: Option<&str>) -> bool {
    matches!(
        (parent_kind, field),
        ("call_expression", Some("function"))
            | ("tuple_struct_pattern", Some("type"))
            | ("generic_function", Some("function"))
    )
}

fn find_child<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    node.children(&mut node.walk()).find(|n| n.kind() == kind)
}
