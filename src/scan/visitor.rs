// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Per-file syntax walk.
//!
//! Runs on rayon workers. Everything leaving this module is an owned
//! snapshot; no `syn` value crosses a thread boundary.

use std::collections::{BTreeMap, BTreeSet};

use syn::{
    Attribute, Fields, ImplItem, Item, ItemImpl, ItemStruct, Token, Type, UseTree, Visibility,
    ext::IdentExt, punctuated::Punctuated
};

use super::{
    CandidateElement, Slot,
    declarations::{DeclaredField, DeclaredMethod, DeclaredType, ModuleScope, absolutize},
    docs
};
use crate::{
    diagnostics::{DeclKind, DeclRef, Diagnostic, DiagnosticCode, DiagnosticSink, Location},
    naming::QualifiedName,
    round::SourceFile,
    schema::{AttrValue, MetadataSchema, parse_arguments, path_text}
};

/// Crate names accepted as a directive path prefix.
const DIRECTIVE_CRATES: &[&str] = &["entity_forge", "entity_forge_core"];

/// Directive on a method whose owner is only known after all files are
/// scanned.
#[derive(Debug, Clone)]
pub(super) struct PendingDirective {
    pub directive: String,
    pub arguments: BTreeMap<String, AttrValue>,
    pub location:  Location
}

/// Impl block snapshot.
#[derive(Debug, Clone)]
pub(super) struct ImplScan {
    pub module:       String,
    pub target:       String,
    pub default_impl: bool,
    pub methods:      Vec<(DeclaredMethod, Vec<PendingDirective>)>
}

/// Everything one file contributes.
#[derive(Debug, Default)]
pub(super) struct FileScan {
    pub types:      Vec<DeclaredType>,
    pub scopes:     Vec<(String, ModuleScope)>,
    pub candidates: Vec<CandidateElement>,
    pub impls:      Vec<ImplScan>
}

/// Scan one source file.
pub(super) fn scan_file(file: &SourceFile, schema: &MetadataSchema, sink: &DiagnosticSink) -> FileScan {
    let parsed = match syn::parse_file(&file.text) {
        Ok(parsed) => parsed,
        Err(err) => {
            let decl = DeclRef::ty(QualifiedName::new(file.module.clone()), DeclKind::File);
            sink.report(Diagnostic::error(
                DiagnosticCode::Parse,
                Location::at_span(decl, &file.path, err.span()),
                err.to_string()
            ));
            return FileScan::default();
        }
    };

    let mut visitor = FileVisitor {
        file,
        schema,
        sink,
        out: FileScan::default()
    };
    visitor.items(&file.module, &parsed.items);
    visitor.out
}

struct FileVisitor<'a> {
    file:   &'a SourceFile,
    schema: &'a MetadataSchema,
    sink:   &'a DiagnosticSink,
    out:    FileScan
}

impl FileVisitor<'_> {
    fn items(&mut self, module: &str, items: &[Item]) {
        let mut scope = ModuleScope::default();

        for item in items {
            match item {
                Item::Struct(s) => self.structure(module, s),
                Item::Enum(e) => {
                    let owner = self.opaque_type(module, &e.ident, DeclKind::Enum, &e.attrs, &e.vis);
                    for variant in &e.variants {
                        self.reject_all(&owner, &variant.ident.to_string(), &variant.attrs, "enum variants");
                        for (i, field) in variant.fields.iter().enumerate() {
                            let name = field.ident.as_ref().map_or_else(|| i.to_string(), ToString::to_string);
                            self.reject_all(&owner, &name, &field.attrs, "fields of enum variants");
                        }
                    }
                }
                Item::Union(u) => {
                    let owner = self.opaque_type(module, &u.ident, DeclKind::Union, &u.attrs, &u.vis);
                    for field in &u.fields.named {
                        if let Some(ident) = &field.ident {
                            self.reject_all(&owner, &ident.to_string(), &field.attrs, "union fields");
                        }
                    }
                }
                Item::Type(t) => {
                    self.opaque_type(module, &t.ident, DeclKind::Alias, &t.attrs, &t.vis);
                }
                Item::Impl(block) => self.implementation(module, block),
                Item::Mod(m) => {
                    let owner = QualifiedName::join(module, &m.ident.to_string());
                    self.reject_all(&owner, &m.ident.to_string(), &m.attrs, "modules");
                    if let Some((_, nested)) = &m.content {
                        self.items(owner.as_str(), nested);
                    }
                }
                Item::Use(u) => collect_use(module, &u.tree, &mut Vec::new(), &mut scope),
                Item::Fn(f) => {
                    let owner = QualifiedName::join(module, &f.sig.ident.to_string());
                    self.reject_all(&owner, &f.sig.ident.to_string(), &f.attrs, "free functions");
                }
                _ => {}
            }
        }

        if scope != ModuleScope::default() {
            self.out.scopes.push((module.to_owned(), scope));
        }
    }

    fn structure(&mut self, module: &str, item: &ItemStruct) {
        let name = QualifiedName::join(module, &item.ident.to_string());
        let kind = match &item.fields {
            Fields::Named(_) => DeclKind::Struct,
            Fields::Unnamed(_) => DeclKind::TupleStruct,
            Fields::Unit => DeclKind::UnitStruct
        };
        let location = self.location(DeclRef::ty(name.clone(), kind), item.ident.span());

        for (attr, directive) in self.directives(&item.attrs) {
            let at = self.location(location.decl.clone(), attr.pound_token.span);
            self.candidate(Slot::Type, &directive, attr, at, kind);
        }

        let mut fields = Vec::new();
        for (index, field) in item.fields.iter().enumerate() {
            let Some(ident) = &field.ident else {
                let member = index.to_string();
                self.reject_all(&name, &member, &field.attrs, "tuple struct fields");
                continue;
            };
            let field_name = ident.unraw().to_string();
            let decl = DeclRef::member(name.clone(), field_name.clone(), DeclKind::Field);
            let field_location = self.location(decl.clone(), ident.span());

            for (attr, directive) in self.directives(&field.attrs) {
                let at = self.location(decl.clone(), attr.pound_token.span);
                self.candidate(Slot::Field(index), &directive, attr, at, DeclKind::Field);
            }

            let ty = &field.ty;
            fields.push(DeclaredField {
                name:     field_name,
                ty:       quote::quote!(#ty).to_string(),
                visible:  is_visible(&field.vis),
                doc:      docs::summary(&field.attrs),
                location: field_location
            });
        }

        let derives = derives(&item.attrs);
        self.out.types.push(DeclaredType {
            name,
            kind,
            visible: is_visible(&item.vis),
            generic: !item.generics.params.is_empty(),
            fields,
            methods: Vec::new(),
            implements_default: derives.contains("Default"),
            derives,
            doc: docs::summary(&item.attrs),
            location
        });
    }

    /// Types that never become entities: directives on them are misuse.
    fn opaque_type(
        &mut self,
        module: &str,
        ident: &syn::Ident,
        kind: DeclKind,
        attrs: &[Attribute],
        vis: &Visibility
    ) -> QualifiedName {
        let name = QualifiedName::join(module, &ident.to_string());
        let location = self.location(DeclRef::ty(name.clone(), kind), ident.span());

        for (attr, directive) in self.directives(attrs) {
            let at = self.location(location.decl.clone(), attr.pound_token.span);
            self.candidate(Slot::Type, &directive, attr, at, kind);
        }

        self.out.types.push(DeclaredType {
            name: name.clone(),
            kind,
            visible: is_visible(vis),
            generic: false,
            fields: Vec::new(),
            methods: Vec::new(),
            derives: derives(attrs),
            implements_default: false,
            doc: docs::summary(attrs),
            location
        });
        name
    }

    fn implementation(&mut self, module: &str, block: &ItemImpl) {
        let Type::Path(self_ty) = &*block.self_ty else {
            return;
        };
        let target = path_text(&self_ty.path);
        let provisional = QualifiedName::join(module, &target);

        if let Some((_, trait_path, _)) = &block.trait_ {
            for item in &block.items {
                if let ImplItem::Fn(f) = item {
                    let name = f.sig.ident.unraw().to_string();
                    self.reject_all(&provisional, &name, &f.attrs, "trait impl methods");
                }
            }
            let is_default = trait_path.segments.last().is_some_and(|s| s.ident == "Default");
            if is_default {
                self.out.impls.push(ImplScan {
                    module: module.to_owned(),
                    target,
                    default_impl: true,
                    methods: Vec::new()
                });
            }
            return;
        }

        let mut methods = Vec::new();
        for item in &block.items {
            let ImplItem::Fn(f) = item else {
                continue;
            };
            let name = f.sig.ident.unraw().to_string();
            let decl = DeclRef::member(provisional.clone(), name.clone(), DeclKind::Method);
            let receiver = f.sig.receiver();

            let method = DeclaredMethod {
                name,
                returns: match &f.sig.output {
                    syn::ReturnType::Default => None,
                    syn::ReturnType::Type(_, ty) => Some(quote::quote!(#ty).to_string())
                },
                by_ref_self: receiver.is_some_and(|r| r.reference.is_some() && r.mutability.is_none()),
                arguments: f.sig.inputs.len() - usize::from(receiver.is_some()),
                visible: is_visible(&f.vis),
                location: self.location(decl.clone(), f.sig.ident.span())
            };

            let mut pending = Vec::new();
            for (attr, directive) in self.directives(&f.attrs) {
                let at = self.location(decl.clone(), attr.pound_token.span);
                if let Some(arguments) = self.arguments(&directive, attr, &at, DeclKind::Method) {
                    pending.push(PendingDirective {
                        directive,
                        arguments,
                        location: at
                    });
                }
            }
            methods.push((method, pending));
        }

        self.out.impls.push(ImplScan {
            module: module.to_owned(),
            target,
            default_impl: false,
            methods
        });
    }

    /// Recognized directives among `attrs`.
    fn directives<'b>(&self, attrs: &'b [Attribute]) -> Vec<(&'b Attribute, String)> {
        attrs
            .iter()
            .filter_map(|attr| {
                let segments = &attr.path().segments;
                let prefixed = segments.len() == 2
                    && DIRECTIVE_CRATES.iter().any(|c| segments[0].ident == c);
                if segments.len() != 1 && !prefixed {
                    return None;
                }
                let name = segments.last()?.ident.to_string();
                self.schema.directive(&name).map(|_| (attr, name))
            })
            .collect()
    }

    fn candidate(&mut self, slot: Slot, directive: &str, attr: &Attribute, location: Location, kind: DeclKind) {
        if let Some(arguments) = self.arguments(directive, attr, &location, kind) {
            self.out.candidates.push(CandidateElement {
                slot,
                directive: directive.to_owned(),
                arguments,
                location
            });
        }
    }

    /// Target check plus argument parsing. Problems go to the sink.
    fn arguments(
        &self,
        directive: &str,
        attr: &Attribute,
        location: &Location,
        kind: DeclKind
    ) -> Option<BTreeMap<String, AttrValue>> {
        let spec = self.schema.directive(directive)?;
        if !spec.accepts(kind) {
            self.sink.report(Diagnostic::error(
                DiagnosticCode::SchemaMisuse,
                location.clone(),
                format!(
                    "`#[{}]` is not valid on a {}; it applies to {}",
                    directive,
                    kind.describe(),
                    spec.describe_targets()
                )
            ));
            return None;
        }

        match parse_arguments(attr) {
            Ok(arguments) => Some(arguments),
            Err(err) => {
                for problem in err {
                    self.sink.report(Diagnostic::error(
                        DiagnosticCode::InvalidAttribute,
                        location.clone(),
                        format!("`#[{directive}]`: {problem}")
                    ));
                }
                None
            }
        }
    }

    fn reject_all(&self, owner: &QualifiedName, member: &str, attrs: &[Attribute], what: &str) {
        for (attr, directive) in self.directives(attrs) {
            let decl = DeclRef::member(owner.clone(), member, DeclKind::Field);
            self.sink.report(Diagnostic::error(
                DiagnosticCode::SchemaMisuse,
                self.location(decl, attr.pound_token.span),
                format!("`#[{directive}]` is not recognized on {what}")
            ));
        }
    }

    fn location(&self, decl: DeclRef, span: proc_macro2::Span) -> Location {
        Location::at_span(decl, &self.file.path, span)
    }
}

fn is_visible(vis: &Visibility) -> bool {
    !matches!(vis, Visibility::Inherited)
}

/// Trait names in `#[derive(...)]`.
fn derives(attrs: &[Attribute]) -> BTreeSet<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .filter_map(|attr| {
            attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .filter_map(|path| path.segments.last().map(|s| s.ident.to_string()))
        .collect()
}

fn collect_use(module: &str, tree: &UseTree, prefix: &mut Vec<String>, scope: &mut ModuleScope) {
    let full = |prefix: &[String], last: &str| {
        let mut parts = prefix.to_vec();
        parts.push(last.to_owned());
        absolutize(module, &parts.join("::"))
    };

    match tree {
        UseTree::Path(p) => {
            prefix.push(p.ident.to_string());
            collect_use(module, &p.tree, prefix, scope);
            prefix.pop();
        }
        UseTree::Name(n) if n.ident == "self" => {
            if let (Some(alias), Some(path)) = (prefix.last(), absolutize(module, &prefix.join("::"))) {
                scope.imports.insert(alias.clone(), path);
            }
        }
        UseTree::Name(n) => {
            if let Some(path) = full(prefix, &n.ident.to_string()) {
                scope.imports.insert(n.ident.to_string(), path);
            }
        }
        UseTree::Rename(r) => {
            if let Some(path) = full(prefix, &r.ident.to_string()) {
                scope.imports.insert(r.rename.to_string(), path);
            }
        }
        UseTree::Glob(_) => {
            if let Some(path) = absolutize(module, &prefix.join("::")) {
                scope.globs.insert(path);
            }
        }
        UseTree::Group(g) => {
            for tree in &g.items {
                collect_use(module, tree, prefix, scope);
            }
        }
    }
}
