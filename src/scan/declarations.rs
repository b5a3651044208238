// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Declaration index of a round.
//!
//! Scanning produces owned snapshots of every type declared in the round,
//! whether annotated or not. Relation targets and metamodels are looked up
//! here, and type paths written in source are resolved with the same
//! precedence rustc uses for the common cases:
//!
//! ```text
//! 1. crate::a::B / self::B / super::B    absolute or module relative
//! 2. B          explicit `use` import    use crate::model::B;
//! 3. B          declared in the module   struct B
//! 4. B          glob import              use crate::model::*;
//! 5. a::B       through an imported `a`, the module, or the crate root
//! ```
//!
//! Generated code lives in another module than the declarations it talks
//! about, so [`DeclarationIndex::qualify_type`] rewrites every path of a
//! written type into one that resolves from anywhere in the crate.

use std::collections::{BTreeMap, BTreeSet};

use syn::{
    Type, TypePath,
    visit_mut::{self, VisitMut}
};

use crate::{
    diagnostics::{DeclKind, Location},
    naming::QualifiedName
};

/// Named field of a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredField {
    /// Field name.
    pub name:     String,
    /// Type as written, in token form.
    pub ty:       String,
    /// Declared with any `pub` visibility.
    pub visible:  bool,
    /// First doc comment line.
    pub doc:      Option<String>,
    /// Location of the field name.
    pub location: Location
}

/// Method of an inherent `impl` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredMethod {
    /// Method name.
    pub name:        String,
    /// Return type in token form, `None` for `()`.
    pub returns:     Option<String>,
    /// Takes `&self`.
    pub by_ref_self: bool,
    /// Number of parameters besides the receiver.
    pub arguments:   usize,
    /// Declared with any `pub` visibility.
    pub visible:     bool,
    /// Location of the method name.
    pub location:    Location
}

/// Type declared somewhere in the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    /// Fully qualified name.
    pub name:               QualifiedName,
    /// Declaration kind.
    pub kind:               DeclKind,
    /// Declared with any `pub` visibility.
    pub visible:            bool,
    /// Declared with type, lifetime or const parameters.
    pub generic:            bool,
    /// Named fields in source order.
    pub fields:             Vec<DeclaredField>,
    /// Inherent methods, in the order their impl blocks were scanned.
    pub methods:            Vec<DeclaredMethod>,
    /// Names of derived traits.
    pub derives:            BTreeSet<String>,
    /// `Default` derived or implemented.
    pub implements_default: bool,
    /// First doc comment line.
    pub doc:                Option<String>,
    /// Location of the type name.
    pub location:           Location
}

impl DeclaredType {
    /// Field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&DeclaredField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&DeclaredMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// `use` declarations of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleScope {
    /// Alias to absolute path.
    pub imports: BTreeMap<String, String>,
    /// Modules imported with `*`.
    pub globs:   BTreeSet<String>
}

/// Every type of the round plus module scopes.
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    types:  BTreeMap<QualifiedName, DeclaredType>,
    scopes: BTreeMap<String, ModuleScope>
}

impl DeclarationIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a type. Returns the rejected declaration when the name is
    /// already taken.
    pub fn insert(&mut self, declared: DeclaredType) -> Result<(), DeclaredType> {
        if self.types.contains_key(&declared.name) {
            return Err(declared);
        }
        self.types.insert(declared.name.clone(), declared);
        Ok(())
    }

    /// Merge a module scope.
    pub fn add_scope(&mut self, module: &str, scope: ModuleScope) {
        let entry = self.scopes.entry(module.to_owned()).or_default();
        entry.imports.extend(scope.imports);
        entry.globs.extend(scope.globs);
    }

    /// Declared type by name.
    #[must_use]
    pub fn get(&self, name: &QualifiedName) -> Option<&DeclaredType> {
        self.types.get(name)
    }

    /// Mutable declared type.
    pub fn get_mut(&mut self, name: &QualifiedName) -> Option<&mut DeclaredType> {
        self.types.get_mut(name)
    }

    /// Check whether a type is declared.
    #[must_use]
    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.types.contains_key(name)
    }

    /// All types sorted by name.
    pub fn types(&self) -> impl Iterator<Item = &DeclaredType> {
        self.types.values()
    }

    /// Number of declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check whether nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve a type path written inside `module` to a declared type.
    #[must_use]
    pub fn resolve(&self, module: &str, path: &str) -> Option<QualifiedName> {
        self.candidates(module, path)
            .into_iter()
            .map(QualifiedName::new)
            .find(|name| self.contains(name))
    }

    /// Rewrite the paths of a type written inside `module` so they resolve
    /// from any module of the crate.
    ///
    /// Declared types become `crate::` paths, imported names are replaced
    /// by their import target, everything else (primitives, prelude types,
    /// extern crate paths) is kept. Text that is not a type is returned
    /// unchanged.
    #[must_use]
    pub fn qualify_type(&self, module: &str, text: &str) -> String {
        let Ok(mut ty) = syn::parse_str::<Type>(text) else {
            return text.to_owned();
        };
        Qualifier {
            index: self,
            module
        }
        .visit_type_mut(&mut ty);
        quote::quote!(#ty).to_string()
    }

    fn candidates(&self, module: &str, path: &str) -> Vec<String> {
        let segments: Vec<&str> = path.split("::").filter(|s| !s.is_empty()).collect();
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };

        if matches!(*first, "crate" | "self" | "super") {
            return absolutize(module, path).into_iter().collect();
        }

        let scope = self.scopes.get(module);
        let imported = scope.and_then(|s| s.imports.get(*first));
        let tail = rest.join("::");
        let mut out = Vec::new();

        if let Some(target) = imported {
            out.push(if tail.is_empty() { target.clone() } else { format!("{target}::{tail}") });
        }
        out.push(format!("{module}::{path}"));
        if rest.is_empty() {
            if let Some(scope) = scope {
                out.extend(scope.globs.iter().map(|glob| format!("{glob}::{path}")));
            }
        } else {
            out.push(format!("crate::{path}"));
        }
        out
    }
}

struct Qualifier<'a> {
    index:  &'a DeclarationIndex,
    module: &'a str
}

impl Qualifier<'_> {
    fn replacement(&self, written: &str) -> Option<String> {
        if let Some(name) = self.index.resolve(self.module, written) {
            return Some(name.as_str().to_owned());
        }
        let (first, rest) = written.split_once("::").map_or((written, None), |(f, r)| (f, Some(r)));
        let target = self.index.scopes.get(self.module)?.imports.get(first)?;
        Some(match rest {
            Some(rest) => format!("{target}::{rest}"),
            None => target.clone()
        })
    }
}

impl VisitMut for Qualifier<'_> {
    fn visit_type_path_mut(&mut self, node: &mut TypePath) {
        visit_mut::visit_type_path_mut(self, node);
        if node.qself.is_some() || node.path.leading_colon.is_some() {
            return;
        }
        let written = node
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");
        let Some(replacement) = self.replacement(&written).filter(|r| *r != written) else {
            return;
        };
        let Ok(mut path) = syn::parse_str::<syn::Path>(&replacement) else {
            return;
        };
        if let (Some(last), Some(original)) = (path.segments.last_mut(), node.path.segments.last()) {
            last.arguments = original.arguments.clone();
        }
        node.path = path;
    }
}

/// Turn a `crate::`/`self::`/`super::` path into an absolute one.
///
/// Other paths are taken as relative to `module`.
pub fn absolutize(module: &str, path: &str) -> Option<String> {
    let mut base: Vec<&str> = module.split("::").collect();
    let mut segments = path.split("::").peekable();

    match segments.peek().copied() {
        Some("crate") => return Some(path.to_owned()),
        Some("self") => {
            segments.next();
        }
        Some("super") => {
            while segments.peek() == Some(&"super") {
                segments.next();
                if base.len() <= 1 {
                    return None;
                }
                base.pop();
            }
        }
        _ => {}
    }

    base.extend(segments);
    Some(base.join("::"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DeclRef;

    fn declared(name: &str) -> DeclaredType {
        let name = QualifiedName::new(name);
        DeclaredType {
            location: Location::new(DeclRef::ty(name.clone(), DeclKind::Struct), "src/lib.rs", 1, 1),
            name,
            kind: DeclKind::Struct,
            visible: true,
            generic: false,
            fields: Vec::new(),
            methods: Vec::new(),
            derives: BTreeSet::new(),
            implements_default: false,
            doc: None
        }
    }

    fn index() -> DeclarationIndex {
        let mut index = DeclarationIndex::new();
        for name in [
            "crate::model::Book",
            "crate::model::Author",
            "crate::people::Person",
            "crate::tags::Tag"
        ] {
            index.insert(declared(name)).unwrap();
        }
        let mut scope = ModuleScope::default();
        scope
            .imports
            .insert("Who".to_owned(), "crate::people::Person".to_owned());
        scope
            .imports
            .insert("Uuid".to_owned(), "uuid::Uuid".to_owned());
        scope.globs.insert("crate::tags".to_owned());
        index.add_scope("crate::model", scope);
        index
    }

    #[test]
    fn absolutize_paths() {
        assert_eq!(absolutize("crate::a::b", "super::C").as_deref(), Some("crate::a::C"));
        assert_eq!(absolutize("crate::a", "self::C").as_deref(), Some("crate::a::C"));
        assert_eq!(absolutize("crate::a", "crate::x::C").as_deref(), Some("crate::x::C"));
        assert_eq!(absolutize("crate", "super::C"), None);
    }

    #[test]
    fn resolves_same_module() {
        let index = index();
        assert_eq!(
            index.resolve("crate::model", "Author").unwrap().as_str(),
            "crate::model::Author"
        );
    }

    #[test]
    fn resolves_imports_and_globs() {
        let index = index();
        assert_eq!(
            index.resolve("crate::model", "Who").unwrap().as_str(),
            "crate::people::Person"
        );
        assert_eq!(
            index.resolve("crate::model", "Tag").unwrap().as_str(),
            "crate::tags::Tag"
        );
    }

    #[test]
    fn resolves_crate_relative_paths() {
        let index = index();
        assert_eq!(
            index.resolve("crate::model", "people::Person").unwrap().as_str(),
            "crate::people::Person"
        );
        assert_eq!(
            index.resolve("crate::model", "super::tags::Tag").unwrap().as_str(),
            "crate::tags::Tag"
        );
    }

    #[test]
    fn unknown_is_unresolved() {
        assert!(index().resolve("crate::model", "Publisher").is_none());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut index = index();
        assert!(index.insert(declared("crate::model::Book")).is_err());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn qualify_type_rewrites_every_path() {
        let index = index();
        assert_eq!(
            index.qualify_type("crate::model", "Option<Vec<Author>>"),
            "Option < Vec < crate :: model :: Author > >"
        );
        assert_eq!(index.qualify_type("crate::model", "Uuid"), "uuid :: Uuid");
        assert_eq!(index.qualify_type("crate::model", "Who"), "crate :: people :: Person");
        assert_eq!(index.qualify_type("crate::model", "u64"), "u64");
        assert_eq!(index.qualify_type("crate::model", "not a type"), "not a type");
    }
}
