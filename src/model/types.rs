// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Field type analysis.
//!
//! | Written type         | kind        | optional | collection |
//! |----------------------|-------------|----------|------------|
//! | `String`             | `Text`      | no       | no         |
//! | `Option<i64>`        | `Integer`   | yes      | no         |
//! | `Vec<Tag>`           | `Reference` | no       | yes        |
//! | `Option<Vec<f32>>`   | `Float`     | yes      | yes        |

use syn::{GenericArgument, PathArguments, Type};

use crate::schema::path_text;

/// Containers treated as collections.
const COLLECTIONS: &[&str] = &["Vec", "VecDeque", "HashSet", "BTreeSet"];

/// Integers the runtime `Value` and `Coerce` conversions cover. `i128` and
/// `u128` are left out and classify as references.
const INTEGERS: &[&str] = &[
    "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize"
];

/// Element kind of a field type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// `String` or `str`.
    Text,
    /// `bool`.
    Bool,
    /// Primitive integer up to 64 bits.
    Integer,
    /// `f32` or `f64`.
    Float,
    /// Any other path, as written.
    Reference(String)
}

impl TypeKind {
    /// Check for integer or float.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Check for a primitive scalar.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Reference(_))
    }
}

/// Semantic type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Element kind.
    pub kind:              TypeKind,
    /// Wrapped in `Option`.
    pub optional:          bool,
    /// Wrapped in a collection.
    pub collection:        bool,
    /// Full type as written.
    pub rendered:          String,
    /// Element type after removing `Option` and the collection.
    pub element:           String,
    /// Full type with paths valid anywhere in the crate.
    pub qualified:         String,
    /// Element type with paths valid anywhere in the crate.
    pub qualified_element: String
}

impl TypeDescriptor {
    /// Analyze a type written in token form.
    ///
    /// Returns `None` when the text is not a type.
    pub fn parse(text: &str) -> Option<Self> {
        let ty: Type = syn::parse_str(text).ok()?;
        let (optional, ty) = match single_argument(&ty, &["Option"]) {
            Some(inner) => (true, inner),
            None => (false, &ty)
        };
        let (collection, element) = match single_argument(ty, COLLECTIONS) {
            Some(inner) => (true, inner),
            None => (false, ty)
        };

        let kind = classify(element);
        let element = quote::quote!(#element).to_string();
        Some(Self {
            kind,
            optional,
            collection,
            rendered: text.to_owned(),
            qualified: text.to_owned(),
            qualified_element: element.clone(),
            element
        })
    }

    /// Rewrite the qualified renderings with `qualify`.
    #[must_use]
    pub fn qualified_with(mut self, qualify: impl Fn(&str) -> String) -> Self {
        self.qualified = qualify(&self.rendered);
        self.qualified_element = qualify(&self.element);
        self
    }

    /// Check whether a `String` value fits, optional or not.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == TypeKind::Text && !self.collection
    }

    /// Check whether a number fits, optional or not.
    #[must_use]
    pub fn is_number(&self) -> bool {
        self.kind.is_numeric() && !self.collection
    }

    /// Check for a plain value: no `Option`, no collection.
    #[must_use]
    pub fn is_plain(&self) -> bool {
        !self.optional && !self.collection
    }
}

fn classify(ty: &Type) -> TypeKind {
    match ty {
        Type::Reference(r) => classify(&r.elem),
        Type::Group(g) => classify(&g.elem),
        Type::Paren(p) => classify(&p.elem),
        Type::Path(p) if p.qself.is_none() => {
            let Some(last) = p.path.segments.last() else {
                return TypeKind::Reference(String::new());
            };
            let ident = last.ident.to_string();
            let bare = p.path.segments.len() == 1
                || ["std", "core", "alloc"]
                    .iter()
                    .any(|root| p.path.segments[0].ident == root);
            match ident.as_str() {
                "String" | "str" if bare => TypeKind::Text,
                "bool" => TypeKind::Bool,
                "f32" | "f64" => TypeKind::Float,
                i if INTEGERS.contains(&i) => TypeKind::Integer,
                _ => TypeKind::Reference(path_text(&p.path))
            }
        }
        other => TypeKind::Reference(quote::quote!(#other).to_string())
    }
}

/// Inner type of `Wrapper<T>` when the last segment is one of `wrappers`.
fn single_argument<'a>(ty: &'a Type, wrappers: &[&str]) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if !wrappers.iter().any(|w| last.ident == w) {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None
    });
    let inner = types.next()?;
    types.next().is_none().then_some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> TypeDescriptor {
        TypeDescriptor::parse(text).unwrap()
    }

    #[test]
    fn primitives() {
        assert_eq!(parse("String").kind, TypeKind::Text);
        assert_eq!(parse("bool").kind, TypeKind::Bool);
        assert_eq!(parse("u16").kind, TypeKind::Integer);
        assert_eq!(parse("f64").kind, TypeKind::Float);
        assert_eq!(parse("std :: string :: String").kind, TypeKind::Text);
    }

    #[test]
    fn option_is_nullable() {
        let ty = parse("Option < i64 >");
        assert!(ty.optional);
        assert!(!ty.collection);
        assert_eq!(ty.kind, TypeKind::Integer);
        assert_eq!(ty.element, "i64");
    }

    #[test]
    fn collections_of_references() {
        let ty = parse("Vec < crate :: model :: Tag >");
        assert!(ty.collection);
        assert_eq!(ty.kind, TypeKind::Reference("crate::model::Tag".into()));

        let ty = parse("Option < BTreeSet < Tag > >");
        assert!(ty.optional && ty.collection);
    }

    #[test]
    fn wide_integers_are_references() {
        assert_eq!(parse("isize").kind, TypeKind::Integer);
        assert_eq!(parse("i128").kind, TypeKind::Reference("i128".into()));
        assert!(!parse("Option < u128 >").is_number());
    }

    #[test]
    fn maps_are_references() {
        let ty = parse("HashMap < String , u32 >");
        assert!(!ty.collection);
        assert_eq!(ty.kind, TypeKind::Reference("HashMap".into()));
    }

    #[test]
    fn not_a_type() {
        assert!(TypeDescriptor::parse("+ +").is_none());
    }
}
