// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Identifier, path and literal helpers.
//!
//! Every user supplied name goes through these before it reaches a
//! `quote!` block. Keywords become raw identifiers (`type` → `r#type`);
//! names that cannot be identifiers at all (`self`, `crate`, `1st`) are
//! rejected with an [`EmitError`].

use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::quote;

use super::EmitError;
use crate::model::{EntityModel, FieldModel};

/// Keywords usable as raw identifiers.
const RAW_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn",
    "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield"
];

/// Identifier for a user supplied name.
pub fn ident(name: &str) -> Result<Ident, EmitError> {
    let bare = name.strip_prefix("r#").unwrap_or(name);
    if RAW_KEYWORDS.contains(&bare) {
        return Ok(Ident::new_raw(bare, Span::call_site()));
    }
    syn::parse_str::<Ident>(bare).map_err(|_| EmitError::InvalidIdentifier {
        name: name.to_owned()
    })
}

/// Identifier with a prefix, e.g. `add_` + `tags`.
pub fn prefixed(prefix: &str, name: &str) -> Result<Ident, EmitError> {
    ident(&format!("{prefix}{}", name.strip_prefix("r#").unwrap_or(name)))
}

/// Identifier with a suffix, e.g. `pages` + `_from`.
pub fn suffixed(name: &str, suffix: &str) -> Result<Ident, EmitError> {
    ident(&format!("{}{suffix}", name.strip_prefix("r#").unwrap_or(name)))
}

/// Parse a Rust path.
pub fn path(text: &str) -> Result<syn::Path, EmitError> {
    syn::parse_str(text).map_err(|_| EmitError::InvalidPath {
        path: text.to_owned()
    })
}

/// Parse a Rust type.
pub fn ty(text: &str) -> Result<syn::Type, EmitError> {
    syn::parse_str(text).map_err(|_| EmitError::InvalidType {
        ty: text.to_owned()
    })
}

/// Path of the entity type, which must be reachable from generated code.
pub fn entity_path(entity: &EntityModel) -> Result<syn::Path, EmitError> {
    if !entity.visible {
        return Err(EmitError::NotVisible {
            entity: entity.name.to_string(),
            what:   "the type".to_owned()
        });
    }
    path(entity.name.as_str())
}

/// Identifier of a field read or written by generated code.
pub fn field_ident(entity: &EntityModel, field: &FieldModel) -> Result<Ident, EmitError> {
    if !field.visible {
        return Err(EmitError::NotVisible {
            entity: entity.name.to_string(),
            what:   format!("field `{}`", field.name)
        });
    }
    ident(&field.name)
}

/// Path of the runtime support crate.
pub fn runtime() -> TokenStream {
    quote! { ::entity_forge_core }
}

/// Unsuffixed integer literal, negated when below zero.
pub fn int(value: i64) -> TokenStream {
    let lit = Literal::u64_unsuffixed(value.unsigned_abs());
    if value < 0 { quote! { -#lit } } else { quote! { #lit } }
}

/// Unsuffixed length literal.
pub fn length(value: u64) -> Literal {
    Literal::u64_unsuffixed(value)
}

/// Unsuffixed float literal, negated when below zero.
pub fn float(value: i64) -> TokenStream {
    let lit = Literal::f64_unsuffixed(value.unsigned_abs() as f64);
    if value < 0 { quote! { -#lit } } else { quote! { #lit } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers() {
        assert_eq!(ident("title").unwrap().to_string(), "title");
        assert_eq!(ident("r#title").unwrap().to_string(), "title");
    }

    #[test]
    fn keywords_become_raw() {
        assert_eq!(ident("type").unwrap().to_string(), "r#type");
        assert_eq!(ident("r#match").unwrap().to_string(), "r#match");
        assert_eq!(suffixed("r#type", "_from").unwrap().to_string(), "type_from");
    }

    #[test]
    fn invalid_identifiers() {
        for name in ["self", "crate", "1st", "a-b", ""] {
            assert!(
                matches!(ident(name), Err(EmitError::InvalidIdentifier { .. })),
                "{name}"
            );
        }
    }

    #[test]
    fn negative_literals() {
        assert_eq!(int(-3).to_string(), "- 3");
        assert_eq!(int(7).to_string(), "7");
        assert_eq!(float(2).to_string(), "2.0");
    }

    #[test]
    fn paths_and_types() {
        assert!(path("crate::model::Book").is_ok());
        assert!(path("crate::model::").is_err());
        assert!(ty("Option<Vec<u64>>").is_ok());
    }
}
