// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Doc comment summaries.
//!
//! The first doc line of an entity or field is carried into the model and
//! reused on generated items:
//!
//! ```rust,ignore
//! /// A published book.
//! ///
//! /// Long description.
//! pub struct Book { ... }
//! ```
//!
//! yields `"A published book."`.

use syn::{Attribute, Expr, ExprLit, Lit, Meta};

/// First non-empty doc line.
pub fn summary(attrs: &[Attribute]) -> Option<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| {
            if let Meta::NameValue(meta) = &attr.meta
                && let Expr::Lit(ExprLit {
                    lit: Lit::Str(text),
                    ..
                }) = &meta.value
            {
                return Some(text.value());
            }
            None
        })
        .flat_map(|text| {
            text.lines()
                .map(|line| line.trim().to_owned())
                .collect::<Vec<_>>()
        })
        .find(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(input: &str) -> Vec<Attribute> {
        let item: syn::ItemStruct = syn::parse_str(input).unwrap();
        item.attrs
    }

    #[test]
    fn first_line() {
        let attrs = attrs(
            r#"
            /// A published book.
            /// Second line.
            struct Book;
        "#
        );
        assert_eq!(summary(&attrs).as_deref(), Some("A published book."));
    }

    #[test]
    fn skips_leading_blank_lines() {
        let attrs = attrs(
            r#"
            ///
            ///   Tag.
            struct Tag;
        "#
        );
        assert_eq!(summary(&attrs).as_deref(), Some("Tag."));
    }

    #[test]
    fn ignores_other_attributes() {
        let attrs = attrs("#[derive(Debug)] struct Bare;");
        assert_eq!(summary(&attrs), None);
    }
}
