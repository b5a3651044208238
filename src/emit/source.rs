// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Fragment builder for generated files.
//!
//! Emitters never concatenate strings. They push named token fragments into
//! a [`SourceUnit`]; rendering parses every fragment into a `syn::Item`,
//! so a malformed template fails here with the fragment's name instead of
//! producing a file that does not compile.
//!
//! ```text
//! // @generated by entity-forge. Do not edit.
//! // entity:   crate::model::Book
//! // artifact: repository 3f2a9c0d17b4e6a8
//!
//! impl ::entity_forge_core::Entity for crate::model::Book { .. }
//! pub trait BookRepository: .. {}
//! ```

use proc_macro2::TokenStream;

use super::EmitError;
use crate::plan::ArtifactPlan;

/// First line of every generated file.
pub const GENERATED_MARKER: &str = "// @generated by entity-forge. Do not edit.";

/// What a fragment declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Constant item.
    Const,
    /// Struct item.
    Struct,
    /// Trait item.
    Trait,
    /// Impl block.
    Impl
}

/// One top-level item of a generated file.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Item category.
    pub kind:   FragmentKind,
    /// Name used in tests and error messages.
    pub name:   String,
    /// Item tokens.
    pub tokens: TokenStream
}

/// Ordered fragments of one generated file.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    header:    Vec<String>,
    fragments: Vec<Fragment>
}

impl SourceUnit {
    /// Empty unit for a planned artifact.
    pub fn new(plan: &ArtifactPlan) -> Self {
        Self {
            header:    vec![
                GENERATED_MARKER.to_owned(),
                format!("// entity:   {}", plan.entity),
                format!("// artifact: {} {}", plan.kind, plan.id)
            ],
            fragments: Vec::new()
        }
    }

    /// Append a fragment.
    pub fn push(&mut self, kind: FragmentKind, name: impl Into<String>, tokens: TokenStream) {
        self.fragments.push(Fragment {
            kind,
            name: name.into(),
            tokens
        });
    }

    /// Fragments in emission order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Fragment names in emission order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.name.as_str()).collect()
    }

    /// Fragment by name.
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.name == name)
    }

    /// Serialize into formatted Rust source.
    pub fn render(&self) -> Result<String, EmitError> {
        let items = self
            .fragments
            .iter()
            .map(|fragment| {
                syn::parse2::<syn::Item>(fragment.tokens.clone()).map_err(|e| EmitError::Fragment {
                    name:    fragment.name.clone(),
                    message: e.to_string()
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let file = syn::File {
            shebang: None,
            attrs: Vec::new(),
            items
        };

        let mut out = self.header.join("\n");
        out.push_str("\n\n");
        out.push_str(&prettyplease::unparse(&file));
        Ok(out)
    }
}
