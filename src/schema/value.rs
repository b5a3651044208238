// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Directive attribute values.
//!
//! Directive arguments are parsed with darling into a map of
//! [`AttrValue`]s. Every argument shape rustc accepts inside an attribute
//! list is mapped to one tagged variant:
//!
//! ```text
//! #[relation(target = "crate::Author", many_to_one, mapped_by = author)]
//!            ───────────┬──────────── ─────┬─────  ──────────┬───────
//!                   Str("crate::Author")   │           EnumRef("author")
//!                                   many_to_one = Bool(true)
//! ```
//!
//! Bare words become `true` flags; the schema later turns a flag that names
//! an allowed value of a shorthand enum attribute into that attribute.

use std::{collections::BTreeMap, fmt};

use darling::{FromMeta, ast::NestedMeta};
use syn::{Attribute, Expr, Lit, Meta, UnOp};

/// One directive attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// String literal.
    Str(String),
    /// Integer literal, optionally negated.
    Int(i64),
    /// Float literal, optionally negated.
    Float(f64),
    /// Boolean literal or bare flag.
    Bool(bool),
    /// Unquoted path such as `many_to_one` or `crate::Author`.
    EnumRef(String)
}

impl AttrValue {
    /// Text of string and path values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::EnumRef(s) => Some(s),
            _ => None
        }
    }

    /// Boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None
        }
    }

    /// Integer value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None
        }
    }

    /// Name of the variant, used in messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::EnumRef(_) => "path"
        }
    }

    /// Literal text used when the value becomes a textual default.
    #[must_use]
    pub fn to_literal_text(&self) -> String {
        match self {
            Self::Str(s) | Self::EnumRef(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string()
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::EnumRef(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}")
        }
    }
}

impl FromMeta for AttrValue {
    fn from_word() -> darling::Result<Self> {
        Ok(Self::Bool(true))
    }

    fn from_value(value: &Lit) -> darling::Result<Self> {
        match value {
            Lit::Str(s) => Ok(Self::Str(s.value())),
            Lit::Int(i) => Ok(Self::Int(i.base10_parse()?)),
            Lit::Float(f) => Ok(Self::Float(f.base10_parse()?)),
            Lit::Bool(b) => Ok(Self::Bool(b.value)),
            other => Err(darling::Error::unexpected_lit_type(other))
        }
    }

    fn from_expr(expr: &Expr) -> darling::Result<Self> {
        match expr {
            Expr::Lit(lit) => Self::from_value(&lit.lit),
            Expr::Group(group) => Self::from_expr(&group.expr),
            Expr::Path(path) if path.qself.is_none() => Ok(Self::EnumRef(path_text(&path.path))),
            Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
                match Self::from_expr(&unary.expr)? {
                    Self::Int(i) => Ok(Self::Int(-i)),
                    Self::Float(f) => Ok(Self::Float(-f)),
                    _ => Err(darling::Error::unexpected_expr_type(expr))
                }
            }
            other => Err(darling::Error::unexpected_expr_type(other))
        }
        .map_err(|e| e.with_span(expr))
    }
}

/// Path rendered as `a::b::c`, keeping a leading `crate`/`self`/`super`.
pub fn path_text(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

/// Last path segment of an attribute, e.g. `repository` for
/// `#[entity_forge::repository]`.
pub fn attribute_name(attr: &Attribute) -> Option<String> {
    attr.path().segments.last().map(|s| s.ident.to_string())
}

/// Parse all arguments of a directive attribute.
///
/// - `#[id]` has no arguments
/// - `#[filter = "contains"]` is stored under the key `value`
/// - `#[relation(kind = many_to_one, "x")]` stores positional literals
///   under `value`
///
/// Repeated keys are reported as errors; all problems are accumulated.
pub fn parse_arguments(attr: &Attribute) -> darling::Result<BTreeMap<String, AttrValue>> {
    match &attr.meta {
        Meta::Path(_) => Ok(BTreeMap::new()),
        Meta::NameValue(nv) => {
            let mut args = BTreeMap::new();
            args.insert("value".to_owned(), AttrValue::from_expr(&nv.value)?);
            Ok(args)
        }
        Meta::List(list) => {
            let items = NestedMeta::parse_meta_list(list.tokens.clone())?;
            let mut errors = darling::Error::accumulator();
            let mut args = BTreeMap::new();

            for item in items {
                let parsed = match &item {
                    NestedMeta::Meta(meta) => {
                        let key = meta
                            .path()
                            .segments
                            .last()
                            .map(|s| s.ident.to_string())
                            .unwrap_or_default();
                        AttrValue::from_meta(meta).map(|v| (key, v))
                    }
                    NestedMeta::Lit(lit) => AttrValue::from_value(lit).map(|v| ("value".to_owned(), v))
                };
                if let Some((key, value)) = errors.handle(parsed) {
                    if args.contains_key(&key) {
                        errors.push(darling::Error::duplicate_field(&key).with_span(&item));
                    } else {
                        args.insert(key, value);
                    }
                }
            }

            errors.finish_with(args)
        }
    }
}
