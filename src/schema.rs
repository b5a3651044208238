// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Metadata schema: the directive vocabulary.
//!
//! The schema is a value handed to each round, never a global table. It
//! says, for every directive name:
//!
//! - which declaration kinds may carry it ([`Target`])
//! - which attributes it takes and their types ([`AttrSpec`])
//! - which capabilities it grants to the owning entity ([`Capability`])
//! - which directives it needs or excludes on the same declaration
//!
//! [`MetadataSchema::standard`] describes the built-in vocabulary; a
//! configuration document may add directives or replace built-in ones.
//!
//! # Standard Vocabulary
//!
//! | Directive          | Target | Attributes                                         |
//! |--------------------|--------|----------------------------------------------------|
//! | `repository`       | struct | `module`                                           |
//! | `service`          | struct | `module`                                           |
//! | `controller`       | struct | `path`, `module`                                   |
//! | `get_or_create`    | struct | `path`                                             |
//! | `config_binding`   | struct | `prefix` (required), `module`                      |
//! | `id`               | field  |                                                    |
//! | `transient`        | field  |                                                    |
//! | `filter`           | field  | `kind`: `eq` / `contains` / `range`                |
//! | `relation`         | field  | `target`, `kind`, `mapped_by`                      |
//! | `endpoints`        | field  | `path`, `method`, `read`, `add`, `remove`          |
//! | `validate`         | field  | `min_length`, `max_length`, `min`, `max`, `not_blank` |
//! | `config_key`       | field  | `name`, `default`                                  |
//! | `get_endpoint`     | method | `path`                                             |

mod standard;
mod value;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use self::value::{AttrValue, attribute_name, parse_arguments, path_text};
use crate::diagnostics::DeclKind;

/// Entity capability derived from directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Persistence contract requested.
    Repository,
    /// Business service requested.
    Service,
    /// Web controller requested.
    Controller,
    /// Get-or-create by name requested.
    GetOrCreate,
    /// At least one filter field.
    Queryable,
    /// At least one relation field.
    Relations,
    /// At least one validation constraint.
    Validation,
    /// Bound from configuration.
    ConfigBinding,
    /// Has a `name: String` field.
    HasName
}

impl Capability {
    /// Snake-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::Service => "service",
            Self::Controller => "controller",
            Self::GetOrCreate => "get_or_create",
            Self::Queryable => "queryable",
            Self::Relations => "relations",
            Self::Validation => "validation",
            Self::ConfigBinding => "config_binding",
            Self::HasName => "has_name"
        }
    }
}

/// Declaration kind a directive may be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Struct with named fields.
    Struct,
    /// Named field.
    Field,
    /// Inherent method.
    Method
}

impl Target {
    /// Check whether a declaration kind matches.
    #[must_use]
    pub fn accepts(&self, kind: DeclKind) -> bool {
        matches!(
            (self, kind),
            (Self::Struct, DeclKind::Struct)
                | (Self::Field, DeclKind::Field)
                | (Self::Method, DeclKind::Method)
        )
    }
}

/// Attribute value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    /// String literal or path.
    Str,
    /// Integer.
    Int,
    /// Float or integer.
    Float,
    /// Boolean.
    Bool,
    /// One of the listed words.
    Enum(Vec<String>),
    /// Any literal.
    Scalar
}

impl AttrType {
    fn describe(&self) -> String {
        match self {
            Self::Str => "a string".to_owned(),
            Self::Int => "an integer".to_owned(),
            Self::Float => "a number".to_owned(),
            Self::Bool => "a boolean".to_owned(),
            Self::Enum(values) => format!("one of {}", values.join(", ")),
            Self::Scalar => "a literal".to_owned()
        }
    }

    fn normalize(&self, value: &AttrValue) -> Option<AttrValue> {
        match (self, value) {
            (Self::Str, AttrValue::Str(_) | AttrValue::EnumRef(_)) => {
                value.as_text().map(|s| AttrValue::Str(s.to_owned()))
            }
            (Self::Int, AttrValue::Int(_)) | (Self::Bool, AttrValue::Bool(_)) => Some(value.clone()),
            (Self::Float, AttrValue::Float(_)) => Some(value.clone()),
            (Self::Float, AttrValue::Int(i)) => Some(AttrValue::Float(*i as f64)),
            (Self::Enum(values), AttrValue::Str(s) | AttrValue::EnumRef(s)) => values
                .iter()
                .any(|v| v == s)
                .then(|| AttrValue::EnumRef(s.clone())),
            (Self::Scalar, _) => Some(value.clone()),
            _ => None
        }
    }
}

/// One attribute of a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttrSpec {
    /// Attribute key.
    pub name:      String,
    /// Expected type: a plain word, or `{enum: [..]}` for enum attributes.
    #[serde(rename = "type", with = "serde_yaml::with::singleton_map")]
    pub ty:        AttrType,
    /// Must be present.
    #[serde(default)]
    pub required:  bool,
    /// For enum attributes: a bare allowed word sets this attribute.
    #[serde(default)]
    pub shorthand: bool
}

impl AttrSpec {
    /// Optional attribute.
    pub fn optional(name: &str, ty: AttrType) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            required: false,
            shorthand: false
        }
    }

    /// Required attribute.
    pub fn required(name: &str, ty: AttrType) -> Self {
        Self {
            required: true,
            ..Self::optional(name, ty)
        }
    }

    /// Enum attribute settable by a bare word.
    pub fn shorthand_enum(name: &str, values: &[&str]) -> Self {
        Self {
            shorthand: true,
            ..Self::optional(name, AttrType::Enum(values.iter().map(|v| (*v).to_owned()).collect()))
        }
    }
}

/// Definition of one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectiveSpec {
    /// Attribute name, e.g. `repository`.
    pub name:       String,
    /// Valid declaration kinds.
    pub targets:    Vec<Target>,
    /// Accepted attributes.
    #[serde(default)]
    pub attributes: Vec<AttrSpec>,
    /// Capabilities granted to the owning entity.
    #[serde(default)]
    pub grants:     Vec<Capability>,
    /// Directives that must accompany this one on the same declaration.
    #[serde(default)]
    pub requires:   Vec<String>,
    /// Directives that may not accompany this one on the same declaration.
    #[serde(default)]
    pub conflicts:  Vec<String>
}

impl DirectiveSpec {
    /// Check whether the directive may be placed on a declaration kind.
    #[must_use]
    pub fn accepts(&self, kind: DeclKind) -> bool {
        self.targets.iter().any(|t| t.accepts(kind))
    }

    /// Human readable list of valid targets.
    #[must_use]
    pub fn describe_targets(&self) -> String {
        self.targets
            .iter()
            .map(|t| match t {
                Target::Struct => "structs with named fields",
                Target::Field => "fields",
                Target::Method => "methods"
            })
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Check parsed arguments against the attribute specs.
    ///
    /// Returns the normalized arguments (shorthand flags expanded, enum
    /// values as [`AttrValue::EnumRef`], paths accepted as strings) or every
    /// problem found.
    pub fn check(
        &self,
        args: &BTreeMap<String, AttrValue>
    ) -> Result<BTreeMap<String, AttrValue>, Vec<String>> {
        let mut problems = Vec::new();
        let mut normalized = BTreeMap::new();

        for (key, value) in args {
            let named = self.attributes.iter().find(|a| &a.name == key);
            if let Some(spec) = named.or_else(|| self.positional(key)) {
                if named.is_none() && args.contains_key(&spec.name) {
                    problems.push(format!("`{}` is set more than once", spec.name));
                    continue;
                }
                match spec.ty.normalize(value) {
                    Some(v) => {
                        normalized.insert(spec.name.clone(), v);
                    }
                    None => problems.push(format!(
                        "`{}` expects {}, found {} `{}`",
                        key,
                        spec.ty.describe(),
                        value.type_name(),
                        value
                    ))
                }
                continue;
            }

            let shorthand = (value == &AttrValue::Bool(true))
                .then(|| {
                    self.attributes.iter().find(|a| {
                        a.shorthand && matches!(&a.ty, AttrType::Enum(values) if values.contains(key))
                    })
                })
                .flatten();

            match shorthand {
                Some(spec) if normalized.contains_key(&spec.name) || args.contains_key(&spec.name) => {
                    problems.push(format!("`{}` is set more than once", spec.name));
                }
                Some(spec) => {
                    normalized.insert(spec.name.clone(), AttrValue::EnumRef(key.clone()));
                }
                None => {
                    let known = self
                        .attributes
                        .iter()
                        .map(|a| a.name.as_str())
                        .collect::<Vec<_>>();
                    problems.push(if known.is_empty() {
                        format!("`#[{}]` takes no attributes, found `{}`", self.name, key)
                    } else {
                        format!(
                            "unknown attribute `{}` for `#[{}]` (expected {})",
                            key,
                            self.name,
                            known.join(", ")
                        )
                    });
                }
            }
        }

        for spec in self.attributes.iter().filter(|a| a.required) {
            if !normalized.contains_key(&spec.name) {
                problems.push(format!("`#[{}]` requires `{}`", self.name, spec.name));
            }
        }

        if problems.is_empty() { Ok(normalized) } else { Err(problems) }
    }

    /// Attribute receiving a positional value: `#[filter = "contains"]`.
    fn positional(&self, key: &str) -> Option<&AttrSpec> {
        if key != "value" {
            return None;
        }
        self.attributes
            .iter()
            .find(|a| a.shorthand)
            .or_else(|| match self.attributes.as_slice() {
                [only] => Some(only),
                _ => None
            })
    }
}

/// The directive vocabulary of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSchema {
    directives: BTreeMap<String, DirectiveSpec>
}

impl MetadataSchema {
    /// Schema with the given directives.
    pub fn new(directives: impl IntoIterator<Item = DirectiveSpec>) -> Self {
        Self {
            directives: directives
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect()
        }
    }

    /// Built-in vocabulary.
    pub fn standard() -> Self {
        Self::new(standard::directives())
    }

    /// Add directives, replacing built-ins with the same name.
    #[must_use]
    pub fn extended(mut self, extra: impl IntoIterator<Item = DirectiveSpec>) -> Self {
        for directive in extra {
            self.directives.insert(directive.name.clone(), directive);
        }
        self
    }

    /// Look up a directive.
    #[must_use]
    pub fn directive(&self, name: &str) -> Option<&DirectiveSpec> {
        self.directives.get(name)
    }

    /// All directives sorted by name.
    pub fn directives(&self) -> impl Iterator<Item = &DirectiveSpec> {
        self.directives.values()
    }

    /// Check whether two directives exclude each other (either direction).
    #[must_use]
    pub fn conflicts(&self, a: &str, b: &str) -> bool {
        let declared = |x: &str, y: &str| {
            self.directive(x)
                .is_some_and(|d| d.conflicts.iter().any(|c| c == y))
        };
        declared(a, b) || declared(b, a)
    }
}

impl Default for MetadataSchema {
    fn default() -> Self {
        Self::standard()
    }
}
