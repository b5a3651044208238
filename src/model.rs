// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Semantic entity model.
//!
//! The model is directive agnostic: once built, nothing downstream looks at
//! attribute names again. Relations are stored as qualified names and
//! dereferenced through the [`ModelTable`], so a cycle between entities is
//! just two names pointing at each other.
//!
//! # Build Passes
//!
//! ```text
//! ScanOutput
//!     │
//!     ├─ 1. skeletons     type directives, attribute checks, capabilities
//!     ├─ 2. resolution    fields, relation targets, referenced entities
//!     ├─ 3. validation    per entity, in parallel
//!     └─ 4. cycles        Tarjan over relation edges
//!     │
//!     ▼
//! ModelTable
//! ```

mod builder;
mod cycles;
mod types;

#[cfg(test)]
mod tests;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt
};

pub use self::{
    builder::build,
    types::{TypeDescriptor, TypeKind}
};
use crate::{
    diagnostics::Location,
    naming::QualifiedName,
    schema::{AttrValue, Capability}
};

/// Field constraint from `#[validate]`, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Minimum length in characters.
    MinLength(u64),
    /// Maximum length in characters.
    MaxLength(u64),
    /// Inclusive lower bound.
    Min(i64),
    /// Inclusive upper bound.
    Max(i64),
    /// Not empty after trimming.
    NotBlank
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength(n) => write!(f, "min_length = {n}"),
            Self::MaxLength(n) => write!(f, "max_length = {n}"),
            Self::Min(n) => write!(f, "min = {n}"),
            Self::Max(n) => write!(f, "max = {n}"),
            Self::NotBlank => f.write_str("not_blank")
        }
    }
}

/// Query operator of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKind {
    /// Equality.
    Eq,
    /// Substring match.
    Contains,
    /// Inclusive range.
    Range
}

impl FilterKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "contains" => Some(Self::Contains),
            "range" => Some(Self::Range),
            _ => None
        }
    }

    /// Snake-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Contains => "contains",
            Self::Range => "range"
        }
    }
}

/// Relation cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    /// `1:1`.
    OneToOne,
    /// `N:1`.
    ManyToOne,
    /// `1:N`.
    OneToMany,
    /// `N:M`.
    ManyToMany
}

impl RelationKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "one_to_one" => Some(Self::OneToOne),
            "many_to_one" => Some(Self::ManyToOne),
            "one_to_many" => Some(Self::OneToMany),
            "many_to_many" => Some(Self::ManyToMany),
            _ => None
        }
    }

    /// Snake-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "one_to_one",
            Self::ManyToOne => "many_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToMany => "many_to_many"
        }
    }

    /// Check whether the owning side holds many related values.
    #[must_use]
    pub const fn is_to_many(&self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }
}

/// What a relation field physically holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationStorage {
    /// The related entity values.
    Embedded,
    /// Only the related entity ids.
    Identifier
}

/// Generated sub-resource endpoints of a relation field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoints {
    /// Path below the entity item path, e.g. `/tags`.
    pub path:   String,
    /// Service method name.
    pub method: String,
    /// `GET` listing of related values.
    pub read:   bool,
    /// `POST` adding a related value.
    pub add:    bool,
    /// `DELETE` removing a related value by id.
    pub remove: bool
}

/// Resolved relation of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    /// Related entity, looked up through the [`ModelTable`].
    pub target:    QualifiedName,
    /// Cardinality.
    pub kind:      RelationKind,
    /// Physical representation.
    pub storage:   RelationStorage,
    /// Field of the target pointing back.
    pub mapped_by: Option<String>,
    /// Sub-resource endpoints.
    pub endpoints: Option<Endpoints>
}

/// Configuration binding of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigKey {
    /// Key below the entity prefix.
    pub name:    String,
    /// Fallback literal.
    pub default: Option<AttrValue>
}

/// One field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldModel {
    /// Field name.
    pub name:        String,
    /// Semantic type.
    pub ty:          TypeDescriptor,
    /// Declared `pub` or `pub(...)`.
    pub visible:     bool,
    /// First doc line.
    pub doc:         Option<String>,
    /// Constraints in declaration order.
    pub constraints: Vec<Constraint>,
    /// Query operator, if filterable.
    pub filter:      Option<FilterKind>,
    /// Primary key.
    pub is_id:       bool,
    /// Excluded from persistence, filters and binding.
    pub transient:   bool,
    /// Relation to another entity.
    pub relation:    Option<Relation>,
    /// Configuration key.
    pub config_key:  ConfigKey,
    /// Field location.
    pub location:    Location
}

impl FieldModel {
    /// Field may be absent.
    #[must_use]
    pub fn nullable(&self) -> bool {
        self.ty.optional
    }
}

/// Inherent method exposed as a `GET` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEndpoint {
    /// Method name.
    pub name:     String,
    /// Path below the entity item path.
    pub path:     String,
    /// Return type as written.
    pub returns:  String,
    /// Declared `pub` or `pub(...)`.
    pub visible:  bool,
    /// Method location.
    pub location: Location
}

/// Why an entity is part of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Carries directives.
    Annotated,
    /// Only the target of a relation.
    Referenced
}

/// Validated model of one struct.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityModel {
    /// Qualified name.
    pub name:               QualifiedName,
    /// How the entity entered the model.
    pub origin:             Origin,
    /// Declared `pub` or `pub(...)`.
    pub visible:            bool,
    /// Fields in source order.
    pub fields:             Vec<FieldModel>,
    /// Method endpoints in source order.
    pub endpoints:          Vec<MethodEndpoint>,
    /// Capability flags.
    pub capabilities:       BTreeSet<Capability>,
    /// Module overrides keyed by the capability whose directive set them.
    pub modules:            BTreeMap<Capability, String>,
    /// Controller base path.
    pub controller_path:    Option<String>,
    /// Get-or-create endpoint path.
    pub get_or_create_path: Option<String>,
    /// Configuration prefix.
    pub config_prefix:      Option<String>,
    /// First doc line.
    pub doc:                Option<String>,
    /// `Default` derived or implemented.
    pub implements_default: bool,
    /// Type location.
    pub location:           Location
}

impl EntityModel {
    /// Simple type name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.simple()
    }

    /// Module the type is declared in.
    #[must_use]
    pub fn module(&self) -> &str {
        self.name.module()
    }

    /// Check for a capability.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Primary key field.
    #[must_use]
    pub fn id_field(&self) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.is_id)
    }

    /// Field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Persistent fields: everything not transient.
    pub fn persistent_fields(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields.iter().filter(|f| !f.transient)
    }

    /// Fields with a filter.
    pub fn filter_fields(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields.iter().filter(|f| f.filter.is_some())
    }

    /// Fields with a relation.
    pub fn relations(&self) -> impl Iterator<Item = (&FieldModel, &Relation)> {
        self.fields
            .iter()
            .filter_map(|f| f.relation.as_ref().map(|r| (f, r)))
    }

    /// Targets of all relations.
    #[must_use]
    pub fn related(&self) -> BTreeSet<QualifiedName> {
        self.relations().map(|(_, r)| r.target.clone()).collect()
    }
}

/// All entities of a round.
#[derive(Debug, Clone, Default)]
pub struct ModelTable {
    entities: BTreeMap<QualifiedName, EntityModel>,
    failed:   BTreeSet<QualifiedName>,
    cycles:   Vec<Vec<QualifiedName>>
}

impl ModelTable {
    /// Entity by name, failed or not.
    #[must_use]
    pub fn get(&self, name: &QualifiedName) -> Option<&EntityModel> {
        self.entities.get(name)
    }

    /// Every entity, sorted by name.
    pub fn entities(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities.values()
    }

    /// Entities without error diagnostics, sorted by name.
    pub fn valid(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities
            .values()
            .filter(|e| !self.failed.contains(&e.name))
    }

    /// Check whether an entity has error diagnostics.
    #[must_use]
    pub fn is_failed(&self, name: &QualifiedName) -> bool {
        self.failed.contains(name)
    }

    /// Entities with error diagnostics.
    #[must_use]
    pub fn failed(&self) -> &BTreeSet<QualifiedName> {
        &self.failed
    }

    /// Relation cycles.
    #[must_use]
    pub fn cycles(&self) -> &[Vec<QualifiedName>] {
        &self.cycles
    }

    /// Check whether an entity is part of a relation cycle.
    #[must_use]
    pub fn in_cycle(&self, name: &QualifiedName) -> bool {
        self.cycles.iter().any(|c| c.contains(name))
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check for an empty model.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
