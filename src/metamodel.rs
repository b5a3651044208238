// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Query metamodel lookup.
//!
//! Predicate builders compose through a metamodel type implementing
//! `entity_forge_core::predicate::Metamodel`. Those types come from a separate
//! generator; this crate only asks whether one exists for an entity and
//! what it is called. The question is read-only and answered through
//! [`MetamodelProvider`].
//!
//! [`MetamodelIndex`] answers it for a round, in this order:
//!
//! 1. `metamodel.registered` entries of the configuration
//! 2. the external provider handed to the pipeline
//! 3. a declared type named by `metamodel.naming` (default `Q{name}`) in
//!    `metamodel.module`, or in the entity's own module when unset

use std::collections::BTreeMap;

use crate::{
    config::ForgeConfig,
    naming::{QualifiedName, render_template},
    scan::DeclarationIndex
};

/// Source of query metamodels.
pub trait MetamodelProvider: Send + Sync {
    /// Metamodel type of an entity, if one exists.
    fn metamodel_of(&self, entity: &QualifiedName) -> Option<QualifiedName>;
}

/// Provider that knows no metamodels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetamodels;

impl MetamodelProvider for NoMetamodels {
    fn metamodel_of(&self, _entity: &QualifiedName) -> Option<QualifiedName> {
        None
    }
}

/// Fixed entity to metamodel table.
#[derive(Debug, Clone, Default)]
pub struct StaticMetamodels {
    entries: BTreeMap<QualifiedName, QualifiedName>
}

impl StaticMetamodels {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metamodel.
    #[must_use]
    pub fn with(mut self, entity: impl Into<QualifiedName>, metamodel: impl Into<QualifiedName>) -> Self {
        self.entries.insert(entity.into(), metamodel.into());
        self
    }
}

impl MetamodelProvider for StaticMetamodels {
    fn metamodel_of(&self, entity: &QualifiedName) -> Option<QualifiedName> {
        self.entries.get(entity).cloned()
    }
}

/// Round-level lookup combining configuration, an external provider and
/// the round's declarations.
pub struct MetamodelIndex<'a> {
    config:       &'a ForgeConfig,
    declarations: &'a DeclarationIndex,
    external:     &'a dyn MetamodelProvider
}

impl<'a> MetamodelIndex<'a> {
    /// Lookup for one round.
    pub fn new(
        config: &'a ForgeConfig,
        declarations: &'a DeclarationIndex,
        external: &'a dyn MetamodelProvider
    ) -> Self {
        Self {
            config,
            declarations,
            external
        }
    }

    fn by_convention(&self, entity: &QualifiedName) -> Option<QualifiedName> {
        let name = render_template(&self.config.metamodel_naming(), entity.simple());
        let module = self.config.metamodel_module().unwrap_or(entity.module());
        let candidate = QualifiedName::join(module, &name);
        self.declarations.contains(&candidate).then_some(candidate)
    }
}

impl MetamodelProvider for MetamodelIndex<'_> {
    fn metamodel_of(&self, entity: &QualifiedName) -> Option<QualifiedName> {
        self.config
            .metamodel
            .registered
            .get(entity)
            .cloned()
            .or_else(|| self.external.metamodel_of(entity))
            .or_else(|| self.by_convention(entity))
    }
}
