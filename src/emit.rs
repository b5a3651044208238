// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Template emitters.
//!
//! One [`Emitter`] per [`ArtifactKind`]. An emitter reads the entity model
//! and the round's plans through an [`EmitContext`] and produces a
//! [`SourceUnit`]; it never touches the filesystem.
//!
//! # Generated Items
//!
//! | Kind                | Items                                                        |
//! |---------------------|--------------------------------------------------------------|
//! | `repository`        | `impl Entity`, `impl HasName`, `{E}Repository`, `RELATIONS`  |
//! | `predicate_builder` | `{E}Filter`, `impl ToPredicate`                              |
//! | `service`           | `{E}Service<R, H>` with CRUD and endpoint operations         |
//! | `controller`        | `{E}Controller<R, H>` with handlers and `routes()`           |
//! | `config_binder`     | `{E}Binder::bind`                                            |
//!
//! Generated code names every foreign item by an absolute path
//! (`::entity_forge_core::...`, `crate::model::Book`), so files need no
//! `use` declarations and never shadow host names.
//!
//! Related entities are looked up through the model table by name and only
//! ever referenced by path, which keeps relation cycles harmless.

mod binder;
mod checks;
mod controller;
mod filter;
mod names;
mod repository;
mod service;
mod source;


use std::collections::BTreeMap;

pub use self::{
    binder::BinderEmitter,
    controller::ControllerEmitter,
    filter::FilterEmitter,
    repository::RepositoryEmitter,
    service::ServiceEmitter,
    source::{Fragment, FragmentKind, GENERATED_MARKER, SourceUnit}
};
use crate::{
    config::ForgeConfig,
    model::{EntityModel, ModelTable},
    naming::QualifiedName,
    plan::{ArtifactKind, ArtifactPlan, PlanSet}
};

/// Reason an artifact cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// Name cannot be a Rust identifier.
    #[error("`{name}` cannot be used as a Rust identifier")]
    InvalidIdentifier {
        /// Offending name.
        name: String
    },

    /// Text is not a Rust path.
    #[error("`{path}` is not a valid Rust path")]
    InvalidPath {
        /// Offending text.
        path: String
    },

    /// Text is not a Rust type.
    #[error("`{ty}` is not a valid Rust type")]
    InvalidType {
        /// Offending text.
        ty: String
    },

    /// Generated code would access something private.
    #[error("{what} of `{entity}` is not public, generated code cannot reach it")]
    NotVisible {
        /// Entity name.
        entity: String,
        /// What is private.
        what:   String
    },

    /// Artifact builds on another artifact that is not planned.
    #[error("{kind} of `{entity}` needs the {needs} artifact, which is not generated")]
    MissingArtifact {
        /// Entity name.
        entity: String,
        /// Artifact being emitted.
        kind:   ArtifactKind,
        /// Required artifact.
        needs:  ArtifactKind
    },

    /// Model shape the template cannot express.
    #[error("{0}")]
    Unsupported(String),

    /// Fragment tokens do not form an item.
    #[error("generated fragment `{name}` is malformed: {message}")]
    Fragment {
        /// Fragment name.
        name:    String,
        /// Parser message.
        message: String
    }
}

/// Read-only view of the round for emitters.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    table:  &'a ModelTable,
    plans:  &'a PlanSet,
    config: &'a ForgeConfig
}

impl<'a> EmitContext<'a> {
    /// Context over one round's model and plans.
    pub fn new(table: &'a ModelTable, plans: &'a PlanSet, config: &'a ForgeConfig) -> Self {
        Self {
            table,
            plans,
            config
        }
    }

    /// Entity table.
    #[must_use]
    pub fn table(&self) -> &'a ModelTable {
        self.table
    }

    /// Plans of the round.
    #[must_use]
    pub fn plans(&self) -> &'a PlanSet {
        self.plans
    }

    /// Round configuration.
    #[must_use]
    pub fn config(&self) -> &'a ForgeConfig {
        self.config
    }

    /// Check whether another artifact of an entity is generated.
    #[must_use]
    pub fn is_planned(&self, entity: &QualifiedName, kind: ArtifactKind) -> bool {
        self.plans.is_planned(entity, kind)
    }

    /// Plan of an artifact the current one builds on.
    pub fn requires(
        &self,
        entity: &EntityModel,
        kind: ArtifactKind,
        needs: ArtifactKind
    ) -> Result<&'a ArtifactPlan, EmitError> {
        self.plans
            .get(&entity.name, needs)
            .ok_or_else(|| EmitError::MissingArtifact {
                entity: entity.name.to_string(),
                kind,
                needs
            })
    }

    /// Related entity by name.
    pub fn related(&self, name: &QualifiedName) -> Result<&'a EntityModel, EmitError> {
        self.table
            .get(name)
            .ok_or_else(|| EmitError::Unsupported(format!("related entity `{name}` is not modeled")))
    }
}

/// Renders one artifact kind.
pub trait Emitter: Send + Sync {
    /// Kind this emitter renders.
    fn kind(&self) -> ArtifactKind;

    /// Build the source unit of one planned artifact.
    fn emit(
        &self,
        entity: &EntityModel,
        plan: &ArtifactPlan,
        ctx: &EmitContext<'_>
    ) -> Result<SourceUnit, EmitError>;
}

/// Emitters keyed by kind.
pub struct EmitterSet {
    emitters: BTreeMap<ArtifactKind, Box<dyn Emitter>>
}

impl EmitterSet {
    /// Empty set.
    pub fn new() -> Self {
        Self {
            emitters: BTreeMap::new()
        }
    }

    /// Built-in emitters for every kind.
    pub fn standard() -> Self {
        Self::new()
            .with(RepositoryEmitter)
            .with(FilterEmitter)
            .with(ServiceEmitter)
            .with(ControllerEmitter)
            .with(BinderEmitter)
    }

    /// Register an emitter, replacing the one of the same kind.
    #[must_use]
    pub fn with(mut self, emitter: impl Emitter + 'static) -> Self {
        self.emitters.insert(emitter.kind(), Box::new(emitter));
        self
    }

    /// Emitter of a kind.
    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> Option<&dyn Emitter> {
        self.emitters.get(&kind).map(Box::as_ref)
    }
}

impl Default for EmitterSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Emit and render one planned artifact.
pub fn render(
    emitters: &EmitterSet,
    entity: &EntityModel,
    plan: &ArtifactPlan,
    ctx: &EmitContext<'_>
) -> Result<String, EmitError> {
    let emitter = emitters.get(plan.kind).ok_or_else(|| {
        EmitError::Unsupported(format!("no emitter is registered for {}", plan.kind))
    })?;
    emitter.emit(entity, plan, ctx)?.render()
}
