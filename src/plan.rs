// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Emission planning.
//!
//! Decides which artifacts each valid entity gets and where they go.
//!
//! # Artifact Kinds
//!
//! | Kind                | Module       | Type name           | Applicable when any of                          |
//! |---------------------|--------------|---------------------|-------------------------------------------------|
//! | `repository`        | `repository` | `{name}Repository`  | repository, service, controller, get_or_create  |
//! | `predicate_builder` | `filter`     | `{name}Filter`      | queryable, plus a metamodel exists              |
//! | `service`           | `service`    | `{name}Service`     | service, controller, get_or_create              |
//! | `controller`        | `controller` | `{name}Controller`  | controller                                      |
//! | `config_binder`     | `config`     | `{name}Binder`      | config_binding                                  |
//!
//! Modules, names and applicability are configurable per kind; a disabled
//! kind is never planned.
//!
//! # Targets
//!
//! ```text
//! {kind module}/{entity module override}/{snake(type name)}.rs
//!
//! repository/book_repository.rs        crate::generated::repository::book_repository
//! controller/admin/user_controller.rs  crate::generated::controller::admin::user_controller
//! ```
//!
//! Each plan carries an [`ArtifactId`] derived only from the entity name and
//! the kind, never from processing order. Plans sharing a target are all
//! rejected with a `generation_collision` error.

#[cfg(test)]
mod tests;

use std::{
    collections::BTreeMap,
    fmt,
    path::PathBuf
};

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    config::ForgeConfig,
    diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink},
    metamodel::MetamodelProvider,
    model::{EntityModel, ModelTable, Origin},
    naming::{QualifiedName, file_stem, render_template},
    schema::Capability
};

/// Kind of generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Repository contract and entity trait impls.
    Repository,
    /// Filter struct composing predicates.
    PredicateBuilder,
    /// Business service.
    Service,
    /// Web controller.
    Controller,
    /// Configuration binder.
    ConfigBinder
}

impl ArtifactKind {
    /// Every kind, in planning order.
    pub const ALL: [Self; 5] = [
        Self::Repository,
        Self::PredicateBuilder,
        Self::Service,
        Self::Controller,
        Self::ConfigBinder
    ];

    /// Stable snake-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::PredicateBuilder => "predicate_builder",
            Self::Service => "service",
            Self::Controller => "controller",
            Self::ConfigBinder => "config_binder"
        }
    }

    /// Parse a kind name; `filter` is accepted for the predicate builder.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "filter" => Some(Self::PredicateBuilder),
            _ => Self::ALL.into_iter().find(|k| k.as_str() == name)
        }
    }

    /// Default module below the output root.
    pub const fn default_module(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::PredicateBuilder => "filter",
            Self::Service => "service",
            Self::Controller => "controller",
            Self::ConfigBinder => "config"
        }
    }

    /// Default naming template.
    pub const fn default_naming(&self) -> &'static str {
        match self {
            Self::Repository => "{name}Repository",
            Self::PredicateBuilder => "{name}Filter",
            Self::Service => "{name}Service",
            Self::Controller => "{name}Controller",
            Self::ConfigBinder => "{name}Binder"
        }
    }

    /// Default applicability: the entity needs any of these.
    pub const fn default_requires(&self) -> &'static [Capability] {
        match self {
            Self::Repository => &[
                Capability::Repository,
                Capability::Service,
                Capability::Controller,
                Capability::GetOrCreate
            ],
            Self::PredicateBuilder => &[Capability::Queryable],
            Self::Service => &[
                Capability::Service,
                Capability::Controller,
                Capability::GetOrCreate
            ],
            Self::Controller => &[Capability::Controller],
            Self::ConfigBinder => &[Capability::ConfigBinding]
        }
    }

    /// Capability whose directive may override the module.
    pub const fn module_capability(&self) -> Capability {
        match self {
            Self::Repository => Capability::Repository,
            Self::PredicateBuilder => Capability::Queryable,
            Self::Service => Capability::Service,
            Self::Controller => Capability::Controller,
            Self::ConfigBinder => Capability::ConfigBinding
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-addressed artifact identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// First 16 hex digits of SHA-256 over `entity \0 kind`.
    pub fn of(entity: &QualifiedName, kind: ArtifactKind) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(entity.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(kind.as_str().as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..16].to_owned())
    }

    /// Hex text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One artifact to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPlan {
    /// Stable identity.
    pub id:          ArtifactId,
    /// Entity the artifact belongs to.
    pub entity:      QualifiedName,
    /// Artifact kind.
    pub kind:        ArtifactKind,
    /// Generated type name.
    pub type_name:   String,
    /// Rust module segments below the generated root.
    pub modules:     Vec<String>,
    /// Rust path of the generated module.
    pub module_path: String,
    /// File path relative to the output directory.
    pub target:      PathBuf,
    /// Query metamodel, for predicate builders.
    pub metamodel:   Option<QualifiedName>
}

impl ArtifactPlan {
    /// Rust path of the generated type.
    #[must_use]
    pub fn type_path(&self) -> String {
        format!("{}::{}", self.module_path, self.type_name)
    }

    /// Sort key: entity, then kind name.
    fn key(&self) -> (&QualifiedName, &'static str) {
        (&self.entity, self.kind.as_str())
    }
}

/// All plans of a round.
#[derive(Debug, Clone, Default)]
pub struct PlanSet {
    plans: Vec<ArtifactPlan>
}

impl PlanSet {
    /// Plans sorted by entity and kind name.
    #[must_use]
    pub fn plans(&self) -> &[ArtifactPlan] {
        &self.plans
    }

    /// Plan of one entity and kind.
    #[must_use]
    pub fn get(&self, entity: &QualifiedName, kind: ArtifactKind) -> Option<&ArtifactPlan> {
        self.plans
            .iter()
            .find(|p| &p.entity == entity && p.kind == kind)
    }

    /// Check whether an artifact is planned.
    #[must_use]
    pub fn is_planned(&self, entity: &QualifiedName, kind: ArtifactKind) -> bool {
        self.get(entity, kind).is_some()
    }

    /// Number of plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Check for no plans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Plan artifacts for every valid annotated entity.
#[tracing::instrument(skip_all, fields(entities = table.len()))]
pub fn plan(
    table: &ModelTable,
    config: &ForgeConfig,
    metamodels: &dyn MetamodelProvider,
    sink: &DiagnosticSink
) -> PlanSet {
    let mut plans = Vec::new();

    for entity in table.valid().filter(|e| e.origin == Origin::Annotated) {
        for kind in ArtifactKind::ALL {
            if !config.is_enabled(kind) {
                tracing::debug!(entity = %entity.name, %kind, "kind disabled");
                continue;
            }
            let applicable = config.requires_any(kind).iter().any(|c| entity.has(*c));
            if !applicable {
                continue;
            }

            let metamodel = if kind == ArtifactKind::PredicateBuilder {
                let Some(found) = metamodels.metamodel_of(&entity.name) else {
                    sink.report(Diagnostic::warning(
                        DiagnosticCode::MissingMetamodel,
                        entity.location.clone(),
                        format!(
                            "no query metamodel for `{}`; predicate builder skipped",
                            entity.simple_name()
                        )
                    ));
                    continue;
                };
                Some(found)
            } else {
                None
            };

            plans.push(plan_one(entity, kind, config, metamodel));
        }
    }

    let plans = reject_collisions(plans, table, sink);
    tracing::debug!(plans = plans.len(), "planning finished");
    PlanSet { plans }
}

fn plan_one(
    entity: &EntityModel,
    kind: ArtifactKind,
    config: &ForgeConfig,
    metamodel: Option<QualifiedName>
) -> ArtifactPlan {
    let type_name = render_template(&config.naming(kind), entity.simple_name());

    let mut modules = module_segments(&config.module(kind));
    if let Some(extra) = entity.modules.get(&kind.module_capability()) {
        modules.extend(module_segments(extra));
    }
    let stem = file_stem(&type_name);

    let mut target: PathBuf = modules.iter().collect();
    target.push(format!("{stem}.rs"));

    let mut module_path = vec![config.crate_path()];
    module_path.extend(modules.iter().cloned());
    module_path.push(stem.clone());
    modules.push(stem);

    ArtifactPlan {
        id: ArtifactId::of(&entity.name, kind),
        entity: entity.name.clone(),
        kind,
        type_name,
        modules,
        module_path: module_path.join("::"),
        target,
        metamodel
    }
}

/// Split `a::b` or `a/b` into snake-case segments.
fn module_segments(module: &str) -> Vec<String> {
    module
        .split(['/', ':'])
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_case(Case::Snake))
        .collect()
}

fn reject_collisions(
    plans: Vec<ArtifactPlan>,
    table: &ModelTable,
    sink: &DiagnosticSink
) -> Vec<ArtifactPlan> {
    let mut by_target: BTreeMap<PathBuf, Vec<ArtifactPlan>> = BTreeMap::new();
    for plan in plans {
        by_target.entry(plan.target.clone()).or_default().push(plan);
    }

    let mut kept = Vec::new();
    for (target, group) in by_target {
        if group.len() == 1 {
            kept.extend(group);
            continue;
        }
        for plan in &group {
            let others = group
                .iter()
                .filter(|other| other.id != plan.id)
                .map(|other| format!("`{}` ({})", other.entity.simple(), other.kind))
                .collect::<Vec<_>>()
                .join(", ");
            if let Some(entity) = table.get(&plan.entity) {
                sink.report(Diagnostic::error(
                    DiagnosticCode::GenerationCollision,
                    entity.location.clone(),
                    format!(
                        "{} target `{}` is also planned for {}; none of them is written",
                        plan.kind,
                        target.display(),
                        others
                    )
                ));
            }
        }
    }

    kept.sort_by(|a, b| a.key().cmp(&b.key()));
    kept
}
