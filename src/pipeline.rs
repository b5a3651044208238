// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! One generation round, start to finish, in memory.
//!
//! ```text
//! Round ─► scan ─► model::build ─► plan ─► emit ─► RoundOutcome
//!            │           │            │       │
//!            └───────────┴────────────┴───────┴──► DiagnosticSink
//! ```
//!
//! [`run`] is pure: it reads the round, never the filesystem, and returns
//! everything the writer needs. Artifacts of an entity with any error
//! diagnostic are dropped from the outcome; siblings are unaffected.

use std::collections::BTreeSet;

use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::{
    diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink},
    emit::{self, EmitContext, EmitterSet},
    metamodel::{MetamodelIndex, MetamodelProvider},
    model::{self, Origin},
    naming::QualifiedName,
    plan::{self, ArtifactKind, ArtifactPlan},
    round::Round,
    scan::scan
};

/// Rendered file of one planned artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Plan the file was rendered from.
    pub plan: ArtifactPlan,
    /// File content.
    pub text: String,
    /// Lowercase hex SHA-256 of `text`.
    pub hash: String
}

impl RenderedArtifact {
    /// Wrap rendered text, hashing it.
    pub fn new(plan: ArtifactPlan, text: String) -> Self {
        let hash = content_hash(&text);
        Self {
            plan,
            text,
            hash
        }
    }
}

/// Result of one round.
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    /// Artifacts of entities without errors, sorted by entity and kind.
    pub artifacts:   Vec<RenderedArtifact>,
    /// Every diagnostic, sorted.
    pub diagnostics: Vec<Diagnostic>,
    /// Declarations with error diagnostics.
    pub failed:      BTreeSet<QualifiedName>,
    /// Annotated entities of the round, failed or not.
    pub modeled:     BTreeSet<QualifiedName>
}

impl RoundOutcome {
    /// Check for error diagnostics.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Rendered artifact of one entity and kind.
    #[must_use]
    pub fn artifact(&self, entity: &QualifiedName, kind: ArtifactKind) -> Option<&RenderedArtifact> {
        self.artifacts
            .iter()
            .find(|a| &a.plan.entity == entity && a.plan.kind == kind)
    }

    /// Number of diagnostics of a code.
    #[must_use]
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }
}

/// Run a round with the built-in emitters.
pub fn run(round: &Round, metamodels: &dyn MetamodelProvider) -> RoundOutcome {
    run_with(round, metamodels, &EmitterSet::standard())
}

/// Run a round with a custom emitter set.
#[tracing::instrument(skip_all, fields(sources = round.sources().len()))]
pub fn run_with(round: &Round, metamodels: &dyn MetamodelProvider, emitters: &EmitterSet) -> RoundOutcome {
    let sink = DiagnosticSink::new();

    let scanned = scan(round, &sink);
    let table = model::build(&scanned, round.schema(), &sink);
    let index = MetamodelIndex::new(round.config(), &scanned.declarations, metamodels);
    let plans = plan::plan(&table, round.config(), &index, &sink);

    let ctx = EmitContext::new(&table, &plans, round.config());
    let rendered: Vec<RenderedArtifact> = plans
        .plans()
        .par_iter()
        .filter_map(|plan| {
            let entity = table.get(&plan.entity)?;
            match emit::render(emitters, entity, plan, &ctx) {
                Ok(text) => Some(RenderedArtifact::new(plan.clone(), text)),
                Err(err) => {
                    tracing::debug!(entity = %plan.entity, kind = %plan.kind, %err, "emission failed");
                    sink.report(Diagnostic::error(
                        DiagnosticCode::Emission,
                        entity.location.clone(),
                        format!("cannot generate {} of `{}`: {err}", plan.kind, entity.simple_name())
                    ));
                    None
                }
            }
        })
        .collect();

    let failed = sink.failed_owners();
    let artifacts: Vec<_> = rendered
        .into_iter()
        .filter(|a| !failed.contains(&a.plan.entity))
        .collect();
    let modeled = table
        .entities()
        .filter(|e| e.origin == Origin::Annotated)
        .map(|e| e.name.clone())
        .collect();

    tracing::info!(
        artifacts = artifacts.len(),
        failed = failed.len(),
        "round rendered"
    );

    RoundOutcome {
        artifacts,
        diagnostics: sink.into_sorted(),
        failed,
        modeled
    }
}

/// Lowercase hex SHA-256.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
