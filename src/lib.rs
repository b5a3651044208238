// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! # entity-forge
//!
//! Build-time generator of repositories, filters, services, controllers and
//! configuration binders from annotated Rust structs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use entity_forge_core::Forge;
//!
//! #[derive(Forge, Clone, Default)]
//! #[controller(path = "/books")]
//! #[get_or_create]
//! pub struct Book {
//!     pub id: u64,
//!
//!     #[validate(not_blank = true, max_length = 120)]
//!     pub name: String,
//!
//!     #[filter(contains)]
//!     pub title: String,
//!
//!     #[relation(many_to_one)]
//!     #[filter]
//!     pub author: Option<Author>,
//! }
//! ```
//!
//! `entity-forge generate` writes `BookRepository`, `BookFilter`,
//! `BookService`, `BookController` and their module indexes below
//! `src/generated`.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │   scan   │──►│   model    │──►│   plan   │──►│   emit    │──►│  writer  │
//! │ syn AST  │   │ EntityModel│   │ Artifact │   │ SourceUnit│   │ tempfile │
//! │ snapshots│   │ ModelTable │   │ Plan     │   │ prettyplz │   │ manifest │
//! └──────────┘   └────────────┘   └──────────┘   └───────────┘   └──────────┘
//!       └──────────────┴────────────────┴──────────────┘
//!                         DiagnosticSink
//! ```
//!
//! | Module          | Role                                                  |
//! |-----------------|-------------------------------------------------------|
//! | [`round`]       | one generation round: sources, configuration, schema  |
//! | [`scan`]        | declaration scanner, directive candidates             |
//! | [`schema`]      | directive vocabulary and attribute values             |
//! | [`model`]       | semantic model builder, relation cycles               |
//! | [`metamodel`]   | query metamodel lookup                                |
//! | [`plan`]        | emission planner                                      |
//! | [`emit`]        | template emitters and the `SourceUnit` builder        |
//! | [`pipeline`]    | one in-memory round                                   |
//! | [`writer`]      | all-or-nothing commit with manifest                   |
//! | [`diagnostics`] | diagnostic model and sink                             |
//! | [`cli`]         | `generate` and `check` commands                       |
//!
//! A failing entity never aborts its siblings: its diagnostics are
//! reported, its previous output is kept, and every other entity is
//! generated as usual.

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod metamodel;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod plan;
pub mod round;
pub mod scan;
pub mod schema;
pub mod writer;

pub use self::{
    config::ForgeConfig,
    diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity},
    error::ForgeError,
    metamodel::{MetamodelProvider, NoMetamodels, StaticMetamodels},
    naming::QualifiedName,
    pipeline::{RenderedArtifact, RoundOutcome, run},
    round::{Round, SourceFile},
    writer::{CommitReport, commit}
};
