// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Declaration scanner.
//!
//! Parses every source file of a round in parallel, records all declared
//! types in a [`DeclarationIndex`] and returns the declarations carrying
//! recognized directives as [`CandidateElement`]s.
//!
//! # Recognized Positions
//!
//! | Position                          | Result                                 |
//! |-----------------------------------|----------------------------------------|
//! | struct (also inside inline `mod`) | candidate, [`Slot::Type`]              |
//! | named struct field                | candidate, [`Slot::Field`]             |
//! | method of an inherent `impl`      | candidate, [`Slot::Method`]            |
//! | enum, union, alias, tuple struct  | `schema_misuse` error                  |
//! | trait impl method, free function  | `schema_misuse` error                  |
//!
//! Directives are matched by their last path segment when written bare
//! (`#[filter]`) or prefixed with the runtime crate
//! (`#[entity_forge::filter]`); any other attribute is ignored.
//!
//! Candidates are sorted by `(owner, slot, directive)`, never by discovery
//! order.

mod declarations;
mod docs;
mod visitor;


use std::collections::BTreeMap;

use rayon::prelude::*;

pub use self::declarations::{
    DeclarationIndex, DeclaredField, DeclaredMethod, DeclaredType, ModuleScope
};
use crate::{
    diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Location},
    naming::QualifiedName,
    round::Round,
    schema::AttrValue
};

/// Position of a directive within its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// On the type itself.
    Type,
    /// On the n-th field.
    Field(usize),
    /// On the n-th inherent method.
    Method(usize)
}

/// One recognized directive on one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateElement {
    /// Position inside the owner.
    pub slot:      Slot,
    /// Directive name.
    pub directive: String,
    /// Raw arguments, checked against the schema by the model builder.
    pub arguments: BTreeMap<String, AttrValue>,
    /// Where the directive is written.
    pub location:  Location
}

impl CandidateElement {
    /// Owning type.
    #[must_use]
    pub fn owner(&self) -> &QualifiedName {
        self.location.owner()
    }

    fn sort_key(&self) -> (&QualifiedName, Slot, &str, &Location) {
        (self.owner(), self.slot, &self.directive, &self.location)
    }
}

/// Scanner result.
#[derive(Debug, Default)]
pub struct ScanOutput {
    /// Every type declared in the round.
    pub declarations: DeclarationIndex,
    /// Directive occurrences, sorted.
    pub candidates:   Vec<CandidateElement>
}

impl ScanOutput {
    /// Owners carrying at least one directive, sorted.
    #[must_use]
    pub fn owners(&self) -> Vec<&QualifiedName> {
        let mut owners: Vec<_> = self.candidates.iter().map(CandidateElement::owner).collect();
        owners.dedup();
        owners
    }

    /// Candidates of one owner, in slot order.
    pub fn candidates_of<'a>(
        &'a self,
        owner: &'a QualifiedName
    ) -> impl Iterator<Item = &'a CandidateElement> + 'a {
        self.candidates.iter().filter(move |c| c.owner() == owner)
    }
}

/// Scan all sources of a round.
#[tracing::instrument(skip_all, fields(files = round.sources().len()))]
pub fn scan(round: &Round, sink: &DiagnosticSink) -> ScanOutput {
    let files: Vec<_> = round
        .sources()
        .par_iter()
        .map(|file| visitor::scan_file(file, round.schema(), sink))
        .collect();

    let mut output = ScanOutput::default();
    let mut impls = Vec::new();

    for file in files {
        for (module, scope) in file.scopes {
            output.declarations.add_scope(&module, scope);
        }
        for declared in file.types {
            if let Err(duplicate) = output.declarations.insert(declared) {
                sink.report(Diagnostic::error(
                    DiagnosticCode::DuplicateName,
                    duplicate.location.clone(),
                    format!("`{}` is declared more than once", duplicate.name)
                ));
            }
        }
        output.candidates.extend(file.candidates);
        impls.extend(file.impls);
    }

    for block in impls {
        let resolved = output.declarations.resolve(&block.module, &block.target);
        let Some(declared) = resolved
            .as_ref()
            .and_then(|owner| output.declarations.get_mut(owner))
        else {
            for (method, directives) in block.methods {
                for pending in directives {
                    sink.report(Diagnostic::error(
                        DiagnosticCode::SchemaMisuse,
                        pending.location,
                        format!(
                            "`#[{}]` is on method `{}` of `{}`, which is not declared in this crate",
                            pending.directive, method.name, block.target
                        )
                    ));
                }
            }
            continue;
        };

        declared.implements_default |= block.default_impl;
        for (mut method, directives) in block.methods {
            let slot = Slot::Method(declared.methods.len());
            method.location.decl.owner = declared.name.clone();
            for pending in directives {
                let mut location = pending.location;
                location.decl.owner = declared.name.clone();
                output.candidates.push(CandidateElement {
                    slot,
                    directive: pending.directive,
                    arguments: pending.arguments,
                    location
                });
            }
            declared.methods.push(method);
        }
    }

    output.candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    tracing::debug!(
        types = output.declarations.len(),
        candidates = output.candidates.len(),
        "scan finished"
    );
    output
}
