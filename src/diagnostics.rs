// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Diagnostic collection and reporting.
//!
//! Every stage of a round appends to one [`DiagnosticSink`]. Appends may come
//! from several threads at once (scanning and validation run on rayon), so
//! the sink is internally synchronized and append-only. Reporting is always
//! sorted by [`Location`], which makes the emitted diagnostic list identical
//! across runs regardless of scheduling.
//!
//! # Categories
//!
//! | Category            | Codes                                                        |
//! |---------------------|--------------------------------------------------------------|
//! | schema misuse       | `parse`, `schema_misuse`, `invalid_attribute`                |
//! | semantic            | `unresolved_reference`, `duplicate_name`, `conflicting_constraints`, `missing_id`, `relation_cycle` |
//! | planning conflict   | `missing_metamodel`, `generation_collision`                  |
//! | emission            | `emission`                                                   |
//!
//! An error diagnostic attached to an entity (or one of its members)
//! excludes that entity from emission and commit; warnings and infos never
//! block anything.

use std::{
    collections::BTreeSet,
    fmt,
    path::PathBuf,
    sync::{Mutex, PoisonError}
};

use crate::naming::QualifiedName;

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Blocks emission for the affected entity and fails the round.
    Error,
    /// Reported, never blocking.
    Warning,
    /// Informational.
    Info
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info"
        })
    }
}

/// Broad failure class of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Directive used in a way the metadata schema forbids.
    SchemaMisuse,
    /// Inconsistent model.
    Semantic,
    /// Planning could not produce a unique target.
    PlanningConflict,
    /// An emitter could not render a valid model.
    Emission
}

/// Stable diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticCode {
    /// Source file could not be parsed.
    Parse,
    /// Directive placed on a declaration kind it does not accept.
    SchemaMisuse,
    /// Malformed, unknown, missing or mistyped directive attribute.
    InvalidAttribute,
    /// Relation target is not declared in the round.
    UnresolvedReference,
    /// Duplicate field, entity, config key or endpoint path.
    DuplicateName,
    /// Mutually exclusive directives or inconsistent constraints.
    ConflictingConstraints,
    /// Persistence directives without a usable primary key.
    MissingId,
    /// Relations form a cycle.
    RelationCycle,
    /// No query metamodel for a filterable entity.
    MissingMetamodel,
    /// Two artifacts would be written to the same target.
    GenerationCollision,
    /// Emitter failure.
    Emission
}

impl DiagnosticCode {
    /// Snake-case code name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::SchemaMisuse => "schema_misuse",
            Self::InvalidAttribute => "invalid_attribute",
            Self::UnresolvedReference => "unresolved_reference",
            Self::DuplicateName => "duplicate_name",
            Self::ConflictingConstraints => "conflicting_constraints",
            Self::MissingId => "missing_id",
            Self::RelationCycle => "relation_cycle",
            Self::MissingMetamodel => "missing_metamodel",
            Self::GenerationCollision => "generation_collision",
            Self::Emission => "emission"
        }
    }

    /// Category of this code.
    pub const fn category(&self) -> Category {
        match self {
            Self::Parse | Self::SchemaMisuse | Self::InvalidAttribute => Category::SchemaMisuse,
            Self::UnresolvedReference
            | Self::DuplicateName
            | Self::ConflictingConstraints
            | Self::MissingId
            | Self::RelationCycle => Category::Semantic,
            Self::MissingMetamodel | Self::GenerationCollision => Category::PlanningConflict,
            Self::Emission => Category::Emission
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of declaration a location points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclKind {
    /// Whole source file.
    File,
    /// Struct with named fields.
    Struct,
    /// Tuple struct.
    TupleStruct,
    /// Unit struct.
    UnitStruct,
    /// Enum.
    Enum,
    /// Union.
    Union,
    /// Type alias.
    Alias,
    /// Named field.
    Field,
    /// Inherent method.
    Method
}

impl DeclKind {
    /// Human readable kind.
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Struct => "struct",
            Self::TupleStruct => "tuple struct",
            Self::UnitStruct => "unit struct",
            Self::Enum => "enum",
            Self::Union => "union",
            Self::Alias => "type alias",
            Self::Field => "field",
            Self::Method => "method"
        }
    }

    /// Check whether this is a type-level declaration.
    pub const fn is_type(&self) -> bool {
        !matches!(self, Self::File | Self::Field | Self::Method)
    }
}

/// Reference to a declaration: an owner type and an optional member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclRef {
    /// Owning type (or module, for file-level locations).
    pub owner:  QualifiedName,
    /// Field or method name.
    pub member: Option<String>,
    /// Declaration kind of the referenced item.
    pub kind:   DeclKind
}

impl DeclRef {
    /// Type-level reference.
    pub fn ty(owner: QualifiedName, kind: DeclKind) -> Self {
        Self {
            owner,
            member: None,
            kind
        }
    }

    /// Member-level reference.
    pub fn member(owner: QualifiedName, member: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            owner,
            member: Some(member.into()),
            kind
        }
    }
}

impl fmt::Display for DeclRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}::{}", self.owner, member),
            None => write!(f, "{}", self.owner)
        }
    }
}

/// Where a diagnostic originates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    /// Declaration.
    pub decl:   DeclRef,
    /// Source file.
    pub file:   PathBuf,
    /// 1-based line.
    pub line:   usize,
    /// 1-based column.
    pub column: usize
}

impl Location {
    /// Location with position.
    pub fn new(decl: DeclRef, file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            decl,
            file: file.into(),
            line,
            column
        }
    }

    /// Location of a span inside a parsed file.
    pub fn at_span(decl: DeclRef, file: impl Into<PathBuf>, span: proc_macro2::Span) -> Self {
        let start = span.start();
        Self::new(decl, file, start.line, start.column + 1)
    }

    /// Owning entity of the location.
    #[must_use]
    pub fn owner(&self) -> &QualifiedName {
        &self.decl.owner
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Diagnostic {
    /// Origin; primary sort key.
    pub location: Location,
    /// Severity.
    pub severity: Severity,
    /// Stable code.
    pub code:     DiagnosticCode,
    /// Message.
    pub message:  String
}

impl Diagnostic {
    /// Diagnostic of any severity.
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        location: Location,
        message: impl Into<String>
    ) -> Self {
        Self {
            location,
            severity,
            code,
            message: message.into()
        }
    }

    /// Error diagnostic.
    pub fn error(code: DiagnosticCode, location: Location, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, location, message)
    }

    /// Warning diagnostic.
    pub fn warning(code: DiagnosticCode, location: Location, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, location, message)
    }

    /// Info diagnostic.
    pub fn info(code: DiagnosticCode, location: Location, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, location, message)
    }

    /// Check for error severity.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {}:{}:{}: {}: {}",
            self.severity,
            self.code,
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.location.decl,
            self.message
        )
    }
}

/// Append-only, thread-safe diagnostic collector of one round.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Mutex<Vec<Diagnostic>>
}

impl DiagnosticSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one diagnostic.
    pub fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "diagnostic reported");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    /// Append many diagnostics.
    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.extend(diagnostics);
    }

    /// Check whether any error was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(Diagnostic::is_error)
    }

    /// Entities (owners) with at least one error.
    #[must_use]
    pub fn failed_owners(&self) -> BTreeSet<QualifiedName> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.location.owner().clone())
            .collect()
    }

    /// Sorted copy of everything reported so far.
    #[must_use]
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        entries.sort();
        entries
    }

    /// Consume the sink into its sorted diagnostics.
    #[must_use]
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut entries = self
            .entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        entries.sort();
        entries
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn at(owner: &str, line: usize) -> Location {
        Location::new(
            DeclRef::ty(QualifiedName::new(owner), DeclKind::Struct),
            "src/lib.rs",
            line,
            1
        )
    }

    #[test]
    fn sorted_by_location_first() {
        let sink = DiagnosticSink::new();
        sink.report(Diagnostic::warning(DiagnosticCode::MissingMetamodel, at("crate::B", 1), "b"));
        sink.report(Diagnostic::error(DiagnosticCode::MissingId, at("crate::A", 9), "a"));
        let sorted = sink.into_sorted();
        assert_eq!(sorted[0].location.owner().as_str(), "crate::A");
        assert_eq!(sorted[1].location.owner().as_str(), "crate::B");
    }

    #[test]
    fn concurrent_appends_are_kept() {
        let sink = DiagnosticSink::new();
        thread::scope(|scope| {
            for i in 0..8 {
                let sink = &sink;
                scope.spawn(move || {
                    sink.report(Diagnostic::info(
                        DiagnosticCode::RelationCycle,
                        at("crate::A", i),
                        "cycle"
                    ));
                });
            }
        });
        let sorted = sink.into_sorted();
        assert_eq!(sorted.len(), 8);
        assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn failed_owners_ignore_warnings() {
        let sink = DiagnosticSink::new();
        sink.report(Diagnostic::warning(DiagnosticCode::MissingMetamodel, at("crate::B", 1), "b"));
        sink.report(Diagnostic::error(DiagnosticCode::MissingId, at("crate::A", 1), "a"));
        let failed = sink.failed_owners();
        assert_eq!(failed.len(), 1);
        assert!(failed.contains(&QualifiedName::new("crate::A")));
        assert!(sink.has_errors());
    }

    #[test]
    fn display_format() {
        let d = Diagnostic::error(DiagnosticCode::DuplicateName, at("crate::A", 3), "dup");
        assert_eq!(d.to_string(), "error[duplicate_name]: src/lib.rs:3:1: crate::A: dup");
    }

    #[test]
    fn codes_have_categories() {
        assert_eq!(DiagnosticCode::Parse.category(), Category::SchemaMisuse);
        assert_eq!(DiagnosticCode::RelationCycle.category(), Category::Semantic);
        assert_eq!(
            DiagnosticCode::GenerationCollision.category(),
            Category::PlanningConflict
        );
        assert_eq!(DiagnosticCode::Emission.category(), Category::Emission);
    }
}
