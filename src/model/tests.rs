// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use super::*;
use crate::{
    config::ForgeConfig,
    diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity},
    round::{Round, SourceFile},
    scan::scan
};

fn model(text: &str) -> (ModelTable, Vec<Diagnostic>) {
    let round = Round::new(
        vec![SourceFile::new("src/model.rs", "crate::model", text)],
        ForgeConfig::default()
    );
    let sink = DiagnosticSink::new();
    let scanned = scan(&round, &sink);
    let table = build(&scanned, round.schema(), &sink);
    (table, sink.into_sorted())
}

fn entity<'a>(table: &'a ModelTable, name: &str) -> &'a EntityModel {
    table
        .get(&QualifiedName::new(format!("crate::model::{name}")))
        .unwrap()
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn builds_fields_and_capabilities() {
    let (table, diagnostics) = model(
        r#"
        #[repository]
        #[controller(path = "library/books")]
        pub struct Book {
            pub id: u64,
            #[filter(contains)]
            #[validate(not_blank, max_length = 200)]
            pub name: String,
            #[filter(range)]
            pub pages: Option<u32>,
            #[transient]
            pub cached: bool,
        }
        "#
    );
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let book = entity(&table, "Book");
    assert_eq!(book.origin, Origin::Annotated);
    assert!(book.has(Capability::Repository));
    assert!(book.has(Capability::Controller));
    assert!(book.has(Capability::Queryable));
    assert!(book.has(Capability::HasName));
    assert!(book.has(Capability::Validation));
    assert_eq!(book.controller_path.as_deref(), Some("/library/books"));
    assert_eq!(book.id_field().unwrap().name, "id");

    let name = book.field("name").unwrap();
    assert_eq!(name.filter, Some(FilterKind::Contains));
    assert_eq!(
        name.constraints,
        vec![Constraint::MaxLength(200), Constraint::NotBlank]
    );
    assert!(book.field("pages").unwrap().nullable());
    assert!(book.field("cached").unwrap().transient);
    assert_eq!(book.persistent_fields().count(), 3);
}

#[test]
fn relations_resolve_by_qualified_name() {
    let (table, diagnostics) = model(
        r#"
        pub struct Author { pub id: u64, pub name: String }

        #[repository]
        pub struct Book {
            pub id: u64,
            #[relation]
            pub author: Author,
            #[relation(many_to_many, target = "Author")]
            pub editor_ids: Vec<u64>,
        }
        "#
    );
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let book = entity(&table, "Book");
    let author = book.field("author").unwrap().relation.as_ref().unwrap();
    assert_eq!(author.target.as_str(), "crate::model::Author");
    assert_eq!(author.kind, RelationKind::ManyToOne);
    assert_eq!(author.storage, RelationStorage::Embedded);

    let editors = book.field("editor_ids").unwrap().relation.as_ref().unwrap();
    assert_eq!(editors.kind, RelationKind::ManyToMany);
    assert_eq!(editors.storage, RelationStorage::Identifier);

    let referenced = entity(&table, "Author");
    assert_eq!(referenced.origin, Origin::Referenced);
    assert!(referenced.has(Capability::HasName));
    assert!(referenced.id_field().is_some());
}

#[test]
fn unresolved_relation_is_one_error_on_the_field() {
    let (table, diagnostics) = model(
        r#"
        #[repository]
        pub struct Book {
            pub id: u64,
            #[relation]
            #[filter]
            pub publisher: Publisher,
        }

        #[repository]
        pub struct Shelf { pub id: u64 }
        "#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::UnresolvedReference]);
    assert_eq!(
        diagnostics[0].location.decl.member.as_deref(),
        Some("publisher")
    );
    assert!(table.is_failed(&QualifiedName::new("crate::model::Book")));
    let valid: Vec<_> = table.valid().map(|e| e.simple_name()).collect();
    assert_eq!(valid, vec!["Shelf"]);
}

#[test]
fn exclusive_directives_conflict() {
    let (_, diagnostics) = model(
        r#"
        #[repository]
        pub struct Book {
            #[id]
            #[transient]
            pub id: u64,
        }
        "#
    );
    assert!(codes(&diagnostics).contains(&DiagnosticCode::ConflictingConstraints));
}

#[test]
fn endpoints_require_relation() {
    let (_, diagnostics) = model(
        r#"
        #[service]
        pub struct Book {
            pub id: u64,
            #[endpoints]
            pub tags: Vec<String>,
        }
        "#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::SchemaMisuse]);
}

#[test]
fn inconsistent_constraints() {
    let (_, diagnostics) = model(
        r#"
        #[repository]
        pub struct Book {
            pub id: u64,
            #[validate(min_length = 10, max_length = 5)]
            pub title: String,
            #[validate(min_length = 1)]
            pub pages: u32,
            #[filter(contains)]
            pub year: i32,
        }
        "#
    );
    assert_eq!(
        codes(&diagnostics),
        vec![DiagnosticCode::ConflictingConstraints; 3]
    );
}

#[test]
fn missing_id_for_persistence() {
    let (table, diagnostics) = model(
        r#"
        #[repository]
        pub struct Note { pub text: String }

        #[config_binding(prefix = "app")]
        pub struct Settings { pub port: u16 }
        "#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::MissingId]);
    assert!(table.is_failed(&QualifiedName::new("crate::model::Note")));
    assert!(!table.is_failed(&QualifiedName::new("crate::model::Settings")));
}

#[test]
fn get_or_create_without_name_is_dropped() {
    let (table, diagnostics) = model(
        r#"
        #[get_or_create]
        pub struct Tag { pub id: u64, pub label: String }
        "#
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    let tag = entity(&table, "Tag");
    assert!(!tag.has(Capability::GetOrCreate));
    assert!(!table.is_failed(&tag.name));
}

#[test]
fn remove_without_mapped_by_is_dropped() {
    let (table, diagnostics) = model(
        r#"
        pub struct Review { pub id: u64, pub book: u64 }

        #[service]
        pub struct Book {
            pub id: u64,
            #[relation]
            #[endpoints(add, remove)]
            pub reviews: Vec<Review>,
        }
        "#
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    let book = entity(&table, "Book");
    let endpoints = book.field("reviews").unwrap().relation.as_ref().unwrap().endpoints.as_ref().unwrap();
    assert!(endpoints.read && endpoints.add && !endpoints.remove);
    assert_eq!(endpoints.path, "/reviews");
}

#[test]
fn relation_cycles_are_detected_not_fatal() {
    let (table, diagnostics) = model(
        r#"
        #[repository]
        pub struct Author {
            pub id: u64,
            #[relation]
            pub books: Vec<Book>,
        }

        #[repository]
        pub struct Book {
            pub id: u64,
            #[relation]
            pub author: Option<Author>,
        }
        "#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RelationCycle]);
    assert_eq!(diagnostics[0].severity, Severity::Info);
    assert_eq!(table.cycles().len(), 1);
    assert!(table.in_cycle(&QualifiedName::new("crate::model::Book")));
    assert_eq!(table.valid().count(), 2);
}

#[test]
fn duplicate_config_keys_and_paths() {
    let (_, diagnostics) = model(
        r#"
        #[config_binding(prefix = "mail")]
        pub struct Mail {
            #[config_key(name = "host")]
            pub primary: String,
            #[config_key(name = "host")]
            pub fallback: String,
        }
        "#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DuplicateName]);
}

#[test]
fn method_endpoints() {
    let (table, diagnostics) = model(
        r#"
        #[controller]
        pub struct Book { pub id: u64, pub title: String }

        impl Book {
            #[get_endpoint]
            pub fn word_count(&self) -> usize { 0 }

            #[get_endpoint(path = "/x")]
            pub fn rename(&mut self, title: String) {}
        }
        "#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::SchemaMisuse]);
    let book = entity(&table, "Book");
    assert_eq!(book.endpoints.len(), 1);
    assert_eq!(book.endpoints[0].path, "/word-count");
    assert_eq!(book.endpoints[0].returns, "usize");
}

#[test]
fn invalid_attribute_values() {
    let (_, diagnostics) = model(
        r#"
        #[repository(module = "not a module")]
        pub struct Book {
            pub id: u64,
            #[validate(min_length = "three")]
            pub title: String,
        }
        "#
    );
    assert_eq!(
        codes(&diagnostics),
        vec![DiagnosticCode::InvalidAttribute; 2]
    );
}

#[test]
fn generic_entities_are_misuse() {
    let (table, diagnostics) = model(
        r#"
        #[repository]
        pub struct Boxed<T> { pub id: u64, pub inner: T }

        #[repository]
        pub struct Borrowed<'a> { pub id: u64, pub name: &'a str }

        pub struct Wrapper<T> { pub id: T }

        #[repository]
        pub struct Holder {
            pub id: u64,
            #[relation]
            pub wrapper: Option<Wrapper<u64>>,
        }
        "#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::SchemaMisuse; 3]);
    for name in ["Boxed", "Borrowed", "Holder"] {
        assert!(table.is_failed(&QualifiedName::new(format!("crate::model::{name}"))));
    }
}

#[test]
fn generated_filter_fields_must_not_clash() {
    let (table, diagnostics) = model(
        r#"
        pub struct Author { pub id: u64 }

        #[repository]
        pub struct Shelf {
            pub id: u64,
            #[filter(range)]
            pub year: i32,
            #[filter]
            pub year_from: i32,
            #[relation]
            #[filter]
            pub author: Option<Author>,
            #[filter]
            pub authors: u32,
        }
        "#
    );
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DuplicateName; 2]);
    assert!(table.is_failed(&QualifiedName::new("crate::model::Shelf")));
}

#[test]
fn operations_must_not_clash_with_generated_ones() {
    let (_, diagnostics) = model(
        r#"
        pub struct Tag { pub id: u64 }

        #[service]
        pub struct Crate {
            pub id: u64,
            #[relation(kind = many_to_many)]
            #[endpoints(add = true)]
            pub tags: Vec<Tag>,
        }

        impl Crate {
            #[get_endpoint(path = "/size")]
            pub fn count(&self) -> u32 { 0 }

            #[get_endpoint(path = "/latest")]
            pub fn add_tags(&self) -> u32 { 0 }
        }

        #[controller]
        pub struct Route { pub id: u64 }

        impl Route {
            #[get_endpoint]
            pub fn routes(&self) -> u32 { 0 }
        }
        "#
    );
    let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DuplicateName; 3], "{messages:?}");
    assert!(messages.iter().any(|m| m.contains("`count`")));
    assert!(messages.iter().any(|m| m.contains("`add_tags`")));
    assert!(messages.iter().any(|m| m.contains("`routes`")));
}

#[test]
fn values_outside_the_runtime_contract() {
    let (table, diagnostics) = model(
        r#"
        pub struct Key(u64);
        pub struct Owner { pub id: Key }

        #[repository]
        pub struct Ledger {
            pub id: u64,
            #[filter]
            pub total: i128,
        }

        #[repository]
        pub struct Pet {
            pub id: u64,
            #[relation]
            #[filter]
            pub owner: Option<Owner>,
        }

        #[config_binding(prefix = "limits")]
        pub struct Limits {
            pub ceiling: u128,
            #[config_key(default = 4)]
            pub workers: isize,
        }
        "#
    );
    assert_eq!(
        codes(&diagnostics),
        vec![DiagnosticCode::ConflictingConstraints; 3]
    );
    for name in ["Ledger", "Pet", "Limits"] {
        assert!(table.is_failed(&QualifiedName::new(format!("crate::model::{name}"))));
    }
}
