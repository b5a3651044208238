// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::path::Path;

use super::*;
use crate::{
    diagnostics::Diagnostic,
    metamodel::{NoMetamodels, StaticMetamodels},
    model,
    round::{Round, SourceFile},
    scan::scan
};

fn planned(
    files: &[(&str, &str, &str)],
    config: ForgeConfig,
    metamodels: &dyn MetamodelProvider
) -> (PlanSet, Vec<Diagnostic>) {
    let sources = files
        .iter()
        .map(|(path, module, text)| SourceFile::new(*path, *module, *text))
        .collect();
    let round = Round::new(sources, config);
    let sink = DiagnosticSink::new();
    let scanned = scan(&round, &sink);
    let table = model::build(&scanned, round.schema(), &sink);
    let plans = plan(&table, round.config(), metamodels, &sink);
    (plans, sink.into_sorted())
}

const BOOK: &str = r#"
    #[controller]
    #[config_binding(prefix = "book")]
    pub struct Book {
        pub id: u64,
        #[filter(contains)]
        pub title: String,
    }
"#;

#[test]
fn kind_names() {
    assert_eq!(ArtifactKind::parse("filter"), Some(ArtifactKind::PredicateBuilder));
    assert_eq!(ArtifactKind::parse("config_binder"), Some(ArtifactKind::ConfigBinder));
    assert_eq!(ArtifactKind::parse("dto"), None);
    assert_eq!(ArtifactKind::PredicateBuilder.to_string(), "predicate_builder");
}

#[test]
fn artifact_ids_depend_only_on_entity_and_kind() {
    let book = QualifiedName::new("crate::model::Book");
    let a = ArtifactId::of(&book, ArtifactKind::Repository);
    assert_eq!(a, ArtifactId::of(&book, ArtifactKind::Repository));
    assert_ne!(a, ArtifactId::of(&book, ArtifactKind::Service));
    assert_eq!(a.as_str().len(), 16);
    assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn plans_all_applicable_kinds_sorted() {
    let metamodels = StaticMetamodels::new().with("crate::model::Book", "crate::model::QBook");
    let (plans, diagnostics) = planned(
        &[("src/model.rs", "crate::model", BOOK)],
        ForgeConfig::default(),
        &metamodels
    );
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let kinds: Vec<_> = plans.plans().iter().map(|p| p.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec!["config_binder", "controller", "predicate_builder", "repository", "service"]
    );

    let repository = plans
        .get(&QualifiedName::new("crate::model::Book"), ArtifactKind::Repository)
        .unwrap();
    assert_eq!(repository.type_name, "BookRepository");
    assert_eq!(repository.target, Path::new("repository/book_repository.rs"));
    assert_eq!(
        repository.type_path(),
        "crate::generated::repository::book_repository::BookRepository"
    );

    let filter = plans
        .get(&QualifiedName::new("crate::model::Book"), ArtifactKind::PredicateBuilder)
        .unwrap();
    assert_eq!(filter.metamodel.as_ref().unwrap().as_str(), "crate::model::QBook");
    assert_eq!(filter.target, Path::new("filter/book_filter.rs"));
}

#[test]
fn missing_metamodel_skips_predicate_builder() {
    let (plans, diagnostics) = planned(
        &[("src/model.rs", "crate::model", BOOK)],
        ForgeConfig::default(),
        &NoMetamodels
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::MissingMetamodel);
    assert!(!diagnostics[0].is_error());
    assert!(!plans.is_planned(
        &QualifiedName::new("crate::model::Book"),
        ArtifactKind::PredicateBuilder
    ));
    assert_eq!(plans.len(), 4);
}

#[test]
fn disabled_kind_is_never_planned() {
    let mut config = ForgeConfig::default();
    config.controller.enabled = Some(false);
    let (plans, _) = planned(&[("src/model.rs", "crate::model", BOOK)], config, &NoMetamodels);
    assert!(plans.plans().iter().all(|p| p.kind != ArtifactKind::Controller));
    assert!(plans.plans().iter().any(|p| p.kind == ArtifactKind::Service));
}

#[test]
fn entity_module_override() {
    let (plans, _) = planned(
        &[(
            "src/lib.rs",
            "crate",
            r#"#[repository(module = "admin::accounts")] pub struct User { pub id: u64 }"#
        )],
        ForgeConfig::default(),
        &NoMetamodels
    );
    let plan = &plans.plans()[0];
    assert_eq!(plan.target, Path::new("repository/admin/accounts/user_repository.rs"));
    assert_eq!(
        plan.module_path,
        "crate::generated::repository::admin::accounts::user_repository"
    );
}

#[test]
fn colliding_targets_are_all_rejected() {
    let (plans, diagnostics) = planned(
        &[
            ("src/a.rs", "crate::a", "#[repository] pub struct Item { pub id: u64 }"),
            ("src/b.rs", "crate::b", "#[repository] pub struct Item { pub id: u64 }"),
            ("src/c.rs", "crate::c", "#[repository] pub struct Other { pub id: u64 }")
        ],
        ForgeConfig::default(),
        &NoMetamodels
    );
    let collisions: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::GenerationCollision)
        .map(|d| d.location.owner().as_str())
        .collect();
    assert_eq!(collisions, vec!["crate::a::Item", "crate::b::Item"]);
    let entities: Vec<_> = plans.plans().iter().map(|p| p.entity.as_str()).collect();
    assert_eq!(entities, vec!["crate::c::Other"]);
}

#[test]
fn configured_applicability() {
    let mut config = ForgeConfig::default();
    config.controller.requires_any = Some(vec![Capability::Repository]);
    let (plans, _) = planned(
        &[("src/lib.rs", "crate", "#[repository] pub struct Tag { pub id: u64 }")],
        config,
        &NoMetamodels
    );
    assert!(plans.is_planned(&QualifiedName::new("crate::Tag"), ArtifactKind::Controller));
}
