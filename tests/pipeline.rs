// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! End-to-end rounds: sources in, committed tree out.

use std::{fs, path::Path};

use entity_forge::{
    DiagnosticCode, ForgeConfig, NoMetamodels, QualifiedName, Round, RoundOutcome, Severity,
    SourceFile, StaticMetamodels, commit,
    metamodel::MetamodelProvider,
    pipeline,
    plan::ArtifactKind,
    writer::{MANIFEST_FILE, Manifest}
};

fn round(files: &[(&str, &str, &str)], config: ForgeConfig) -> Round {
    let sources = files
        .iter()
        .map(|(path, module, text)| SourceFile::new(*path, *module, *text))
        .collect();
    Round::new(sources, config)
}

fn run(files: &[(&str, &str, &str)], metamodels: &dyn MetamodelProvider) -> RoundOutcome {
    pipeline::run(&round(files, ForgeConfig::default()), metamodels)
}

fn name(path: &str) -> QualifiedName {
    QualifiedName::new(path)
}

fn snapshot(dir: &Path) -> Vec<(String, String)> {
    let mut files: Vec<_> = walk(dir)
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path).unwrap();
            (path.strip_prefix(dir).unwrap().display().to_string(), text)
        })
        .collect();
    files.sort();
    files
}

fn walk(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}

const MODEL: &str = r#"
    #[derive(Clone, Default)]
    #[controller]
    #[get_or_create]
    pub struct Book {
        pub id: u64,
        #[validate(not_blank = true)]
        pub name: String,
        #[filter(contains)]
        pub title: String,
        #[relation(many_to_one)]
        #[filter]
        pub author: Option<Author>,
        #[relation(many_to_many)]
        #[endpoints(add = true, remove = true)]
        pub tags: Vec<Tag>,
    }

    #[derive(Clone)]
    #[repository]
    pub struct Author {
        pub id: u64,
        pub name: String,
        #[relation(one_to_many, mapped_by = "author")]
        pub books: Vec<Book>,
    }

    #[derive(Clone)]
    pub struct Tag {
        pub id: String,
    }

    pub struct QBook;
"#;

const SETTINGS: &str = r#"
    #[config_binding(prefix = "app")]
    pub struct Settings {
        pub host: String,
        #[config_key(default = 8080)]
        pub port: u16,
    }
"#;

fn sources() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("src/model.rs", "crate::model", MODEL),
        ("src/settings.rs", "crate::settings", SETTINGS)
    ]
}

#[test]
fn full_round_generates_every_kind() {
    let outcome = run(&sources(), &NoMetamodels);
    assert!(!outcome.has_errors(), "{:?}", outcome.diagnostics);

    let kinds: Vec<_> = outcome
        .artifacts
        .iter()
        .map(|a| format!("{} {}", a.plan.entity, a.plan.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            "crate::model::Author repository",
            "crate::model::Book controller",
            "crate::model::Book predicate_builder",
            "crate::model::Book repository",
            "crate::model::Book service",
            "crate::settings::Settings config_binder"
        ]
    );
}

#[test]
fn rounds_are_deterministic() {
    let first = run(&sources(), &NoMetamodels);
    let mut reversed = sources();
    reversed.reverse();
    let second = run(&reversed, &NoMetamodels);

    assert_eq!(first.artifacts, second.artifacts);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.failed, second.failed);
}

#[test]
fn commits_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = run(&sources(), &NoMetamodels);

    let first = commit(&outcome, dir.path()).unwrap();
    assert!(!first.written.is_empty());
    let before = snapshot(dir.path());

    let second = commit(&outcome, dir.path()).unwrap();
    assert!(second.is_noop(), "{second:?}");
    assert_eq!(snapshot(dir.path()), before);

    let again = commit(&run(&sources(), &NoMetamodels), dir.path()).unwrap();
    assert!(again.is_noop());
}

#[test]
fn failing_entity_does_not_affect_siblings() {
    let broken = r#"
        #[repository]
        pub struct Broken {
            #[validate(min_length = 5, max_length = 2)]
            pub id: String,
        }
    "#;
    let mut files = sources();
    files.push(("src/broken.rs", "crate::broken", broken));
    let outcome = run(&files, &NoMetamodels);

    assert!(outcome.has_errors());
    assert_eq!(
        outcome.failed.iter().map(QualifiedName::as_str).collect::<Vec<_>>(),
        vec!["crate::broken::Broken"]
    );
    assert!(
        outcome
            .artifacts
            .iter()
            .all(|a| a.plan.entity != name("crate::broken::Broken"))
    );
    assert_eq!(outcome.artifacts, run(&sources(), &NoMetamodels).artifacts);
}

#[test]
fn relation_cycles_terminate_and_generate() {
    let outcome = run(&sources(), &NoMetamodels);
    assert_eq!(outcome.count(DiagnosticCode::RelationCycle), 1);

    let cycle = outcome
        .diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::RelationCycle)
        .unwrap();
    assert_eq!(cycle.severity, Severity::Info);
    assert!(cycle.message.contains("Author") && cycle.message.contains("Book"));

    let author = outcome
        .artifact(&name("crate::model::Author"), ArtifactKind::Repository)
        .unwrap();
    assert!(author.text.contains("\"crate::model::Book\""));
    let book = outcome
        .artifact(&name("crate::model::Book"), ArtifactKind::Repository)
        .unwrap();
    assert!(book.text.contains("\"crate::model::Author\""));
}

#[test]
fn struct_without_directives_yields_nothing() {
    let outcome = run(
        &[("src/lib.rs", "crate", "pub struct Plain { pub id: u64, pub label: String }")],
        &NoMetamodels
    );
    assert!(outcome.artifacts.is_empty());
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
}

#[test]
fn unresolved_relation_is_one_error_on_the_field() {
    let catalog = r#"
        pub struct Catalog {
            pub id: u64,
            #[relation(many_to_one, target = "crate::missing::Publisher")]
            #[filter]
            pub publisher: Option<u64>,
        }
    "#;
    let metamodels = StaticMetamodels::new().with("crate::catalog::Catalog", "crate::catalog::QCatalog");
    let mut files = sources();
    files.push(("src/catalog.rs", "crate::catalog", catalog));
    let outcome = run(&files, &metamodels);

    let errors: Vec<_> = outcome.diagnostics.iter().filter(|d| d.is_error()).collect();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].code, DiagnosticCode::UnresolvedReference);
    assert_eq!(errors[0].location.decl.owner, name("crate::catalog::Catalog"));
    assert_eq!(errors[0].location.decl.member.as_deref(), Some("publisher"));

    assert!(
        outcome
            .artifact(&name("crate::catalog::Catalog"), ArtifactKind::PredicateBuilder)
            .is_none()
    );
    assert!(
        outcome
            .artifact(&name("crate::model::Book"), ArtifactKind::PredicateBuilder)
            .is_some()
    );
}

#[test]
fn colliding_targets_are_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = run(
        &[
            ("src/a.rs", "crate::a", "#[repository] pub struct Item { pub id: u64 }"),
            ("src/b.rs", "crate::b", "#[repository] pub struct Item { pub id: u64 }"),
            ("src/c.rs", "crate::c", "#[repository] pub struct Other { pub id: u64 }")
        ],
        &NoMetamodels
    );

    assert_eq!(outcome.count(DiagnosticCode::GenerationCollision), 2);
    assert!(
        outcome
            .artifact(&name("crate::a::Item"), ArtifactKind::Repository)
            .is_none()
    );
    assert!(
        outcome
            .artifact(&name("crate::b::Item"), ArtifactKind::Repository)
            .is_none()
    );

    commit(&outcome, dir.path()).unwrap();
    assert!(!dir.path().join("repository/item_repository.rs").exists());
    assert!(dir.path().join("repository/other_repository.rs").exists());
}

#[test]
fn disabled_kind_is_never_planned() {
    let config = ForgeConfig::from_yaml("filter:\n  enabled: false\n", Path::new("entity-forge.yml")).unwrap();
    let outcome = pipeline::run(&round(&sources(), config), &NoMetamodels);

    assert!(!outcome.has_errors(), "{:?}", outcome.diagnostics);
    assert!(
        outcome
            .artifacts
            .iter()
            .all(|a| a.plan.kind != ArtifactKind::PredicateBuilder)
    );
    assert_eq!(outcome.count(DiagnosticCode::MissingMetamodel), 0);

    let repository = outcome
        .artifact(&name("crate::model::Book"), ArtifactKind::Repository)
        .unwrap();
    assert!(!repository.text.contains("PredicateExecutor"));
    let service = outcome
        .artifact(&name("crate::model::Book"), ArtifactKind::Service)
        .unwrap();
    assert!(!service.text.contains("find_matching"));
}

#[test]
fn removed_entities_lose_their_files() {
    let dir = tempfile::tempdir().unwrap();
    commit(&run(&sources(), &NoMetamodels), dir.path()).unwrap();
    assert!(dir.path().join("config_binder/settings_binder.rs").exists());

    let report = commit(
        &run(&[("src/model.rs", "crate::model", MODEL)], &NoMetamodels),
        dir.path()
    )
    .unwrap();
    assert!(!dir.path().join("config_binder").exists());
    assert!(
        report
            .removed
            .iter()
            .any(|p| p.ends_with("settings_binder.rs"))
    );

    let manifest = Manifest::load(dir.path()).unwrap();
    assert!(manifest.files.values().all(|e| e.entity != "crate::settings::Settings"));
}

#[test]
fn failing_entity_keeps_previous_files() {
    let dir = tempfile::tempdir().unwrap();
    commit(&run(&sources(), &NoMetamodels), dir.path()).unwrap();
    let path = dir.path().join("config_binder/settings_binder.rs");
    let before = fs::read_to_string(&path).unwrap();

    let broken = SETTINGS.replace("default = 8080", "default = \"eighty\"");
    let outcome = run(
        &[("src/model.rs", "crate::model", MODEL), ("src/settings.rs", "crate::settings", broken.as_str())],
        &NoMetamodels
    );
    assert!(outcome.failed.contains(&name("crate::settings::Settings")));

    let report = commit(&outcome, dir.path()).unwrap();
    assert!(report.removed.is_empty(), "{report:?}");
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert!(dir.path().join(MANIFEST_FILE).exists());
}
