// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use super::*;
use crate::{
    config::ForgeConfig,
    metamodel::NoMetamodels,
    pipeline,
    round::{Round, SourceFile}
};

fn outcome(files: &[(&str, &str, &str)]) -> RoundOutcome {
    let sources = files
        .iter()
        .map(|(path, module, text)| SourceFile::new(*path, *module, *text))
        .collect();
    pipeline::run(&Round::new(sources, ForgeConfig::default()), &NoMetamodels)
}

const TAG: &str = "#[repository] pub struct Tag { pub id: u32, pub name: String }";

#[test]
fn manifest_keys_are_slash_separated() {
    let target: PathBuf = ["repository", "tag_repository.rs"].iter().collect();
    assert_eq!(manifest_key(&target), "repository/tag_repository.rs");
}

#[test]
fn indexes_cover_every_directory() {
    let files = [
        "repository/tag_repository.rs".to_owned(),
        "service/admin/user_service.rs".to_owned()
    ];
    let indexes = module_indexes(files.iter());
    assert_eq!(
        indexes.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["mod.rs", "repository/mod.rs", "service/admin/mod.rs", "service/mod.rs"]
    );
    assert!(indexes["mod.rs"].contains("pub mod repository;\npub mod service;\n"));
    assert!(indexes["service/mod.rs"].ends_with("pub mod admin;\n"));
    assert!(indexes["service/admin/mod.rs"].starts_with(GENERATED_MARKER));
}

#[test]
fn commit_writes_files_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let report = commit(&outcome(&[("src/tag.rs", "crate::tag", TAG)]), dir.path()).unwrap();

    assert_eq!(
        report.written,
        vec![
            PathBuf::from("mod.rs"),
            PathBuf::from("repository/mod.rs"),
            PathBuf::from("repository/tag_repository.rs")
        ]
    );
    let text = fs::read_to_string(dir.path().join("repository/tag_repository.rs")).unwrap();
    assert!(text.starts_with(GENERATED_MARKER));

    let manifest = Manifest::load(dir.path()).unwrap();
    let entry = &manifest.files["repository/tag_repository.rs"];
    assert_eq!(entry.entity, "crate::tag::Tag");
    assert_eq!(entry.kind, "repository");
    assert_eq!(entry.hash, content_hash(&text));
    assert_eq!(manifest.indexes.len(), 2);
}

#[test]
fn second_commit_rewrites_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let round = outcome(&[("src/tag.rs", "crate::tag", TAG)]);
    commit(&round, dir.path()).unwrap();
    let manifest_before = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();

    let report = commit(&round, dir.path()).unwrap();
    assert!(report.is_noop(), "{report:?}");
    assert_eq!(report.unchanged, vec![PathBuf::from("repository/tag_repository.rs")]);
    assert_eq!(
        fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap(),
        manifest_before
    );
}

#[test]
fn hand_edited_file_is_restored() {
    let dir = tempfile::tempdir().unwrap();
    let round = outcome(&[("src/tag.rs", "crate::tag", TAG)]);
    commit(&round, dir.path()).unwrap();
    let path = dir.path().join("repository/tag_repository.rs");
    let original = fs::read_to_string(&path).unwrap();
    fs::write(&path, "// edited").unwrap();

    let report = commit(&round, dir.path()).unwrap();
    assert_eq!(report.written, vec![PathBuf::from("repository/tag_repository.rs")]);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn stale_files_are_removed() {
    let dir = tempfile::tempdir().unwrap();
    commit(
        &outcome(&[
            ("src/tag.rs", "crate::tag", TAG),
            ("src/genre.rs", "crate::genre", "#[service] pub struct Genre { pub id: u8 }")
        ]),
        dir.path()
    )
    .unwrap();
    assert!(dir.path().join("service/genre_service.rs").exists());

    let report = commit(&outcome(&[("src/tag.rs", "crate::tag", TAG)]), dir.path()).unwrap();
    assert_eq!(
        report.removed,
        vec![
            PathBuf::from("repository/genre_repository.rs"),
            PathBuf::from("service/genre_service.rs"),
            PathBuf::from("service/mod.rs")
        ]
    );
    assert!(!dir.path().join("service").exists());
    assert!(dir.path().join("repository/tag_repository.rs").exists());
    let root = fs::read_to_string(dir.path().join("mod.rs")).unwrap();
    assert!(!root.contains("pub mod service;"));
}

#[test]
fn failing_entity_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    commit(&outcome(&[("src/tag.rs", "crate::tag", TAG)]), dir.path()).unwrap();
    let path = dir.path().join("repository/tag_repository.rs");
    let before = fs::read_to_string(&path).unwrap();

    let broken = "#[repository] pub struct Tag { pub name: String }";
    let round = outcome(&[("src/tag.rs", "crate::tag", broken)]);
    assert!(round.has_errors());

    let report = commit(&round, dir.path()).unwrap();
    assert_eq!(report.retained, vec![PathBuf::from("repository/tag_repository.rs")]);
    assert!(report.removed.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert!(Manifest::load(dir.path()).unwrap().files.contains_key("repository/tag_repository.rs"));
}

#[test]
fn unparsable_file_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    commit(&outcome(&[("src/tag.rs", "crate::tag", TAG)]), dir.path()).unwrap();

    let round = outcome(&[("src/tag.rs", "crate::tag", "pub struct Tag {")]);
    let report = commit(&round, dir.path()).unwrap();
    assert_eq!(report.retained, vec![PathBuf::from("repository/tag_repository.rs")]);
    assert!(dir.path().join("repository/tag_repository.rs").exists());
}

#[test]
fn unparsable_file_keeps_inline_module_output() {
    let dir = tempfile::tempdir().unwrap();
    let shop = format!("pub mod inner {{ {TAG} }}");
    commit(&outcome(&[("src/shop.rs", "crate::shop", shop.as_str())]), dir.path()).unwrap();
    assert!(dir.path().join("repository/tag_repository.rs").exists());

    let broken = format!("{shop} pub struct Broken {{");
    let round = outcome(&[("src/shop.rs", "crate::shop", broken.as_str())]);
    let report = commit(&round, dir.path()).unwrap();
    assert!(report.removed.is_empty(), "{:?}", report.removed);
    assert_eq!(report.retained, vec![PathBuf::from("repository/tag_repository.rs")]);
    assert!(dir.path().join("repository/tag_repository.rs").exists());
    assert!(dir.path().join("repository/mod.rs").exists());
}

#[test]
fn retention_follows_module_ancestry() {
    let failed: BTreeSet<QualifiedName> = [QualifiedName::new("crate::shop")].into_iter().collect();
    assert!(is_retained("crate::shop::Tag", &failed));
    assert!(is_retained("crate::shop::inner::Tag", &failed));
    assert!(!is_retained("crate::shopping::Tag", &failed));
    assert!(!is_retained("crate::Tag", &failed));
}

#[test]
fn corrupt_manifest_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), "files: [1, 2").unwrap();
    let err = commit(&RoundOutcome::default(), dir.path()).unwrap_err();
    assert!(matches!(err, ForgeError::Manifest { .. }), "{err:?}");
}
