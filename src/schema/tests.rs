// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use super::*;

fn args(pairs: &[(&str, AttrValue)]) -> BTreeMap<String, AttrValue> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

#[test]
fn standard_contains_vocabulary() {
    let schema = MetadataSchema::standard();
    for name in [
        "repository",
        "service",
        "controller",
        "get_or_create",
        "config_binding",
        "id",
        "transient",
        "filter",
        "relation",
        "endpoints",
        "validate",
        "config_key",
        "get_endpoint"
    ] {
        assert!(schema.directive(name).is_some(), "missing {name}");
    }
}

#[test]
fn targets_are_enforced() {
    let schema = MetadataSchema::standard();
    let filter = schema.directive("filter").unwrap();
    assert!(filter.accepts(DeclKind::Field));
    assert!(!filter.accepts(DeclKind::Struct));
    let repository = schema.directive("repository").unwrap();
    assert!(!repository.accepts(DeclKind::Enum));
    assert!(!repository.accepts(DeclKind::TupleStruct));
}

#[test]
fn shorthand_enum_word() {
    let schema = MetadataSchema::standard();
    let filter = schema.directive("filter").unwrap();
    let checked = filter
        .check(&args(&[("contains", AttrValue::Bool(true))]))
        .unwrap();
    assert_eq!(checked["kind"], AttrValue::EnumRef("contains".into()));
}

#[test]
fn shorthand_and_explicit_conflict() {
    let schema = MetadataSchema::standard();
    let filter = schema.directive("filter").unwrap();
    let problems = filter
        .check(&args(&[
            ("contains", AttrValue::Bool(true)),
            ("kind", AttrValue::Str("eq".into()))
        ]))
        .unwrap_err();
    assert_eq!(problems.len(), 1);
}

#[test]
fn unknown_enum_value() {
    let schema = MetadataSchema::standard();
    let relation = schema.directive("relation").unwrap();
    let problems = relation
        .check(&args(&[("kind", AttrValue::EnumRef("sideways".into()))]))
        .unwrap_err();
    assert!(problems[0].contains("one of one_to_one"));
}

#[test]
fn type_mismatch_and_missing_required() {
    let schema = MetadataSchema::standard();
    let binding = schema.directive("config_binding").unwrap();
    let problems = binding
        .check(&args(&[("module", AttrValue::Int(3))]))
        .unwrap_err();
    assert_eq!(problems.len(), 2);
    assert!(problems.iter().any(|p| p.contains("requires `prefix`")));
}

#[test]
fn unknown_attribute_lists_known() {
    let schema = MetadataSchema::standard();
    let problems = schema
        .directive("controller")
        .unwrap()
        .check(&args(&[("paht", AttrValue::Str("/x".into()))]))
        .unwrap_err();
    assert_eq!(
        problems[0],
        "unknown attribute `paht` for `#[controller]` (expected path, module)"
    );
}

#[test]
fn flag_directive_rejects_attributes() {
    let schema = MetadataSchema::standard();
    let problems = schema
        .directive("id")
        .unwrap()
        .check(&args(&[("auto", AttrValue::Bool(true))]))
        .unwrap_err();
    assert_eq!(problems[0], "`#[id]` takes no attributes, found `auto`");
}

#[test]
fn paths_are_accepted_as_strings() {
    let schema = MetadataSchema::standard();
    let checked = schema
        .directive("relation")
        .unwrap()
        .check(&args(&[("target", AttrValue::EnumRef("crate::Author".into()))]))
        .unwrap();
    assert_eq!(checked["target"], AttrValue::Str("crate::Author".into()));
}

#[test]
fn conflicts_are_symmetric() {
    let schema = MetadataSchema::standard();
    assert!(schema.conflicts("filter", "transient"));
    assert!(schema.conflicts("transient", "filter"));
    assert!(!schema.conflicts("filter", "validate"));
}

#[test]
fn extension_replaces_by_name() {
    let custom = DirectiveSpec {
        name:       "crud".to_owned(),
        targets:    vec![Target::Struct],
        attributes: Vec::new(),
        grants:     vec![Capability::Repository, Capability::Controller],
        requires:   Vec::new(),
        conflicts:  Vec::new()
    };
    let schema = MetadataSchema::standard().extended([custom]);
    assert_eq!(schema.directive("crud").unwrap().grants.len(), 2);
    assert!(schema.directive("repository").is_some());
}

#[test]
fn directive_spec_from_yaml() {
    let spec: DirectiveSpec = serde_yaml::from_str(
        "name: searchable\ntargets: [struct]\ngrants: [repository]\nattributes:\n  - name: mode\n    type:\n      enum: [fast, slow]\n    shorthand: true\n"
    )
    .unwrap();
    assert_eq!(spec.attributes[0].ty, AttrType::Enum(vec!["fast".into(), "slow".into()]));
    assert!(spec.attributes[0].shorthand);
}

#[test]
fn attribute_types_read_as_words_and_maps() {
    let attributes: Vec<AttrSpec> = serde_yaml::from_str(
        "- name: limit\n  type: int\n  required: true\n- name: order\n  type: {enum: [asc, desc]}\n"
    )
    .unwrap();
    assert_eq!(attributes[0].ty, AttrType::Int);
    assert!(attributes[0].required);
    assert_eq!(attributes[1].ty, AttrType::Enum(vec!["asc".into(), "desc".into()]));

    let written = serde_yaml::to_string(&attributes[1]).unwrap();
    assert!(written.contains("enum:"), "{written}");
}

#[test]
fn positional_value_sets_shorthand_attribute() {
    let schema = MetadataSchema::standard();
    let checked = schema
        .directive("filter")
        .unwrap()
        .check(&args(&[("value", AttrValue::Str("contains".into()))]))
        .unwrap();
    assert_eq!(checked["kind"], AttrValue::EnumRef("contains".into()));

    let checked = schema
        .directive("get_endpoint")
        .unwrap()
        .check(&args(&[("value", AttrValue::Str("/summary".into()))]))
        .unwrap();
    assert_eq!(checked["path"], AttrValue::Str("/summary".into()));
}
