// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Built-in directive definitions.

use super::{AttrSpec, AttrType, Capability, DirectiveSpec, Target};

/// Filter kinds accepted by `#[filter]`.
const FILTER_KINDS: &[&str] = &["eq", "contains", "range"];

/// Relation kinds accepted by `#[relation]`.
const RELATION_KINDS: &[&str] = &["one_to_one", "many_to_one", "one_to_many", "many_to_many"];

fn directive(name: &str, target: Target) -> DirectiveSpec {
    DirectiveSpec {
        name:       name.to_owned(),
        targets:    vec![target],
        attributes: Vec::new(),
        grants:     Vec::new(),
        requires:   Vec::new(),
        conflicts:  Vec::new()
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

pub(super) fn directives() -> Vec<DirectiveSpec> {
    use AttrType::{Bool, Int, Scalar, Str};

    vec![
        DirectiveSpec {
            attributes: vec![AttrSpec::optional("module", Str)],
            grants: vec![Capability::Repository],
            ..directive("repository", Target::Struct)
        },
        DirectiveSpec {
            attributes: vec![AttrSpec::optional("module", Str)],
            grants: vec![Capability::Service],
            ..directive("service", Target::Struct)
        },
        DirectiveSpec {
            attributes: vec![
                AttrSpec::optional("path", Str),
                AttrSpec::optional("module", Str)
            ],
            grants: vec![Capability::Controller],
            ..directive("controller", Target::Struct)
        },
        DirectiveSpec {
            attributes: vec![AttrSpec::optional("path", Str)],
            grants: vec![Capability::GetOrCreate],
            ..directive("get_or_create", Target::Struct)
        },
        DirectiveSpec {
            attributes: vec![
                AttrSpec::required("prefix", Str),
                AttrSpec::optional("module", Str)
            ],
            grants: vec![Capability::ConfigBinding],
            ..directive("config_binding", Target::Struct)
        },
        DirectiveSpec {
            conflicts: names(&["transient", "relation"]),
            ..directive("id", Target::Field)
        },
        DirectiveSpec {
            conflicts: names(&["id", "filter", "relation"]),
            ..directive("transient", Target::Field)
        },
        DirectiveSpec {
            attributes: vec![AttrSpec::shorthand_enum("kind", FILTER_KINDS)],
            grants: vec![Capability::Queryable],
            conflicts: names(&["transient"]),
            ..directive("filter", Target::Field)
        },
        DirectiveSpec {
            attributes: vec![
                AttrSpec::optional("target", Str),
                AttrSpec::shorthand_enum("kind", RELATION_KINDS),
                AttrSpec::optional("mapped_by", Str)
            ],
            grants: vec![Capability::Relations],
            conflicts: names(&["transient", "id", "config_key"]),
            ..directive("relation", Target::Field)
        },
        DirectiveSpec {
            attributes: vec![
                AttrSpec::optional("path", Str),
                AttrSpec::optional("method", Str),
                AttrSpec::optional("read", Bool),
                AttrSpec::optional("add", Bool),
                AttrSpec::optional("remove", Bool)
            ],
            requires: names(&["relation"]),
            ..directive("endpoints", Target::Field)
        },
        DirectiveSpec {
            attributes: vec![
                AttrSpec::optional("min_length", Int),
                AttrSpec::optional("max_length", Int),
                AttrSpec::optional("min", Int),
                AttrSpec::optional("max", Int),
                AttrSpec::optional("not_blank", Bool)
            ],
            grants: vec![Capability::Validation],
            ..directive("validate", Target::Field)
        },
        DirectiveSpec {
            attributes: vec![
                AttrSpec::optional("name", Str),
                AttrSpec::optional("default", Scalar)
            ],
            conflicts: names(&["relation"]),
            ..directive("config_key", Target::Field)
        },
        DirectiveSpec {
            attributes: vec![AttrSpec::optional("path", Str)],
            ..directive("get_endpoint", Target::Method)
        }
    ]
}
