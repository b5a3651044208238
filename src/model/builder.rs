// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Model builder passes.

use std::collections::{BTreeMap, BTreeSet};

use convert_case::{Case, Casing};
use rayon::prelude::*;

use super::{
    ConfigKey, Constraint, Endpoints, EntityModel, FieldModel, FilterKind, MethodEndpoint,
    ModelTable, Origin, Relation, RelationKind, RelationStorage, TypeDescriptor, TypeKind,
    cycles::{Graph, find_cycles}
};
use crate::{
    diagnostics::{DeclKind, Diagnostic, DiagnosticCode, DiagnosticSink, Location},
    naming::{QualifiedName, normalize_path, pluralize},
    scan::{DeclarationIndex, DeclaredField, DeclaredType, ScanOutput, Slot},
    schema::{AttrValue, Capability, MetadataSchema}
};

/// Capabilities that need a primary key.
const PERSISTENT: &[Capability] = &[
    Capability::Repository,
    Capability::Service,
    Capability::Controller,
    Capability::GetOrCreate
];

/// Members every generated service defines.
const SERVICE_MEMBERS: &[&str] = &[
    "new",
    "with_hooks",
    "repository",
    "validate",
    "find_by_id",
    "find_all",
    "count",
    "create",
    "update",
    "delete",
    "find_matching",
    "count_matching",
    "get_or_create"
];

/// Members a generated controller adds on top of the service operations.
const CONTROLLER_MEMBERS: &[&str] = &["service", "routes", "get_by_id"];

/// Capabilities that produce a service.
const SERVICED: &[Capability] = &[
    Capability::Service,
    Capability::Controller,
    Capability::GetOrCreate
];

/// Directive whose attributes passed the schema check.
#[derive(Debug)]
struct Checked {
    slot:      Slot,
    directive: String,
    args:      BTreeMap<String, AttrValue>,
    grants:    Vec<Capability>,
    location:  Location
}

impl Checked {
    fn text(&self, key: &str) -> Option<String> {
        self.args.get(key).and_then(AttrValue::as_text).map(str::to_owned)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.args.get(key).and_then(AttrValue::as_bool)
    }
}

/// First pass result: a struct with its checked directives.
struct Skeleton<'a> {
    declared:     &'a DeclaredType,
    directives:   Vec<Checked>,
    capabilities: BTreeSet<Capability>
}

impl Skeleton<'_> {
    fn at(&self, slot: Slot) -> impl Iterator<Item = &Checked> {
        self.directives.iter().filter(move |d| d.slot == slot)
    }

    fn find(&self, slot: Slot, directive: &str) -> Option<&Checked> {
        self.at(slot).find(|d| d.directive == directive)
    }
}

/// Build the model table of a round.
#[tracing::instrument(skip_all, fields(candidates = scan.candidates.len()))]
pub fn build(scan: &ScanOutput, schema: &MetadataSchema, sink: &DiagnosticSink) -> ModelTable {
    let skeletons = skeletons(scan, schema, sink);

    let mut entities: BTreeMap<QualifiedName, EntityModel> = skeletons
        .iter()
        .map(|skeleton| {
            let entity = resolve(skeleton, &scan.declarations, sink);
            (entity.name.clone(), entity)
        })
        .collect();
    expand_referenced(&mut entities, &scan.declarations);

    entities
        .par_iter()
        .filter(|(_, entity)| entity.origin == Origin::Annotated)
        .for_each(|(_, entity)| validate(entity, &entities, &scan.declarations, sink));

    let graph: Graph = entities
        .values()
        .map(|entity| (entity.name.clone(), entity.related()))
        .collect();
    let cycles = find_cycles(&graph);
    for cycle in &cycles {
        if let Some(first) = cycle.first().and_then(|name| entities.get(name)) {
            let members = cycle
                .iter()
                .map(|n| format!("`{}`", n.simple()))
                .collect::<Vec<_>>()
                .join(", ");
            sink.report(Diagnostic::info(
                DiagnosticCode::RelationCycle,
                first.location.clone(),
                format!("relation cycle between {members}; generated code refers to them by path")
            ));
        }
    }

    let failed: BTreeSet<QualifiedName> = sink
        .failed_owners()
        .into_iter()
        .filter(|owner| entities.contains_key(owner))
        .collect();

    tracing::debug!(
        entities = entities.len(),
        failed = failed.len(),
        cycles = cycles.len(),
        "model built"
    );
    ModelTable {
        entities,
        failed,
        cycles
    }
}

/// Pass 1: attribute checks, schema combinations and capabilities.
fn skeletons<'a>(
    scan: &'a ScanOutput,
    schema: &MetadataSchema,
    sink: &DiagnosticSink
) -> Vec<Skeleton<'a>> {
    let mut out = Vec::new();

    for owner in scan.owners() {
        let Some(declared) = scan.declarations.get(owner) else {
            continue;
        };
        if declared.kind != DeclKind::Struct {
            continue;
        }

        let mut seen = BTreeSet::new();
        let mut directives = Vec::new();
        for candidate in scan.candidates_of(owner) {
            let Some(spec) = schema.directive(&candidate.directive) else {
                continue;
            };
            if !seen.insert((candidate.slot, candidate.directive.clone())) {
                sink.report(Diagnostic::error(
                    DiagnosticCode::InvalidAttribute,
                    candidate.location.clone(),
                    format!("`#[{}]` is repeated", candidate.directive)
                ));
                continue;
            }
            match spec.check(&candidate.arguments) {
                Ok(args) => directives.push(Checked {
                    slot: candidate.slot,
                    directive: candidate.directive.clone(),
                    args,
                    grants: spec.grants.clone(),
                    location: candidate.location.clone()
                }),
                Err(problems) => {
                    for problem in problems {
                        sink.report(Diagnostic::error(
                            DiagnosticCode::InvalidAttribute,
                            candidate.location.clone(),
                            format!("`#[{}]`: {}", candidate.directive, problem)
                        ));
                    }
                }
            }
        }

        if declared.generic && !directives.is_empty() {
            sink.report(Diagnostic::error(
                DiagnosticCode::SchemaMisuse,
                declared.location.clone(),
                format!(
                    "`{}` has generic parameters; directives need a struct without type, lifetime or const parameters",
                    declared.name.simple()
                )
            ));
        }

        check_combinations(&directives, schema, sink);
        let capabilities = directives
            .iter()
            .flat_map(|d| d.grants.iter().copied())
            .collect();
        out.push(Skeleton {
            declared,
            directives,
            capabilities
        });
    }
    out
}

fn check_combinations(directives: &[Checked], schema: &MetadataSchema, sink: &DiagnosticSink) {
    for (i, later) in directives.iter().enumerate() {
        for earlier in directives[..i].iter().filter(|d| d.slot == later.slot) {
            if schema.conflicts(&earlier.directive, &later.directive) {
                sink.report(Diagnostic::error(
                    DiagnosticCode::ConflictingConstraints,
                    later.location.clone(),
                    format!(
                        "`#[{}]` cannot be combined with `#[{}]`",
                        later.directive, earlier.directive
                    )
                ));
            }
        }

        let Some(spec) = schema.directive(&later.directive) else {
            continue;
        };
        for required in &spec.requires {
            let present = directives
                .iter()
                .any(|d| d.slot == later.slot && &d.directive == required);
            if !present {
                sink.report(Diagnostic::error(
                    DiagnosticCode::SchemaMisuse,
                    later.location.clone(),
                    format!(
                        "`#[{}]` requires `#[{}]` on the same declaration",
                        later.directive, required
                    )
                ));
            }
        }
    }
}

/// Pass 2: fields, relation targets and method endpoints.
fn resolve(skeleton: &Skeleton<'_>, index: &DeclarationIndex, sink: &DiagnosticSink) -> EntityModel {
    let declared = skeleton.declared;
    let module = declared.name.module();
    let mut capabilities = skeleton.capabilities.clone();
    let mut modules = BTreeMap::new();
    let mut controller_path = None;
    let mut get_or_create_path = None;
    let mut config_prefix = None;

    for directive in skeleton.at(Slot::Type) {
        if let Some(target) = directive.text("module") {
            if valid_module(&target) {
                for grant in &directive.grants {
                    modules.insert(*grant, target.clone());
                }
            } else {
                sink.report(Diagnostic::error(
                    DiagnosticCode::InvalidAttribute,
                    directive.location.clone(),
                    format!("`module` must be a Rust module path like `admin::books`, found `{target}`")
                ));
            }
        }
        for grant in &directive.grants {
            match grant {
                Capability::Controller => controller_path = directive.text("path").map(|p| normalize_path(&p)),
                Capability::GetOrCreate => {
                    get_or_create_path = directive.text("path").map(|p| normalize_path(&p));
                }
                Capability::ConfigBinding => config_prefix = directive.text("prefix"),
                _ => {}
            }
        }
    }

    let mut fields: Vec<FieldModel> = declared
        .fields
        .iter()
        .enumerate()
        .filter_map(|(i, field)| resolve_field(skeleton, Slot::Field(i), field, module, index, sink))
        .collect();

    if !fields.iter().any(|f| f.is_id)
        && let Some(id) = fields.iter_mut().find(|f| f.name == "id" && !f.transient)
    {
        id.is_id = true;
    }

    let has_name = fields
        .iter()
        .any(|f| f.name == "name" && f.ty.kind == TypeKind::Text && f.ty.is_plain() && !f.transient);
    if has_name {
        capabilities.insert(Capability::HasName);
    } else if capabilities.remove(&Capability::GetOrCreate) {
        let at = skeleton
            .at(Slot::Type)
            .find(|d| d.grants.contains(&Capability::GetOrCreate))
            .map_or_else(|| declared.location.clone(), |d| d.location.clone());
        sink.report(Diagnostic::warning(
            DiagnosticCode::ConflictingConstraints,
            at,
            format!(
                "`{}` has no `name: String` field; get-or-create is not generated",
                declared.name.simple()
            )
        ));
    }

    let mut endpoints = Vec::new();
    for (i, method) in declared.methods.iter().enumerate() {
        let Some(directive) = skeleton.find(Slot::Method(i), "get_endpoint") else {
            continue;
        };
        let Some(returns) = method
            .returns
            .clone()
            .filter(|_| method.by_ref_self && method.arguments == 0)
        else {
            sink.report(Diagnostic::error(
                DiagnosticCode::SchemaMisuse,
                directive.location.clone(),
                "`#[get_endpoint]` needs a `&self` method without parameters that returns a value"
            ));
            continue;
        };
        endpoints.push(MethodEndpoint {
            name: method.name.clone(),
            path: directive
                .text("path")
                .map_or_else(|| format!("/{}", method.name.to_case(Case::Kebab)), |p| normalize_path(&p)),
            returns: index.qualify_type(module, &returns),
            visible: method.visible,
            location: method.location.clone()
        });
    }

    EntityModel {
        name: declared.name.clone(),
        origin: Origin::Annotated,
        visible: declared.visible,
        fields,
        endpoints,
        capabilities,
        modules,
        controller_path,
        get_or_create_path,
        config_prefix,
        doc: declared.doc.clone(),
        implements_default: declared.implements_default,
        location: declared.location.clone()
    }
}

fn resolve_field(
    skeleton: &Skeleton<'_>,
    slot: Slot,
    field: &DeclaredField,
    module: &str,
    index: &DeclarationIndex,
    sink: &DiagnosticSink
) -> Option<FieldModel> {
    let mut model = plain_field(field, module, index)?;

    model.is_id = skeleton.find(slot, "id").is_some();
    model.transient = skeleton.find(slot, "transient").is_some();

    if let Some(validate) = skeleton.find(slot, "validate") {
        model.constraints = constraints(validate, sink);
    }

    if let Some(key) = skeleton.find(slot, "config_key") {
        if let Some(name) = key.text("name") {
            model.config_key.name = name;
        }
        model.config_key.default = key.args.get("default").cloned();
    }

    if let Some(directive) = skeleton.find(slot, "relation") {
        model.relation = relation(&model, directive, module, index, sink);
        if model.relation.is_none() {
            return Some(model);
        }
    }

    if let Some(filter) = skeleton.find(slot, "filter") {
        model.filter = Some(
            filter
                .text("kind")
                .and_then(|k| FilterKind::parse(&k))
                .unwrap_or(FilterKind::Eq)
        );
    }

    if let Some(directive) = skeleton.find(slot, "endpoints")
        && let Some(relation) = model.relation.as_mut()
    {
        relation.endpoints = endpoints(&model.name, relation, directive, sink);
    }

    Some(model)
}

/// Field model without directives.
fn plain_field(field: &DeclaredField, module: &str, index: &DeclarationIndex) -> Option<FieldModel> {
    let ty = TypeDescriptor::parse(&field.ty)?.qualified_with(|t| index.qualify_type(module, t));
    Some(FieldModel {
        name:        field.name.clone(),
        ty,
        visible:     field.visible,
        doc:         field.doc.clone(),
        constraints: Vec::new(),
        filter:      None,
        is_id:       false,
        transient:   false,
        relation:    None,
        config_key:  ConfigKey {
            name:    field.name.clone(),
            default: None
        },
        location:    field.location.clone()
    })
}

fn constraints(directive: &Checked, sink: &DiagnosticSink) -> Vec<Constraint> {
    let mut out = Vec::new();
    for (key, value) in &directive.args {
        let length = |v: &AttrValue| {
            let n = v.as_int().and_then(|n| u64::try_from(n).ok());
            if n.is_none() {
                sink.report(Diagnostic::error(
                    DiagnosticCode::InvalidAttribute,
                    directive.location.clone(),
                    format!("`{key}` must not be negative, found `{v}`")
                ));
            }
            n
        };
        let constraint = match key.as_str() {
            "min_length" => length(value).map(Constraint::MinLength),
            "max_length" => length(value).map(Constraint::MaxLength),
            "min" => value.as_int().map(Constraint::Min),
            "max" => value.as_int().map(Constraint::Max),
            "not_blank" => (value.as_bool() == Some(true)).then_some(Constraint::NotBlank),
            _ => None
        };
        out.extend(constraint);
    }
    out
}

fn relation(
    field: &FieldModel,
    directive: &Checked,
    module: &str,
    index: &DeclarationIndex,
    sink: &DiagnosticSink
) -> Option<Relation> {
    let written = match (directive.text("target"), &field.ty.kind) {
        (Some(target), _) => target,
        (None, TypeKind::Reference(path)) => path.clone(),
        (None, _) => {
            sink.report(Diagnostic::error(
                DiagnosticCode::UnresolvedReference,
                directive.location.clone(),
                format!(
                    "cannot infer the relation target of `{}` from `{}`; set `target`",
                    field.name, field.ty.element
                )
            ));
            return None;
        }
    };

    let resolved = index
        .resolve(module, &written)
        .filter(|name| index.get(name).is_some_and(|d| d.kind == DeclKind::Struct));
    let Some(target) = resolved else {
        sink.report(Diagnostic::error(
            DiagnosticCode::UnresolvedReference,
            directive.location.clone(),
            format!("relation target `{written}` is not a struct declared in this crate")
        ));
        return None;
    };
    if index.get(&target).is_some_and(|d| d.generic) {
        sink.report(Diagnostic::error(
            DiagnosticCode::SchemaMisuse,
            directive.location.clone(),
            format!("relation target `{written}` has generic parameters")
        ));
        return None;
    }

    let embedded = matches!(&field.ty.kind, TypeKind::Reference(path)
        if index.resolve(module, path).as_ref() == Some(&target));
    let default_kind = if field.ty.collection {
        RelationKind::OneToMany
    } else {
        RelationKind::ManyToOne
    };

    Some(Relation {
        target,
        kind: directive
            .text("kind")
            .and_then(|k| RelationKind::parse(&k))
            .unwrap_or(default_kind),
        storage: if embedded {
            RelationStorage::Embedded
        } else {
            RelationStorage::Identifier
        },
        mapped_by: directive.text("mapped_by"),
        endpoints: None
    })
}

fn endpoints(
    field: &str,
    relation: &Relation,
    directive: &Checked,
    sink: &DiagnosticSink
) -> Option<Endpoints> {
    let mut endpoints = Endpoints {
        path:   directive
            .text("path")
            .map_or_else(|| format!("/{}", field.to_case(Case::Kebab)), |p| normalize_path(&p)),
        method: directive.text("method").unwrap_or_else(|| field.to_owned()),
        read:   directive.flag("read").unwrap_or(true),
        add:    directive.flag("add").unwrap_or(false),
        remove: directive.flag("remove").unwrap_or(false)
    };

    if (endpoints.add || endpoints.remove) && !relation.kind.is_to_many() {
        sink.report(Diagnostic::warning(
            DiagnosticCode::ConflictingConstraints,
            directive.location.clone(),
            format!(
                "`add` and `remove` need a collection relation; `{}` is `{}`, ignored",
                field,
                relation.kind.as_str()
            )
        ));
        endpoints.add = false;
        endpoints.remove = false;
    }
    if endpoints.remove && relation.kind == RelationKind::OneToMany && relation.mapped_by.is_none() {
        sink.report(Diagnostic::warning(
            DiagnosticCode::ConflictingConstraints,
            directive.location.clone(),
            format!("`remove` on one_to_many `{field}` needs `mapped_by`; ignored")
        ));
        endpoints.remove = false;
    }

    (endpoints.read || endpoints.add || endpoints.remove).then_some(endpoints)
}

/// Add relation targets that carry no directives themselves.
fn expand_referenced(entities: &mut BTreeMap<QualifiedName, EntityModel>, index: &DeclarationIndex) {
    let mut pending: BTreeSet<QualifiedName> = entities
        .values()
        .flat_map(EntityModel::related)
        .filter(|name| !entities.contains_key(name))
        .collect();

    while let Some(name) = pending.pop_first() {
        let Some(declared) = index.get(&name) else {
            continue;
        };
        let mut fields: Vec<FieldModel> = declared
            .fields
            .iter()
            .filter_map(|f| plain_field(f, name.module(), index))
            .collect();
        if let Some(id) = fields.iter_mut().find(|f| f.name == "id") {
            id.is_id = true;
        }
        let mut capabilities = BTreeSet::new();
        if fields
            .iter()
            .any(|f| f.name == "name" && f.ty.kind == TypeKind::Text && f.ty.is_plain())
        {
            capabilities.insert(Capability::HasName);
        }

        let entity = EntityModel {
            name: name.clone(),
            origin: Origin::Referenced,
            visible: declared.visible,
            fields,
            endpoints: Vec::new(),
            capabilities,
            modules: BTreeMap::new(),
            controller_path: None,
            get_or_create_path: None,
            config_prefix: None,
            doc: declared.doc.clone(),
            implements_default: declared.implements_default,
            location: declared.location.clone()
        };
        pending.extend(
            entity
                .related()
                .into_iter()
                .filter(|n| !entities.contains_key(n) && *n != name)
        );
        entities.insert(name, entity);
    }
}

/// Pass 3: per-entity invariants.
fn validate(
    entity: &EntityModel,
    entities: &BTreeMap<QualifiedName, EntityModel>,
    index: &DeclarationIndex,
    sink: &DiagnosticSink
) {
    let mut names = BTreeSet::new();
    for field in &entity.fields {
        if !names.insert(field.name.as_str()) {
            sink.report(Diagnostic::error(
                DiagnosticCode::DuplicateName,
                field.location.clone(),
                format!("field `{}` is declared more than once", field.name)
            ));
        }
        validate_field(entity, field, index, sink);
        validate_relation_filter(field, entities, sink);
    }

    if !entity.endpoints.is_empty() && !SERVICED.iter().any(|c| entity.has(*c)) {
        sink.report(Diagnostic::warning(
            DiagnosticCode::ConflictingConstraints,
            entity.location.clone(),
            format!(
                "method endpoints of `{}` need `#[service]` or `#[controller]`",
                entity.simple_name()
            )
        ));
    }

    validate_id(entity, sink);
    validate_config_keys(entity, sink);
    validate_endpoint_paths(entity, sink);
    validate_member_names(entity, sink);
}

fn validate_id(entity: &EntityModel, sink: &DiagnosticSink) {
    let ids: Vec<&FieldModel> = entity.fields.iter().filter(|f| f.is_id).collect();
    for extra in ids.iter().skip(1) {
        sink.report(Diagnostic::error(
            DiagnosticCode::ConflictingConstraints,
            extra.location.clone(),
            format!("`{}` has more than one `#[id]` field", entity.simple_name())
        ));
    }
    if let Some(id) = ids.first()
        && !id.ty.is_plain()
    {
        sink.report(Diagnostic::error(
            DiagnosticCode::ConflictingConstraints,
            id.location.clone(),
            format!("id field `{}` cannot be optional or a collection", id.name)
        ));
    }

    let persistent = PERSISTENT.iter().any(|c| entity.has(*c));
    if persistent && ids.is_empty() {
        sink.report(Diagnostic::error(
            DiagnosticCode::MissingId,
            entity.location.clone(),
            format!(
                "`{}` needs an `#[id]` field or a field named `id`",
                entity.simple_name()
            )
        ));
    }
}

fn validate_field(entity: &EntityModel, field: &FieldModel, index: &DeclarationIndex, sink: &DiagnosticSink) {
    let conflict = |message: String| {
        sink.report(Diagnostic::error(
            DiagnosticCode::ConflictingConstraints,
            field.location.clone(),
            message
        ));
    };

    let mut min_length = None;
    let mut max_length = None;
    let mut min = None;
    let mut max = None;
    for constraint in &field.constraints {
        match constraint {
            Constraint::MinLength(n) => min_length = Some(*n),
            Constraint::MaxLength(n) => max_length = Some(*n),
            Constraint::Min(n) => min = Some(*n),
            Constraint::Max(n) => max = Some(*n),
            Constraint::NotBlank => {}
        }
        let fits = match constraint {
            Constraint::MinLength(_) | Constraint::MaxLength(_) | Constraint::NotBlank => {
                field.ty.is_text()
            }
            Constraint::Min(_) | Constraint::Max(_) => field.ty.is_number()
        };
        if !fits {
            conflict(format!(
                "`{}` does not apply to `{}` of type `{}`",
                constraint, field.name, field.ty.rendered
            ));
        }
    }
    if let (Some(lo), Some(hi)) = (min_length, max_length)
        && lo > hi
    {
        conflict(format!("`min_length` {lo} exceeds `max_length` {hi} on `{}`", field.name));
    }
    if let (Some(lo), Some(hi)) = (min, max)
        && lo > hi
    {
        conflict(format!("`min` {lo} exceeds `max` {hi} on `{}`", field.name));
    }

    if let Some(kind) = field.filter {
        let ok = match (kind, &field.relation) {
            (FilterKind::Eq, Some(_)) => true,
            (_, Some(_)) => false,
            (FilterKind::Eq, None) => field.ty.kind.is_scalar() && !field.ty.collection,
            (FilterKind::Contains, None) => field.ty.is_text(),
            (FilterKind::Range, None) => field.ty.is_number()
        };
        if !ok {
            conflict(format!(
                "filter `{}` does not apply to `{}` of type `{}`",
                kind.as_str(),
                field.name,
                field.ty.rendered
            ));
        }
    }

    if let Some(relation) = &field.relation {
        if relation.kind.is_to_many() != field.ty.collection {
            conflict(format!(
                "`{}` relation `{}` {} a collection field",
                relation.kind.as_str(),
                field.name,
                if relation.kind.is_to_many() { "needs" } else { "cannot be" }
            ));
        }
        if relation.storage == RelationStorage::Identifier
            && !matches!(field.ty.kind, TypeKind::Integer | TypeKind::Text)
        {
            conflict(format!(
                "`{}` holds neither `{}` values nor ids",
                field.name,
                relation.target.simple()
            ));
        }
        if let Some(mapped_by) = &relation.mapped_by
            && index
                .get(&relation.target)
                .is_none_or(|target| target.field(mapped_by).is_none())
        {
            sink.report(Diagnostic::error(
                DiagnosticCode::UnresolvedReference,
                field.location.clone(),
                format!(
                    "`mapped_by` names `{}`, which is not a field of `{}`",
                    mapped_by,
                    relation.target.simple()
                )
            ));
        }
        if relation.endpoints.is_some() && !SERVICED.iter().any(|c| entity.has(*c)) {
            sink.report(Diagnostic::warning(
                DiagnosticCode::ConflictingConstraints,
                field.location.clone(),
                format!("endpoints of `{}` need `#[service]` or `#[controller]`", field.name)
            ));
        }
    }

    if let Some(default) = &field.config_key.default {
        let ok = match &field.ty.kind {
            TypeKind::Text => true,
            TypeKind::Bool => matches!(default, AttrValue::Bool(_)),
            TypeKind::Integer => matches!(default, AttrValue::Int(_)),
            TypeKind::Float => matches!(default, AttrValue::Int(_) | AttrValue::Float(_)),
            TypeKind::Reference(_) => true
        };
        if !ok {
            conflict(format!(
                "default `{}` does not fit `{}` of type `{}`",
                default, field.name, field.ty.rendered
            ));
        }
    }
}

fn validate_config_keys(entity: &EntityModel, sink: &DiagnosticSink) {
    if !entity.has(Capability::ConfigBinding) {
        for field in entity
            .fields
            .iter()
            .filter(|f| f.config_key.name != f.name || f.config_key.default.is_some())
        {
            sink.report(Diagnostic::warning(
                DiagnosticCode::ConflictingConstraints,
                field.location.clone(),
                format!(
                    "`#[config_key]` on `{}` has no effect without `#[config_binding]`",
                    field.name
                )
            ));
        }
        return;
    }

    let mut keys = BTreeSet::new();
    for field in entity.persistent_fields() {
        if field.relation.is_none() && !field.ty.kind.is_scalar() {
            sink.report(Diagnostic::error(
                DiagnosticCode::ConflictingConstraints,
                field.location.clone(),
                format!(
                    "`{}` of type `{}` cannot be bound from configuration; mark it `#[transient]`",
                    field.name, field.ty.rendered
                )
            ));
        }
        if !keys.insert(field.config_key.name.as_str()) {
            sink.report(Diagnostic::error(
                DiagnosticCode::DuplicateName,
                field.location.clone(),
                format!("config key `{}` is bound more than once", field.config_key.name)
            ));
        }
    }
}

fn validate_endpoint_paths(entity: &EntityModel, sink: &DiagnosticSink) {
    let relation_paths = entity.relations().filter_map(|(field, relation)| {
        relation
            .endpoints
            .as_ref()
            .map(|e| (e.path.as_str(), &field.location))
    });
    let method_paths = entity
        .endpoints
        .iter()
        .map(|e| (e.path.as_str(), &e.location));

    let mut paths = BTreeSet::new();
    for (path, location) in relation_paths.chain(method_paths) {
        if !paths.insert(path) {
            sink.report(Diagnostic::error(
                DiagnosticCode::DuplicateName,
                location.clone(),
                format!("endpoint path `{path}` is used more than once")
            ));
        }
    }
}

/// Relation criteria compare target ids as predicate values.
fn validate_relation_filter(
    field: &FieldModel,
    entities: &BTreeMap<QualifiedName, EntityModel>,
    sink: &DiagnosticSink
) {
    let Some(relation) = field.relation.as_ref().filter(|_| field.filter.is_some()) else {
        return;
    };
    if relation.storage != RelationStorage::Embedded {
        return;
    }
    let Some(target_id) = entities.get(&relation.target).and_then(EntityModel::id_field) else {
        return;
    };
    if !target_id.ty.kind.is_scalar() || !target_id.ty.is_plain() {
        sink.report(Diagnostic::error(
            DiagnosticCode::ConflictingConstraints,
            field.location.clone(),
            format!(
                "`{}` cannot be filtered: id `{}` of `{}` has type `{}`, which is not a primitive",
                field.name,
                target_id.name,
                relation.target.simple(),
                target_id.ty.rendered
            )
        ));
    }
}

/// Generated filter fields and service or controller methods share one
/// namespace per artifact.
fn validate_member_names(entity: &EntityModel, sink: &DiagnosticSink) {
    let mut criteria = BTreeSet::new();
    for field in entity.filter_fields() {
        for name in criterion_names(field) {
            if !criteria.insert(name.clone()) {
                sink.report(Diagnostic::error(
                    DiagnosticCode::DuplicateName,
                    field.location.clone(),
                    format!("filter criterion `{name}` of `{}` is generated more than once", field.name)
                ));
            }
        }
    }

    if !SERVICED.iter().any(|c| entity.has(*c)) {
        return;
    }
    let mut reserved: BTreeSet<&str> = SERVICE_MEMBERS.iter().copied().collect();
    if entity.has(Capability::Controller) {
        reserved.extend(CONTROLLER_MEMBERS);
    }

    let relation_methods = entity.relations().flat_map(|(field, relation)| {
        relation
            .endpoints
            .iter()
            .flat_map(|e| {
                [
                    e.read.then(|| e.method.clone()),
                    e.add.then(|| format!("add_{}", e.method)),
                    e.remove.then(|| format!("remove_{}", e.method))
                ]
            })
            .flatten()
            .map(move |name| (name, &field.location))
    });
    let method_endpoints = entity
        .endpoints
        .iter()
        .map(|e| (e.name.clone(), &e.location));

    let mut methods = BTreeSet::new();
    for (name, location) in relation_methods.chain(method_endpoints) {
        if reserved.contains(name.as_str()) || !methods.insert(name.clone()) {
            sink.report(Diagnostic::error(
                DiagnosticCode::DuplicateName,
                location.clone(),
                format!(
                    "operation `{name}` of `{}` clashes with another generated operation",
                    entity.simple_name()
                )
            ));
        }
    }
}

/// Struct fields a filterable field contributes to `{E}Filter`.
fn criterion_names(field: &FieldModel) -> Vec<String> {
    match (&field.relation, field.filter) {
        (Some(relation), _) if relation.kind.is_to_many() => vec![field.name.clone()],
        (Some(_), _) => vec![pluralize(&field.name)],
        (None, Some(FilterKind::Range)) => {
            vec![format!("{}_from", field.name), format!("{}_to", field.name)]
        }
        (None, _) => vec![field.name.clone()]
    }
}

fn valid_module(path: &str) -> bool {
    !path.is_empty()
        && path
            .split("::")
            .all(|segment| syn::parse_str::<syn::Ident>(segment).is_ok())
}
