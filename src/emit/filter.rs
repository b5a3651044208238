// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Predicate builder artifact.
//!
//! # Criteria
//!
//! | Field                          | Criterion                  | Clause                          |
//! |--------------------------------|----------------------------|---------------------------------|
//! | `#[filter(contains)] title`    | `title: Option<String>`    | `title contains v`              |
//! | `#[filter] published: bool`    | `published: bool`          | `published = true` when set     |
//! | `#[filter] year: i32`          | `year: Option<i32>`        | `year = v`                      |
//! | `#[filter(range)] pages`       | `pages_from`, `pages_to`   | `pages >= a`, `pages <= b`      |
//! | `#[relation] #[filter] author` | `authors: Vec<AuthorId>`   | `author.id in (..)`             |
//! | `#[relation] #[filter] tags`   | `tags: Vec<TagId>`         | `tags.*.id in (..)`             |
//!
//! Relation criteria compare ids: through the related entity's id field for
//! embedded values, directly for id-valued fields. Clauses are built from
//! the metamodel root, `<QBook as Metamodel>::root()`.

use proc_macro2::TokenStream;
use quote::quote;

use super::{
    EmitContext, EmitError, Emitter, FragmentKind, SourceUnit,
    names::{entity_path, ident, path, runtime, suffixed, ty}
};
use crate::{
    model::{EntityModel, FieldModel, FilterKind, Relation, RelationStorage, TypeKind},
    naming::pluralize,
    plan::{ArtifactKind, ArtifactPlan}
};

/// Emits `{E}Filter` and its `ToPredicate` impl.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEmitter;

/// Struct fields and clause statements of one filtered field.
struct Criterion {
    fields:  Vec<TokenStream>,
    clauses: Vec<TokenStream>
}

impl Emitter for FilterEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::PredicateBuilder
    }

    fn emit(
        &self,
        entity: &EntityModel,
        plan: &ArtifactPlan,
        ctx: &EmitContext<'_>
    ) -> Result<SourceUnit, EmitError> {
        let rt = runtime();
        entity_path(entity)?;
        let metamodel = plan.metamodel.as_ref().ok_or_else(|| {
            EmitError::Unsupported(format!("no query metamodel for `{}`", entity.name))
        })?;
        let metamodel = path(metamodel.as_str())?;

        let mut fields = Vec::new();
        let mut clauses = Vec::new();
        for field in entity.filter_fields() {
            let criterion = match &field.relation {
                Some(relation) => relation_criterion(field, relation, ctx)?,
                None => scalar_criterion(field)?
            };
            fields.extend(criterion.fields);
            clauses.extend(criterion.clauses);
        }

        let filter_ident = ident(&plan.type_name)?;
        let doc = format!(" Query criteria of [`{}`]; unset criteria match everything.", entity.name);
        let mut unit = SourceUnit::new(plan);
        unit.push(
            FragmentKind::Struct,
            plan.type_name.clone(),
            quote! {
                #[doc = #doc]
                #[derive(Debug, Clone, Default, PartialEq)]
                pub struct #filter_ident {
                    #(#fields,)*
                }
            }
        );

        let body = if clauses.is_empty() {
            quote! { #rt::predicate::Predicate::True }
        } else {
            quote! {
                let root = <#metamodel as #rt::predicate::Metamodel>::root();
                let mut builder = #rt::predicate::PredicateBuilder::new();
                #(#clauses)*
                builder.build()
            }
        };
        unit.push(
            FragmentKind::Impl,
            "ToPredicate",
            quote! {
                impl #rt::predicate::ToPredicate for #filter_ident {
                    fn to_predicate(&self) -> #rt::predicate::Predicate {
                        #body
                    }
                }
            }
        );

        Ok(unit)
    }
}

fn scalar_criterion(field: &FieldModel) -> Result<Criterion, EmitError> {
    let name = &field.name;
    if !field.ty.kind.is_scalar() {
        return Err(EmitError::Unsupported(format!(
            "`{name}` of type `{}` is not a predicate value",
            field.ty.rendered
        )));
    }
    let id = ident(name)?;
    let element = ty(&field.ty.qualified_element)?;
    let kind = field.filter.unwrap_or(FilterKind::Eq);
    let doc = field.doc.as_ref().map(|d| quote! { #[doc = #d] });

    Ok(match kind {
        FilterKind::Contains => Criterion {
            fields:  vec![quote! { #doc pub #id: Option<String> }],
            clauses: vec![quote! {
                if let Some(value) = &self.#id {
                    builder.and(root.get(#name).contains(value.as_str()));
                }
            }]
        },
        FilterKind::Eq if field.ty.kind == TypeKind::Bool => Criterion {
            fields:  vec![quote! { #doc pub #id: bool }],
            clauses: vec![quote! {
                if self.#id {
                    builder.and(root.get(#name).eq(true));
                }
            }]
        },
        FilterKind::Eq => Criterion {
            fields:  vec![quote! { #doc pub #id: Option<#element> }],
            clauses: vec![quote! {
                if let Some(value) = &self.#id {
                    builder.and(root.get(#name).eq(value.clone()));
                }
            }]
        },
        FilterKind::Range => {
            let from = suffixed(name, "_from")?;
            let to = suffixed(name, "_to")?;
            let from_doc = format!(" Lower bound of `{name}`, inclusive.");
            let to_doc = format!(" Upper bound of `{name}`, inclusive.");
            Criterion {
                fields:  vec![
                    quote! { #[doc = #from_doc] pub #from: Option<#element> },
                    quote! { #[doc = #to_doc] pub #to: Option<#element> }
                ],
                clauses: vec![
                    quote! {
                        if let Some(value) = &self.#from {
                            builder.and(root.get(#name).ge(value.clone()));
                        }
                    },
                    quote! {
                        if let Some(value) = &self.#to {
                            builder.and(root.get(#name).le(value.clone()));
                        }
                    }
                ]
            }
        }
    })
}

fn relation_criterion(
    field: &FieldModel,
    relation: &Relation,
    ctx: &EmitContext<'_>
) -> Result<Criterion, EmitError> {
    let name = &field.name;
    let target = ctx.related(&relation.target)?;
    let target_id = target.id_field().ok_or_else(|| {
        EmitError::Unsupported(format!(
            "`{}` filters by `{}` ids, but `{}` has no id field",
            name, target.name, target.name
        ))
    })?;
    if relation.storage == RelationStorage::Embedded && !target_id.ty.kind.is_scalar() {
        return Err(EmitError::Unsupported(format!(
            "`{}` filters by `{}` ids of type `{}`, which is not a predicate value",
            name, target.name, target_id.ty.rendered
        )));
    }

    let criterion_name = if relation.kind.is_to_many() {
        name.clone()
    } else {
        pluralize(name)
    };
    let id = ident(&criterion_name)?;
    let id_ty = match relation.storage {
        RelationStorage::Embedded => ty(&target_id.ty.qualified)?,
        RelationStorage::Identifier => ty(&field.ty.qualified_element)?
    };

    let mut navigation = quote! { root.get(#name) };
    if field.ty.collection {
        navigation = quote! { #navigation.any() };
    }
    if relation.storage == RelationStorage::Embedded {
        let target_field = &target_id.name;
        navigation = quote! { #navigation.get(#target_field) };
    }

    let doc = format!(" Ids of `{}` to match; empty matches everything.", target.simple_name());
    Ok(Criterion {
        fields:  vec![quote! { #[doc = #doc] pub #id: Vec<#id_ty> }],
        clauses: vec![quote! {
            if !self.#id.is_empty() {
                builder.and(#navigation.is_in(self.#id.iter().cloned()));
            }
        }]
    })
}
