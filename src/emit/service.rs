// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Service artifact.
//!
//! `{E}Service<R, H>` wraps any `R: {E}Repository` and runs
//! `PersistenceHooks` around every mutation:
//!
//! ```text
//! create   before_create → validate → unique name → save → after_create
//! update   exists → set_id → before_update → validate → unique name → save → after_update
//! delete   before_delete → delete_by_id → after_delete
//! ```
//!
//! Depending on the model it adds `find_matching` / `count_matching`
//! (filter planned), `get_or_create` (get-or-create directive), relation
//! endpoint operations and method endpoint operations.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{
    EmitContext, EmitError, Emitter, FragmentKind, SourceUnit,
    checks::constraint_checks,
    names::{entity_path, field_ident, ident, path, prefixed, runtime, ty}
};
use crate::{
    model::{EntityModel, FieldModel, Relation, RelationStorage},
    plan::{ArtifactKind, ArtifactPlan},
    schema::Capability
};

/// Emits `{E}Service`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceEmitter;

/// Tokens shared by every operation of one service.
struct Shared {
    rt:     TokenStream,
    entity: syn::Path,
    id:     syn::Type,
    error:  TokenStream
}

impl Shared {
    fn repository_error(&self) -> TokenStream {
        let rt = &self.rt;
        quote! { #rt::service::ServiceError::Repository }
    }

    fn not_found(&self) -> TokenStream {
        let Self {
            rt,
            entity,
            ..
        } = self;
        quote! { #rt::service::ServiceError::not_found(<#entity as #rt::Entity>::NAME, id) }
    }
}

impl Emitter for ServiceEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Service
    }

    fn emit(
        &self,
        entity: &EntityModel,
        plan: &ArtifactPlan,
        ctx: &EmitContext<'_>
    ) -> Result<SourceUnit, EmitError> {
        let rt = runtime();
        let entity_ty = entity_path(entity)?;
        let repository = path(&ctx.requires(entity, self.kind(), ArtifactKind::Repository)?.type_path())?;
        let id_field = entity
            .id_field()
            .ok_or_else(|| EmitError::Unsupported(format!("`{}` has no id field", entity.name)))?;

        let shared = Shared {
            error: quote! {
                #rt::service::ServiceError<<R as #rt::Repository<#entity_ty>>::Error>
            },
            id: ty(&id_field.ty.qualified)?,
            entity: entity_ty.clone(),
            rt: rt.clone()
        };

        let mut operations = vec![validate(entity, &shared)?, crud(entity, &shared)];
        if let Some(filter) = ctx.plans().get(&entity.name, ArtifactKind::PredicateBuilder) {
            operations.push(filtered(&path(&filter.type_path())?, &shared));
        }
        if entity.has(Capability::GetOrCreate) {
            if !entity.implements_default {
                return Err(EmitError::Unsupported(format!(
                    "get-or-create of `{}` needs `Default`; derive or implement it",
                    entity.name
                )));
            }
            operations.push(get_or_create(&shared));
        }
        for (field, relation) in entity.relations() {
            operations.push(relation_endpoints(entity, field, relation, ctx, &shared)?);
        }
        for endpoint in &entity.endpoints {
            if !endpoint.visible {
                return Err(EmitError::NotVisible {
                    entity: entity.name.to_string(),
                    what:   format!("method `{}`", endpoint.name)
                });
            }
            let name = ident(&endpoint.name)?;
            let returns = ty(&endpoint.returns)?;
            let Shared {
                id,
                error,
                ..
            } = &shared;
            let doc = format!(" `{}` of the entity with this id.", endpoint.name);
            operations.push(quote! {
                #[doc = #doc]
                pub async fn #name(&self, id: &#id) -> Result<#returns, #error> {
                    Ok(self.find_by_id(id).await?.#name())
                }
            });
        }

        let service = ident(&plan.type_name)?;
        let doc = format!(" Business operations of [`{}`].", entity.name);
        let mut unit = SourceUnit::new(plan);
        unit.push(
            FragmentKind::Struct,
            plan.type_name.clone(),
            quote! {
                #[doc = #doc]
                #[derive(Debug, Clone)]
                pub struct #service<R, H = #rt::service::NoHooks> {
                    repository: R,
                    hooks: H
                }
            }
        );
        unit.push(
            FragmentKind::Impl,
            format!("{}<R>", plan.type_name),
            quote! {
                impl<R> #service<R>
                where
                    R: #repository
                {
                    /// Service without persistence hooks.
                    pub fn new(repository: R) -> Self {
                        Self {
                            repository,
                            hooks: #rt::service::NoHooks
                        }
                    }
                }
            }
        );
        unit.push(
            FragmentKind::Impl,
            format!("{}<R, H>", plan.type_name),
            quote! {
                impl<R, H> #service<R, H>
                where
                    R: #repository,
                    H: #rt::service::PersistenceHooks<#entity_ty>
                {
                    /// Service running `hooks` around mutations.
                    pub fn with_hooks(repository: R, hooks: H) -> Self {
                        Self {
                            repository,
                            hooks
                        }
                    }

                    /// Underlying repository.
                    pub fn repository(&self) -> &R {
                        &self.repository
                    }

                    #(#operations)*
                }
            }
        );

        Ok(unit)
    }
}

fn validate(entity: &EntityModel, shared: &Shared) -> Result<TokenStream, EmitError> {
    let Shared {
        rt,
        entity: entity_ty,
        ..
    } = shared;
    let checks = constraint_checks(entity, &format_ident!("entity"))?;
    Ok(if checks.is_empty() {
        quote! {
            /// Check declared constraints; this entity declares none.
            pub fn validate(_entity: &#entity_ty) -> Result<(), #rt::validate::Violations> {
                Ok(())
            }
        }
    } else {
        quote! {
            /// Check declared constraints, collecting every violation.
            pub fn validate(entity: &#entity_ty) -> Result<(), #rt::validate::Violations> {
                let mut violations = #rt::validate::Violations::new();
                #(#checks)*
                violations.into_result()
            }
        }
    })
}

fn crud(entity: &EntityModel, shared: &Shared) -> TokenStream {
    let Shared {
        rt,
        entity: entity_ty,
        id,
        error
    } = shared;
    let repository_error = shared.repository_error();
    let not_found = shared.not_found();
    let name_of = quote! { <#entity_ty as #rt::Entity>::NAME };

    let (create_unique, update_unique) = if entity.has(Capability::HasName) {
        (
            quote! {
                let name = #rt::HasName::name(&entity);
                if self
                    .repository
                    .exists_by_name_ignore_case(name)
                    .await
                    .map_err(#repository_error)?
                {
                    return Err(#rt::service::ServiceError::conflict(#name_of, name));
                }
            },
            quote! {
                let name = #rt::HasName::name(&entity);
                if let Some(other) = self
                    .repository
                    .find_by_name_ignore_case(name)
                    .await
                    .map_err(#repository_error)?
                {
                    if #rt::Entity::id(&other) != id {
                        return Err(#rt::service::ServiceError::conflict(#name_of, name));
                    }
                }
            }
        )
    } else {
        (TokenStream::new(), TokenStream::new())
    };

    quote! {
        /// Entity by id.
        pub async fn find_by_id(&self, id: &#id) -> Result<#entity_ty, #error> {
            self.repository
                .find_by_id(id)
                .await
                .map_err(#repository_error)?
                .ok_or_else(|| #not_found)
        }

        /// One page of entities.
        pub async fn find_all(&self, page: #rt::Pagination) -> Result<#rt::Page<#entity_ty>, #error> {
            self.repository.find_page(page).await.map_err(#repository_error)
        }

        /// Number of stored entities.
        pub async fn count(&self) -> Result<u64, #error> {
            self.repository.count().await.map_err(#repository_error)
        }

        /// Validate and store a new entity.
        pub async fn create(&self, mut entity: #entity_ty) -> Result<#entity_ty, #error> {
            self.hooks.before_create(&mut entity).await;
            Self::validate(&entity).map_err(#rt::service::ServiceError::Invalid)?;
            #create_unique
            let saved = self.repository.save(entity).await.map_err(#repository_error)?;
            self.hooks.after_create(&saved).await;
            Ok(saved)
        }

        /// Validate and replace the entity stored under `id`.
        pub async fn update(&self, id: &#id, mut entity: #entity_ty) -> Result<#entity_ty, #error> {
            if !self.repository.exists_by_id(id).await.map_err(#repository_error)? {
                return Err(#not_found);
            }
            #rt::Entity::set_id(&mut entity, id.clone());
            self.hooks.before_update(&mut entity).await;
            Self::validate(&entity).map_err(#rt::service::ServiceError::Invalid)?;
            #update_unique
            let saved = self.repository.save(entity).await.map_err(#repository_error)?;
            self.hooks.after_update(&saved).await;
            Ok(saved)
        }

        /// Delete the entity stored under `id`.
        pub async fn delete(&self, id: &#id) -> Result<(), #error> {
            self.hooks.before_delete(id).await;
            if !self.repository.delete_by_id(id).await.map_err(#repository_error)? {
                return Err(#not_found);
            }
            self.hooks.after_delete(id).await;
            Ok(())
        }
    }
}

fn filtered(filter: &syn::Path, shared: &Shared) -> TokenStream {
    let Shared {
        rt,
        entity: entity_ty,
        error,
        ..
    } = shared;
    let repository_error = shared.repository_error();
    quote! {
        /// One page of entities matching `filter`.
        pub async fn find_matching(
            &self,
            filter: &#filter,
            page: #rt::Pagination
        ) -> Result<#rt::Page<#entity_ty>, #error> {
            let predicate = #rt::predicate::ToPredicate::to_predicate(filter);
            self.repository
                .find_matching(predicate, page)
                .await
                .map_err(#repository_error)
        }

        /// Number of entities matching `filter`.
        pub async fn count_matching(&self, filter: &#filter) -> Result<u64, #error> {
            let predicate = #rt::predicate::ToPredicate::to_predicate(filter);
            self.repository
                .count_matching(predicate)
                .await
                .map_err(#repository_error)
        }
    }
}

fn get_or_create(shared: &Shared) -> TokenStream {
    let Shared {
        rt,
        entity: entity_ty,
        error,
        ..
    } = shared;
    let repository_error = shared.repository_error();
    quote! {
        /// Entity with this name, ignoring case; created when absent.
        pub async fn get_or_create(&self, name: &str) -> Result<#entity_ty, #error> {
            #rt::service::get_or_create(&self.repository, name)
                .await
                .map_err(#repository_error)
        }
    }
}

fn relation_endpoints(
    entity: &EntityModel,
    field: &FieldModel,
    relation: &Relation,
    ctx: &EmitContext<'_>,
    shared: &Shared
) -> Result<TokenStream, EmitError> {
    let Some(endpoints) = &relation.endpoints else {
        return Ok(TokenStream::new());
    };
    let Shared {
        entity: entity_ty,
        id,
        error,
        ..
    } = shared;
    let field_name = field_ident(entity, field)?;
    let method = ident(&endpoints.method)?;
    let mut out = TokenStream::new();

    if endpoints.read {
        let field_ty = ty(&field.ty.qualified)?;
        let doc = format!(" `{}` of the entity with this id.", field.name);
        out.extend(quote! {
            #[doc = #doc]
            pub async fn #method(&self, id: &#id) -> Result<#field_ty, #error> {
                Ok(self.find_by_id(id).await?.#field_name)
            }
        });
    }

    let collection = if field.nullable() {
        quote! { entity.#field_name.get_or_insert_with(::std::default::Default::default) }
    } else {
        quote! { &mut entity.#field_name }
    };

    if endpoints.add {
        let add = prefixed("add_", &endpoints.method)?;
        let element = ty(&field.ty.qualified_element)?;
        let doc = format!(" Add one value to `{}` and store the entity.", field.name);
        out.extend(quote! {
            #[doc = #doc]
            pub async fn #add(&self, id: &#id, value: #element) -> Result<#entity_ty, #error> {
                let mut entity = self.find_by_id(id).await?;
                ::std::iter::Extend::extend(#collection, ::std::iter::once(value));
                self.update(id, entity).await
            }
        });
    }

    if endpoints.remove {
        let remove = prefixed("remove_", &endpoints.method)?;
        let (related_ty, keep) = match relation.storage {
            RelationStorage::Embedded => {
                let target = ctx.related(&relation.target)?;
                let target_id = target.id_field().ok_or_else(|| {
                    EmitError::Unsupported(format!(
                        "removing from `{}` needs an id field on `{}`",
                        field.name, target.name
                    ))
                })?;
                let target_field = field_ident(target, target_id)?;
                (ty(&target_id.ty.qualified)?, quote! { item.#target_field != *related })
            }
            RelationStorage::Identifier => (ty(&field.ty.qualified_element)?, quote! { item != related })
        };
        let doc = format!(" Remove the value with id `related` from `{}` and store the entity.", field.name);
        out.extend(quote! {
            #[doc = #doc]
            pub async fn #remove(&self, id: &#id, related: &#related_ty) -> Result<#entity_ty, #error> {
                let mut entity = self.find_by_id(id).await?;
                (#collection).retain(|item| #keep);
                self.update(id, entity).await
            }
        });
    }

    Ok(out)
}
