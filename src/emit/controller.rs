// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Controller artifact.
//!
//! `{E}Controller<R, H>` owns an `{E}Service<R, H>` and maps its results to
//! [`Reply`](entity_forge_core::web::Reply) values. Routing stays framework
//! neutral: `routes()` describes every handler and hosts mount the table.
//!
//! # Routes
//!
//! | Method   | Path                          | Handler               |
//! |----------|-------------------------------|-----------------------|
//! | `GET`    | `{base}`                      | `find_all`            |
//! | `GET`    | `{base}/count`                | `count`               |
//! | `GET`    | `{base}/search`               | `find_matching`       |
//! | `POST`   | `{base}`                      | `create`              |
//! | `GET`    | `{base}/{id}`                 | `get_by_id`           |
//! | `PUT`    | `{base}/{id}`                 | `update`              |
//! | `DELETE` | `{base}/{id}`                 | `delete`              |
//! | `POST`   | `{base}{get_or_create}`       | `get_or_create`       |
//! | `GET`    | `{base}/{id}{rel}`            | relation read         |
//! | `POST`   | `{base}/{id}{rel}`            | relation add          |
//! | `DELETE` | `{base}/{id}{rel}/{related}`  | relation remove       |
//! | `GET`    | `{base}/{id}{method}`         | method endpoint       |
//!
//! `search` and `get_or_create` exist only when the filter and the
//! get-or-create directive do.

use proc_macro2::TokenStream;
use quote::quote;

use super::{
    EmitContext, EmitError, Emitter, FragmentKind, SourceUnit,
    names::{entity_path, ident, path, prefixed, runtime, ty}
};
use crate::{
    model::{EntityModel, FieldModel, Relation, RelationStorage},
    naming::{collection_path, normalize_path},
    plan::{ArtifactKind, ArtifactPlan},
    schema::Capability
};

/// Path of the get-or-create handler when the directive names none.
const GET_OR_CREATE_PATH: &str = "/get-or-create";

/// Emits `{E}Controller`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerEmitter;

/// One route and the handler serving it.
struct Handler {
    method:    TokenStream,
    suffix:    String,
    operation: String,
    tokens:    TokenStream
}

impl Emitter for ControllerEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Controller
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
        let service = path(&ctx.requires(entity, self.kind(), ArtifactKind::Service)?.type_path())?;
        let id_field = entity
            .id_field()
            .ok_or_else(|| EmitError::Unsupported(format!("`{}` has no id field", entity.name)))?;
        let id = ty(&id_field.ty.qualified)?;
        let error = quote! {
            #rt::service::ServiceError<<R as #rt::Repository<#entity_ty>>::Error>
        };
        let reply = |body: TokenStream| quote! { Result<#rt::web::Reply<#body>, #error> };
        let method = |name: &str| {
            let name = ident(name)?;
            Ok::<_, EmitError>(quote! { #rt::web::Method::#name })
        };

        let base = entity
            .controller_path
            .clone()
            .unwrap_or_else(|| collection_path(entity.simple_name()));

        let mut handlers = Vec::new();
        let page_reply = reply(quote! { #rt::Page<#entity_ty> });
        handlers.push(Handler {
            method:    method("Get")?,
            suffix:    String::new(),
            operation: "find_all".into(),
            tokens:    quote! {
                /// `GET` one page of entities.
                pub async fn find_all(&self, page: #rt::Pagination) -> #page_reply {
                    self.service.find_all(page).await.map(#rt::web::Reply::ok)
                }
            }
        });
        let count_reply = reply(quote! { u64 });
        handlers.push(Handler {
            method:    method("Get")?,
            suffix:    "/count".into(),
            operation: "count".into(),
            tokens:    quote! {
                /// `GET` number of entities.
                pub async fn count(&self) -> #count_reply {
                    self.service.count().await.map(#rt::web::Reply::ok)
                }
            }
        });
        if let Some(filter) = ctx.plans().get(&entity.name, ArtifactKind::PredicateBuilder) {
            let filter = path(&filter.type_path())?;
            handlers.push(Handler {
                method:    method("Get")?,
                suffix:    "/search".into(),
                operation: "find_matching".into(),
                tokens:    quote! {
                    /// `GET` one page of entities matching `filter`.
                    pub async fn find_matching(
                        &self,
                        filter: #filter,
                        page: #rt::Pagination
                    ) -> #page_reply {
                        self.service
                            .find_matching(&filter, page)
                            .await
                            .map(#rt::web::Reply::ok)
                    }
                }
            });
        }

        let entity_reply = reply(quote! { #entity_ty });
        handlers.push(Handler {
            method:    method("Post")?,
            suffix:    String::new(),
            operation: "create".into(),
            tokens:    quote! {
                /// `POST` a new entity.
                pub async fn create(&self, body: #entity_ty) -> #entity_reply {
                    self.service.create(body).await.map(#rt::web::Reply::created)
                }
            }
        });
        handlers.push(Handler {
            method:    method("Get")?,
            suffix:    "/{id}".into(),
            operation: "get_by_id".into(),
            tokens:    quote! {
                /// `GET` one entity.
                pub async fn get_by_id(&self, id: #id) -> #entity_reply {
                    self.service.find_by_id(&id).await.map(#rt::web::Reply::ok)
                }
            }
        });
        handlers.push(Handler {
            method:    method("Put")?,
            suffix:    "/{id}".into(),
            operation: "update".into(),
            tokens:    quote! {
                /// `PUT` a replacement entity.
                pub async fn update(&self, id: #id, body: #entity_ty) -> #entity_reply {
                    self.service.update(&id, body).await.map(#rt::web::Reply::ok)
                }
            }
        });
        let empty_reply = reply(quote! { () });
        handlers.push(Handler {
            method:    method("Delete")?,
            suffix:    "/{id}".into(),
            operation: "delete".into(),
            tokens:    quote! {
                /// `DELETE` one entity.
                pub async fn delete(&self, id: #id) -> #empty_reply {
                    self.service.delete(&id).await?;
                    Ok(#rt::web::Reply::no_content())
                }
            }
        });

        if entity.has(Capability::GetOrCreate) {
            handlers.push(Handler {
                method:    method("Post")?,
                suffix:    entity
                    .get_or_create_path
                    .clone()
                    .unwrap_or_else(|| GET_OR_CREATE_PATH.into()),
                operation: "get_or_create".into(),
                tokens:    quote! {
                    /// `POST` a name; the entity with that name, created when absent.
                    pub async fn get_or_create(&self, name: String) -> #entity_reply {
                        self.service.get_or_create(&name).await.map(#rt::web::Reply::ok)
                    }
                }
            });
        }

        for (field, relation) in entity.relations() {
            let Some(endpoints) = &relation.endpoints else {
                continue;
            };
            let suffix = format!("/{{id}}{}", normalize_path(&endpoints.path));
            let operation = ident(&endpoints.method)?;
            if endpoints.read {
                let field_ty = ty(&field.ty.qualified)?;
                let read_reply = reply(quote! { #field_ty });
                let doc = format!(" `GET` `{}` of one entity.", field.name);
                handlers.push(Handler {
                    method:    method("Get")?,
                    suffix:    suffix.clone(),
                    operation: endpoints.method.clone(),
                    tokens:    quote! {
                        #[doc = #doc]
                        pub async fn #operation(&self, id: #id) -> #read_reply {
                            self.service.#operation(&id).await.map(#rt::web::Reply::ok)
                        }
                    }
                });
            }
            if endpoints.add {
                let add = prefixed("add_", &endpoints.method)?;
                let element = ty(&field.ty.qualified_element)?;
                let doc = format!(" `POST` a value into `{}`.", field.name);
                handlers.push(Handler {
                    method:    method("Post")?,
                    suffix:    suffix.clone(),
                    operation: add.to_string(),
                    tokens:    quote! {
                        #[doc = #doc]
                        pub async fn #add(&self, id: #id, body: #element) -> #entity_reply {
                            self.service.#add(&id, body).await.map(#rt::web::Reply::ok)
                        }
                    }
                });
            }
            if endpoints.remove {
                let remove = prefixed("remove_", &endpoints.method)?;
                let doc = format!(" `DELETE` a value from `{}` by its id.", field.name);
                let related = related_id(entity, field, relation, ctx)?;
                handlers.push(Handler {
                    method:    method("Delete")?,
                    suffix:    format!("{suffix}/{{related}}"),
                    operation: remove.to_string(),
                    tokens:    quote! {
                        #[doc = #doc]
                        pub async fn #remove(&self, id: #id, related: #related) -> #entity_reply {
                            self.service.#remove(&id, &related).await.map(#rt::web::Reply::ok)
                        }
                    }
                });
            }
        }

        for endpoint in &entity.endpoints {
            let name = ident(&endpoint.name)?;
            let returns = ty(&endpoint.returns)?;
            let endpoint_reply = reply(quote! { #returns });
            let doc = format!(" `GET` `{}` of one entity.", endpoint.name);
            handlers.push(Handler {
                method:    method("Get")?,
                suffix:    format!("/{{id}}{}", normalize_path(&endpoint.path)),
                operation: endpoint.name.clone(),
                tokens:    quote! {
                    #[doc = #doc]
                    pub async fn #name(&self, id: #id) -> #endpoint_reply {
                        self.service.#name(&id).await.map(#rt::web::Reply::ok)
                    }
                }
            });
        }

        let routes = handlers.iter().map(|h| {
            let Handler {
                method,
                suffix,
                operation,
                ..
            } = h;
            quote! { .route(#method, #suffix, #operation) }
        });
        let tokens = handlers.iter().map(|h| &h.tokens);

        let controller = ident(&plan.type_name)?;
        let doc = format!(" HTTP handlers of [`{}`] below `{base}`.", entity.name);
        let mut unit = SourceUnit::new(plan);
        unit.push(
            FragmentKind::Const,
            "BASE_PATH",
            quote! {
                /// Path every route of this controller starts with.
                pub const BASE_PATH: &str = #base;
            }
        );
        unit.push(
            FragmentKind::Struct,
            plan.type_name.clone(),
            quote! {
                #[doc = #doc]
                #[derive(Debug, Clone)]
                pub struct #controller<R, H = #rt::service::NoHooks> {
                    service: #service<R, H>
                }
            }
        );
        unit.push(
            FragmentKind::Impl,
            format!("{}<R, H>", plan.type_name),
            quote! {
                impl<R, H> #controller<R, H>
                where
                    R: #repository,
                    H: #rt::service::PersistenceHooks<#entity_ty>
                {
                    /// Controller over `service`.
                    pub fn new(service: #service<R, H>) -> Self {
                        Self {
                            service
                        }
                    }

                    /// Wrapped service.
                    pub fn service(&self) -> &#service<R, H> {
                        &self.service
                    }

                    /// Every route of this controller, in mounting order.
                    pub fn routes(&self) -> #rt::web::RouteTable {
                        #rt::web::RouteTable::new(BASE_PATH)
                            #(#routes)*
                    }

                    #(#tokens)*
                }
            }
        );

        Ok(unit)
    }
}

fn related_id(
    entity: &EntityModel,
    field: &FieldModel,
    relation: &Relation,
    ctx: &EmitContext<'_>
) -> Result<syn::Type, EmitError> {
    match relation.storage {
        RelationStorage::Identifier => ty(&field.ty.qualified_element),
        RelationStorage::Embedded => {
            let target = ctx.related(&relation.target)?;
            let target_id = target.id_field().ok_or_else(|| {
                EmitError::Unsupported(format!(
                    "`{}` of `{}` removes by id, but `{}` has no id field",
                    field.name, entity.name, target.name
                ))
            })?;
            ty(&target_id.ty.qualified)
        }
    }
}
