// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository artifact.
//!
//! # Generated Code
//!
//! For `crate::model::Book` with a `name: String` field and a planned
//! filter:
//!
//! ```rust,ignore
//! impl ::entity_forge_core::Entity for crate::model::Book {
//!     type Id = u64;
//!     const NAME: &'static str = "Book";
//!     fn id(&self) -> &Self::Id { &self.id }
//!     fn set_id(&mut self, id: Self::Id) { self.id = id; }
//! }
//!
//! impl ::entity_forge_core::HasName for crate::model::Book { .. }
//!
//! pub trait BookRepository:
//!     Repository<Book> + HasNameRepository<Book> + PredicateExecutor<Book> {}
//! impl<T> BookRepository for T where T: .. + ?Sized {}
//!
//! pub const RELATIONS: &[&str] = &["crate::model::Author"];
//! ```

use quote::quote;

use super::{
    EmitContext, EmitError, Emitter, FragmentKind, SourceUnit,
    names::{entity_path, field_ident, ident, runtime, ty}
};
use crate::{
    model::EntityModel,
    plan::{ArtifactKind, ArtifactPlan},
    schema::Capability
};

/// Emits `{E}Repository` and the entity trait impls.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoryEmitter;

impl Emitter for RepositoryEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Repository
    }

    fn emit(
        &self,
        entity: &EntityModel,
        plan: &ArtifactPlan,
        ctx: &EmitContext<'_>
    ) -> Result<SourceUnit, EmitError> {
        let rt = runtime();
        let entity_ty = entity_path(entity)?;
        let simple = entity.simple_name();
        let mut unit = SourceUnit::new(plan);

        let id = entity
            .id_field()
            .ok_or_else(|| EmitError::Unsupported(format!("`{}` has no id field", entity.name)))?;
        let id_ident = field_ident(entity, id)?;
        let id_ty = ty(&id.ty.qualified)?;

        unit.push(
            FragmentKind::Impl,
            "Entity",
            quote! {
                impl #rt::Entity for #entity_ty {
                    type Id = #id_ty;

                    const NAME: &'static str = #simple;

                    fn id(&self) -> &Self::Id {
                        &self.#id_ident
                    }

                    fn set_id(&mut self, id: Self::Id) {
                        self.#id_ident = id;
                    }
                }
            }
        );

        let mut bounds = vec![quote! { #rt::Repository<#entity_ty> }];

        if entity.has(Capability::HasName)
            && let Some(name) = entity.field("name")
        {
            let name_ident = field_ident(entity, name)?;
            unit.push(
                FragmentKind::Impl,
                "HasName",
                quote! {
                    impl #rt::HasName for #entity_ty {
                        fn name(&self) -> &str {
                            &self.#name_ident
                        }

                        fn set_name(&mut self, name: String) {
                            self.#name_ident = name;
                        }
                    }
                }
            );
            bounds.push(quote! { #rt::HasNameRepository<#entity_ty> });
        }

        if ctx.is_planned(&entity.name, ArtifactKind::PredicateBuilder) {
            bounds.push(quote! { #rt::predicate::PredicateExecutor<#entity_ty> });
        }

        let trait_ident = ident(&plan.type_name)?;
        let doc = format!(" Storage contract of [`{}`].", entity.name);
        let blanket_doc = format!(" Every store satisfying the bounds is a `{}`.", plan.type_name);
        unit.push(
            FragmentKind::Trait,
            plan.type_name.clone(),
            quote! {
                #[doc = #doc]
                pub trait #trait_ident: #(#bounds)+* {}
            }
        );
        unit.push(
            FragmentKind::Impl,
            format!("{} for T", plan.type_name),
            quote! {
                #[doc = #blanket_doc]
                impl<T> #trait_ident for T where T: #(#bounds)+* + ?Sized {}
            }
        );

        let related: Vec<String> = entity.related().iter().map(ToString::to_string).collect();
        let relations_doc = format!(" Entities related to `{simple}`, by qualified name.");
        unit.push(
            FragmentKind::Const,
            "RELATIONS",
            quote! {
                #[doc = #relations_doc]
                pub const RELATIONS: &[&str] = &[#(#related),*];
            }
        );

        Ok(unit)
    }
}
