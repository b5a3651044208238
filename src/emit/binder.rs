// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Configuration binder artifact.
//!
//! `{E}Binder::bind` builds an entity from a `ConfigSource`. Keys are
//! `{prefix}.{key}`; the prefix comes from `#[config_binding(prefix)]` and
//! falls back to the snake-case type name.
//!
//! | Field                       | Read with                     |
//! |-----------------------------|-------------------------------|
//! | `Option<T>`                 | `optional`                    |
//! | `#[config_key(default)]`    | `or_default_str`              |
//! | anything else               | `required`                    |
//! | transient or relation       | `Default::default()`          |
//!
//! Declared constraints are checked after binding; violations become
//! `BindError::Invalid`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{
    EmitContext, EmitError, Emitter, FragmentKind, SourceUnit,
    checks::constraint_checks,
    names::{entity_path, field_ident, ident, runtime}
};
use crate::{
    model::{EntityModel, FieldModel},
    naming::file_stem,
    plan::{ArtifactKind, ArtifactPlan}
};

/// Emits `{E}Binder`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinderEmitter;

impl Emitter for BinderEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::ConfigBinder
    }

    fn emit(
        &self,
        entity: &EntityModel,
        plan: &ArtifactPlan,
        _ctx: &EmitContext<'_>
    ) -> Result<SourceUnit, EmitError> {
        let rt = runtime();
        let entity_ty = entity_path(entity)?;
        let prefix = entity
            .config_prefix
            .clone()
            .unwrap_or_else(|| file_stem(entity.simple_name()));

        let mut inits = Vec::new();
        let mut keys = Vec::new();
        for field in &entity.fields {
            let name = field_ident(entity, field)?;
            if !bindable(field) {
                inits.push(quote! { #name: ::std::default::Default::default() });
                continue;
            }
            check_coercible(entity, field)?;
            let key = config_key(&prefix, &field.config_key.name);
            let read = read(field, &key);
            inits.push(quote! { #name: #read });
            keys.push(key);
        }

        let value = format_ident!("value");
        let checks = constraint_checks(entity, &value)?;
        let validate = if checks.is_empty() {
            TokenStream::new()
        } else {
            quote! {
                let mut violations = #rt::validate::Violations::new();
                #(#checks)*
                violations.into_result()?;
            }
        };

        let binder = ident(&plan.type_name)?;
        let doc = format!(" Binds [`{}`] from configuration keys below `{prefix}`.", entity.name);
        let mut unit = SourceUnit::new(plan);
        unit.push(
            FragmentKind::Const,
            "KEYS",
            quote! {
                /// Every key the binder reads, in field order.
                pub const KEYS: &[&str] = &[#(#keys),*];
            }
        );
        unit.push(
            FragmentKind::Struct,
            plan.type_name.clone(),
            quote! {
                #[doc = #doc]
                #[derive(Debug, Clone, Copy, Default)]
                pub struct #binder;
            }
        );
        unit.push(
            FragmentKind::Impl,
            plan.type_name.clone() + " impl",
            quote! {
                impl #binder {
                    /// Read every bound field, then check declared constraints.
                    pub fn bind(
                        source: &impl #rt::config::ConfigSource
                    ) -> Result<#entity_ty, #rt::config::BindError> {
                        let #value = #entity_ty {
                            #(#inits),*
                        };
                        #validate
                        Ok(#value)
                    }
                }
            }
        );

        Ok(unit)
    }
}

/// Fields read from configuration; the rest take their default.
fn bindable(field: &FieldModel) -> bool {
    !field.transient && field.relation.is_none()
}

fn config_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

fn read(field: &FieldModel, key: &str) -> TokenStream {
    let rt = runtime();
    match (&field.config_key.default, field.nullable()) {
        (Some(default), nullable) => {
            let default = default.to_literal_text();
            let read = quote! { #rt::config::or_default_str(source, #key, #default)? };
            if nullable { quote! { Some(#read) } } else { read }
        }
        (None, true) => quote! { #rt::config::optional(source, #key)? },
        (None, false) => quote! { #rt::config::required(source, #key)? }
    }
}

/// Reject element types that configuration values cannot coerce into.
fn check_coercible(entity: &EntityModel, field: &FieldModel) -> Result<(), EmitError> {
    let vec_only = !field.ty.collection || {
        let compact: String = field.ty.qualified.split_whitespace().collect();
        compact.starts_with("Vec<") || compact.starts_with("Option<Vec<")
    };
    if field.ty.kind.is_scalar() && vec_only {
        return Ok(());
    }
    Err(EmitError::Unsupported(format!(
        "`{}` of `{}` has type `{}`, which configuration values cannot be coerced into",
        field.name, entity.name, field.ty.rendered
    )))
}
