// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Constraint checks shared by services and binders.

use proc_macro2::{Ident, TokenStream};
use quote::quote;

use super::{
    EmitError,
    names::{field_ident, float, int, length}
};
use crate::model::{Constraint, EntityModel, TypeKind};

/// Statements recording every violated constraint of `value` into a
/// `violations` binding. Empty when the entity declares no constraints.
pub fn constraint_checks(entity: &EntityModel, value: &Ident) -> Result<Vec<TokenStream>, EmitError> {
    let mut out = Vec::new();

    for field in entity.persistent_fields().filter(|f| !f.constraints.is_empty()) {
        let ident = field_ident(entity, field)?;
        let label = &field.name;

        for constraint in &field.constraints {
            let check = match constraint {
                Constraint::NotBlank => quote! { violations.check_not_blank(#label, v) },
                Constraint::MinLength(n) => {
                    let n = length(*n);
                    quote! { violations.check_min_length(#label, v, #n) }
                }
                Constraint::MaxLength(n) => {
                    let n = length(*n);
                    quote! { violations.check_max_length(#label, v, #n) }
                }
                Constraint::Min(n) => {
                    let n = bound(&field.ty.kind, *n);
                    quote! { violations.check_min(#label, *v, #n) }
                }
                Constraint::Max(n) => {
                    let n = bound(&field.ty.kind, *n);
                    quote! { violations.check_max(#label, *v, #n) }
                }
            };

            out.push(if field.nullable() {
                quote! {
                    if let Some(v) = &#value.#ident {
                        #check;
                    }
                }
            } else {
                quote! {
                    {
                        let v = &#value.#ident;
                        #check;
                    }
                }
            });
        }
    }

    Ok(out)
}

fn bound(kind: &TypeKind, n: i64) -> TokenStream {
    if *kind == TypeKind::Float { float(n) } else { int(n) }
}
