// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Directive registration for entity-forge.
//!
//! The `entity-forge` generator reads directives from host sources at build
//! time. For those sources to compile, rustc must know the directive
//! attributes; this crate registers them and expands to nothing.
//!
//! | Macro                | Registers                                         |
//! |----------------------|---------------------------------------------------|
//! | `#[derive(Forge)]`   | struct and field directives as helper attributes |
//! | `#[get_endpoint]`    | method directive, passes the method through      |
//!
//! ```rust,ignore
//! use entity_forge_core::{Forge, get_endpoint};
//!
//! #[derive(Forge, Clone, Default)]
//! #[repository]
//! #[controller(path = "/books")]
//! pub struct Book {
//!     #[id]
//!     pub id: i64,
//!     #[filter]
//!     pub title: String,
//!     #[relation(kind = many_to_one)]
//!     pub author: Option<Author>,
//! }
//!
//! impl Book {
//!     #[get_endpoint(path = "/reviews")]
//!     pub fn reviews(&self) -> Vec<Review> { /* ... */ }
//! }
//! ```

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]
#![deny(unsafe_code)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, ImplItemFn, parse_macro_input};

/// Registers entity-forge struct and field directives.
///
/// Expands to nothing; the generator reads the directives from source.
#[proc_macro_derive(
    Forge,
    attributes(
        repository,
        service,
        controller,
        get_or_create,
        config_binding,
        id,
        transient,
        filter,
        relation,
        endpoints,
        validate,
        config_key
    )
)]
pub fn derive_forge(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match &input.data {
        syn::Data::Struct(_) => TokenStream::new(),
        _ => syn::Error::new_spanned(&input.ident, "Forge can only be derived for structs")
            .to_compile_error()
            .into()
    }
}

/// Marks an inherent method as a read endpoint of its entity.
///
/// The method is emitted unchanged.
#[proc_macro_attribute]
pub fn get_endpoint(_args: TokenStream, item: TokenStream) -> TokenStream {
    let method = parse_macro_input!(item as ImplItemFn);
    quote!(#method).into()
}
