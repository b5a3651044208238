// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Convenient re-exports for common usage.
//!
//! # Usage
//!
//! ```rust,ignore
//! use entity_forge_core::prelude::*;
//! ```

#[cfg(feature = "derive")]
pub use crate::{Forge, get_endpoint};
pub use crate::{
    Entity, HasName, HasNameRepository, Page, Pagination, Repository, SortDirection, async_trait,
    config::{BindError, ConfigSource, ConfigValue, MapSource},
    predicate::{Metamodel, Path, Predicate, PredicateBuilder, PredicateExecutor, ToPredicate},
    service::{NoHooks, PersistenceHooks, ServiceError},
    validate::Violations,
    web::{Method, Reply, RouteTable, Status}
};
