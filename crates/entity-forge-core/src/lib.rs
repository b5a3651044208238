// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime traits and helpers for entity-forge.
//!
//! Every artifact written by the `entity-forge` generator compiles against
//! the public items of this crate and nothing else. It can also be used
//! standalone for hand-written storage backends.
//!
//! # Overview
//!
//! - [`Entity`] / [`HasName`] — identity and naming contracts
//! - [`Repository`] / [`HasNameRepository`] — async storage contracts
//! - [`Pagination`] / [`Page`] — list windows
//! - [`predicate`] — predicate composition used by generated filters
//! - [`validate`] — constraint checks used by services and binders
//! - [`config`] — config sources and value coercion for binders
//! - [`service`] — service errors and the get-or-create helper
//! - [`web`] — framework-neutral routes and replies for controllers
//! - [`prelude`] — convenient re-exports
//!
//! # Usage
//!
//! Host crates implement [`Repository`] for their storage and mount the
//! generated tree:
//!
//! ```rust,ignore
//! use entity_forge_core::prelude::*;
//!
//! #[async_trait]
//! impl Repository<Book> for PgStore {
//!     type Error = sqlx::Error;
//!     // ...
//! }
//!
//! let service = crate::generated::service::BookService::new(PgStore::new(pool));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod predicate;
pub mod prelude;
pub mod service;
pub mod validate;
pub mod web;

/// Re-export async_trait for generated code.
pub use async_trait::async_trait;
/// Directive registration: `#[derive(Forge)]` and `#[get_endpoint]`.
#[cfg(feature = "derive")]
pub use entity_forge_derive::{Forge, get_endpoint};

/// Identity contract of a persisted entity.
///
/// Generated repository artifacts implement this trait for every entity that
/// carries a repository, service or controller directive.
///
/// # Example
///
/// ```rust
/// use entity_forge_core::Entity;
///
/// #[derive(Clone)]
/// struct Tag {
///     id:   i64,
///     name: String
/// }
///
/// impl Entity for Tag {
///     type Id = i64;
///     const NAME: &'static str = "Tag";
///
///     fn id(&self) -> &i64 {
///         &self.id
///     }
///
///     fn set_id(&mut self, id: i64) {
///         self.id = id;
///     }
/// }
/// ```
pub trait Entity: Clone + Send + Sync + 'static {
    /// Primary key type.
    type Id: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static;

    /// Simple entity name, used in messages.
    const NAME: &'static str;

    /// Primary key of this instance.
    fn id(&self) -> &Self::Id;

    /// Replace the primary key.
    fn set_id(&mut self, id: Self::Id);
}

/// Entities identified by a human readable, unique name.
pub trait HasName {
    /// Current name.
    fn name(&self) -> &str;

    /// Replace the name.
    fn set_name(&mut self, name: String);
}

/// Base repository trait.
///
/// Generated `{Entity}Repository` traits use this as a supertrait and add
/// [`HasNameRepository`] and [`predicate::PredicateExecutor`] when the
/// entity needs them.
///
/// # Associated Types
///
/// - `Error` — Error type for repository operations
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Error type for repository operations.
    ///
    /// Must implement `std::error::Error + Send + Sync` for async
    /// compatibility.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Find an entity by primary key.
    async fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, Self::Error>;

    /// Check whether an entity with this primary key exists.
    async fn exists_by_id(&self, id: &E::Id) -> Result<bool, Self::Error>;

    /// Insert or replace an entity, returning the stored value.
    async fn save(&self, entity: E) -> Result<E, Self::Error>;

    /// Delete by primary key. Returns `false` when nothing was deleted.
    async fn delete_by_id(&self, id: &E::Id) -> Result<bool, Self::Error>;

    /// Total number of stored entities.
    async fn count(&self) -> Result<u64, Self::Error>;

    /// One page of entities.
    async fn find_page(&self, page: Pagination) -> Result<Page<E>, Self::Error>;
}

/// Name lookups for [`HasName`] entities.
#[async_trait]
pub trait HasNameRepository<E: Entity + HasName>: Repository<E> {
    /// Exact name match exists.
    async fn exists_by_name(&self, name: &str) -> Result<bool, Self::Error>;

    /// Case-insensitive name match exists.
    async fn exists_by_name_ignore_case(&self, name: &str) -> Result<bool, Self::Error>;

    /// Find by exact name.
    async fn find_by_name(&self, name: &str) -> Result<Option<E>, Self::Error>;

    /// Find by case-insensitive name.
    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<E>, Self::Error>;

    /// All entities whose name contains `fragment`.
    async fn find_all_by_name_containing(&self, fragment: &str) -> Result<Vec<E>, Self::Error>;

    /// All entities whose name contains `fragment`, ignoring case.
    async fn find_all_by_name_containing_ignore_case(
        &self,
        fragment: &str
    ) -> Result<Vec<E>, Self::Error>;
}

/// Pagination parameters for list operations.
///
/// # Example
///
/// ```rust
/// use entity_forge_core::Pagination;
///
/// let page = Pagination::new(10, 0); // First 10 items
/// let next = Pagination::new(10, 10); // Next 10 items
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pagination {
    /// Maximum number of results to return.
    pub limit: i64,

    /// Number of results to skip.
    pub offset: i64
}

impl Pagination {
    /// Page size used by generated controllers when the caller sends none.
    pub const DEFAULT_PAGE_SIZE: i64 = 25;

    /// Create new pagination parameters.
    pub const fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset
        }
    }

    /// Create pagination for a specific page.
    ///
    /// # Example
    ///
    /// ```rust
    /// use entity_forge_core::Pagination;
    ///
    /// let page_0 = Pagination::page(0, 25); // offset=0, limit=25
    /// let page_2 = Pagination::page(2, 25); // offset=50, limit=25
    /// ```
    pub const fn page(page: i64, per_page: i64) -> Self {
        Self {
            limit:  per_page,
            offset: page * per_page
        }
    }

    /// Zero-based page index of this window.
    pub const fn page_index(&self) -> i64 {
        if self.limit <= 0 { 0 } else { self.offset / self.limit }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::page(0, Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of results together with the total count.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<E> {
    /// Items of this page.
    pub items: Vec<E>,

    /// Total number of matching items.
    pub total: u64,

    /// Window that produced this page.
    pub pagination: Pagination
}

impl<E> Page<E> {
    /// Build a page.
    pub fn new(items: Vec<E>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            pagination
        }
    }

    /// Slice an in-memory collection into a page.
    pub fn from_all(all: Vec<E>, pagination: Pagination) -> Self {
        let total = all.len() as u64;
        let offset = usize::try_from(pagination.offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(pagination.limit.max(0)).unwrap_or(usize::MAX);
        let items = all.into_iter().skip(offset).take(limit).collect();
        Self::new(items, total, pagination)
    }

    /// Transform the items, keeping counts.
    pub fn map<T>(self, f: impl FnMut(E) -> T) -> Page<T> {
        Page {
            items:      self.items.into_iter().map(f).collect(),
            total:      self.total,
            pagination: self.pagination
        }
    }

    /// Check whether this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,

    /// Descending order (Z-A, 9-0, newest first).
    Desc
}

impl SortDirection {
    /// Lowercase keyword, as used in query strings.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc"
        }
    }
}
