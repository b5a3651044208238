// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Service-layer support for generated `{Entity}Service` types.
//!
//! # Persistence Hooks
//!
//! Generated services call a [`PersistenceHooks`] implementation around every
//! mutation. [`NoHooks`] is the default:
//!
//! ```text
//! create:  before_create(&mut e) -> validate -> save -> after_create(&e)
//! update:  before_update(&mut e) -> validate -> save -> after_update(&e)
//! delete:  before_delete(&id)    -> delete_by_id     -> after_delete(&id)
//! ```

use async_trait::async_trait;

use crate::{Entity, HasName, HasNameRepository, validate::Violations, web::Status};

/// Error returned by generated service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError<E: std::error::Error + 'static> {
    /// No entity with the requested id.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Debug rendering of the id.
        id:     String
    },

    /// Name already taken.
    #[error("{entity} named `{name}` already exists")]
    Conflict {
        /// Entity name.
        entity: &'static str,
        /// Conflicting name.
        name:   String
    },

    /// Constraint violations.
    #[error(transparent)]
    Invalid(Violations),

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[source] E)
}

impl<E: std::error::Error + 'static> ServiceError<E> {
    /// Not-found error for an id.
    pub fn not_found(entity: &'static str, id: &impl std::fmt::Debug) -> Self {
        Self::NotFound {
            entity,
            id: format!("{id:?}")
        }
    }

    /// Conflict error for a name.
    pub fn conflict(entity: &'static str, name: &str) -> Self {
        Self::Conflict {
            entity,
            name: name.to_owned()
        }
    }

    /// Wrap a storage error.
    pub fn repository(error: E) -> Self {
        Self::Repository(error)
    }

    /// HTTP status a controller replies with.
    pub const fn status(&self) -> Status {
        match self {
            Self::NotFound {
                ..
            } => Status::NOT_FOUND,
            Self::Conflict {
                ..
            } => Status::CONFLICT,
            Self::Invalid(_) => Status::UNPROCESSABLE_ENTITY,
            Self::Repository(_) => Status::INTERNAL_SERVER_ERROR
        }
    }

    /// Check for [`ServiceError::NotFound`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Callbacks around service mutations.
#[async_trait]
pub trait PersistenceHooks<E: Entity>: Send + Sync {
    /// Before a new entity is validated and saved.
    async fn before_create(&self, _entity: &mut E) {}

    /// After a new entity was saved.
    async fn after_create(&self, _entity: &E) {}

    /// Before an existing entity is validated and saved.
    async fn before_update(&self, _entity: &mut E) {}

    /// After an existing entity was saved.
    async fn after_update(&self, _entity: &E) {}

    /// Before an entity is deleted.
    async fn before_delete(&self, _id: &E::Id) {}

    /// After an entity was deleted.
    async fn after_delete(&self, _id: &E::Id) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoHooks;

impl<E: Entity> PersistenceHooks<E> for NoHooks {}

/// Find an entity by name ignoring case, creating it when absent.
///
/// When the save fails (for example because a concurrent caller inserted the
/// same name) the lookup is retried once before the storage error is
/// returned.
pub async fn get_or_create<E, R>(repository: &R, name: &str) -> Result<E, R::Error>
where
    E: Entity + HasName + Default,
    R: HasNameRepository<E> + ?Sized
{
    if let Some(found) = repository.find_by_name_ignore_case(name).await? {
        return Ok(found);
    }

    let mut entity = E::default();
    entity.set_name(name.to_owned());

    match repository.save(entity).await {
        Ok(saved) => Ok(saved),
        Err(error) => match repository.find_by_name_ignore_case(name).await {
            Ok(Some(found)) => Ok(found),
            _ => Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering}
    };

    use super::*;
    use crate::{Page, Pagination, Repository};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Tag {
        id:   i64,
        name: String
    }

    impl Entity for Tag {
        type Id = i64;
        const NAME: &'static str = "Tag";

        fn id(&self) -> &i64 {
            &self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
    }

    impl HasName for Tag {
        fn name(&self) -> &str {
            &self.name
        }

        fn set_name(&mut self, name: String) {
            self.name = name;
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("store failure")]
    struct StoreError;

    #[derive(Default)]
    struct Store {
        rows:       Mutex<Vec<Tag>>,
        fail_saves: AtomicBool,
        race_name:  Mutex<Option<String>>
    }

    #[async_trait]
    impl Repository<Tag> for Store {
        type Error = StoreError;

        async fn find_by_id(&self, id: &i64) -> Result<Option<Tag>, StoreError> {
            Ok(self.rows.lock().unwrap().iter().find(|t| t.id == *id).cloned())
        }

        async fn exists_by_id(&self, id: &i64) -> Result<bool, StoreError> {
            Ok(self.find_by_id(id).await?.is_some())
        }

        async fn save(&self, mut entity: Tag) -> Result<Tag, StoreError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                if let Some(name) = self.race_name.lock().unwrap().take() {
                    self.rows.lock().unwrap().push(Tag {
                        id: 99,
                        name
                    });
                }
                return Err(StoreError);
            }
            let mut rows = self.rows.lock().unwrap();
            entity.id = rows.len() as i64 + 1;
            rows.push(entity.clone());
            Ok(entity)
        }

        async fn delete_by_id(&self, id: &i64) -> Result<bool, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|t| t.id != *id);
            Ok(rows.len() != before)
        }

        async fn count(&self) -> Result<u64, StoreError> {
            Ok(self.rows.lock().unwrap().len() as u64)
        }

        async fn find_page(&self, page: Pagination) -> Result<Page<Tag>, StoreError> {
            Ok(Page::from_all(self.rows.lock().unwrap().clone(), page))
        }
    }

    #[async_trait]
    impl HasNameRepository<Tag> for Store {
        async fn exists_by_name(&self, name: &str) -> Result<bool, StoreError> {
            Ok(self.find_by_name(name).await?.is_some())
        }

        async fn exists_by_name_ignore_case(&self, name: &str) -> Result<bool, StoreError> {
            Ok(self.find_by_name_ignore_case(name).await?.is_some())
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, StoreError> {
            Ok(self.rows.lock().unwrap().iter().find(|t| t.name == name).cloned())
        }

        async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<Tag>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(name))
                .cloned())
        }

        async fn find_all_by_name_containing(&self, fragment: &str) -> Result<Vec<Tag>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.name.contains(fragment))
                .cloned()
                .collect())
        }

        async fn find_all_by_name_containing_ignore_case(
            &self,
            fragment: &str
        ) -> Result<Vec<Tag>, StoreError> {
            let fragment = fragment.to_lowercase();
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.name.to_lowercase().contains(&fragment))
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn get_or_create_creates_once() {
        let store = Store::default();
        let first: Tag = get_or_create(&store, "rust").await.unwrap();
        let second: Tag = get_or_create(&store, "RUST").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_or_create_recovers_from_concurrent_insert() {
        let store = Store::default();
        store.fail_saves.store(true, Ordering::SeqCst);
        *store.race_name.lock().unwrap() = Some("Rust".to_owned());

        let tag: Tag = get_or_create(&store, "rust").await.unwrap();
        assert_eq!(tag.id, 99);
    }

    #[tokio::test]
    async fn get_or_create_reports_save_error() {
        let store = Store::default();
        store.fail_saves.store(true, Ordering::SeqCst);
        let result: Result<Tag, _> = get_or_create(&store, "rust").await;
        assert!(result.is_err());
    }

    #[test]
    fn error_status_mapping() {
        let err = ServiceError::<StoreError>::not_found("Tag", &7_i64);
        assert_eq!(err.status(), Status::NOT_FOUND);
        assert_eq!(err.to_string(), "Tag with id 7 not found");
        assert_eq!(
            ServiceError::<StoreError>::conflict("Tag", "rust").status(),
            Status::CONFLICT
        );
        assert_eq!(
            ServiceError::repository(StoreError).status(),
            Status::INTERNAL_SERVER_ERROR
        );
    }
}
