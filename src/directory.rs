use std::future::Future;

use meeting_types::{CanonicalEntity, EntityKind, EntityPage, RawEntity};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::store::StoreError;

/// Read/create access to one canonical-entity database per kind.
///
/// The seam between the resolution engine and the document store: the
/// production implementation speaks HTTP, tests substitute an in-memory
/// store.
pub trait DirectoryStore {
    /// Fetch one listing page, continuing from `cursor` when given.
    fn fetch_page(
        &self,
        kind: EntityKind,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<EntityPage, StoreError>>;

    /// Create a new record titled `name` in the database for `kind`.
    fn create(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> impl Future<Output = Result<RawEntity, StoreError>>;
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A listing fetch failed partway; any previously cached listing is
    /// left untouched.
    #[error("entity directory unavailable: {0}")]
    Unavailable(#[source] StoreError),
}

#[derive(Default)]
struct CacheState {
    loaded: bool,
    entities: Vec<CanonicalEntity>,
}

/// Lazily-populated, invalidate-on-write cache over the canonical entity
/// databases. Each kind's cache sits behind its own mutex, so a load and
/// an invalidation for the same kind serialize: `list` either returns a
/// fully-loaded snapshot or performs exactly one reload.
pub struct EntityDirectory<S> {
    store: S,
    people: Mutex<CacheState>,
    projects: Mutex<CacheState>,
}

impl<S: DirectoryStore> EntityDirectory<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            people: Mutex::new(CacheState::default()),
            projects: Mutex::new(CacheState::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn cache(&self, kind: EntityKind) -> &Mutex<CacheState> {
        match kind {
            EntityKind::Person => &self.people,
            EntityKind::Project => &self.projects,
        }
    }

    /// List every canonical entity of `kind`, loading from the store on
    /// first access or after invalidation. The cached sequence is only
    /// replaced once a full pagination succeeds.
    pub async fn list(
        &self,
        kind: EntityKind,
        force_refresh: bool,
    ) -> Result<Vec<CanonicalEntity>, DirectoryError> {
        let mut cache = self.cache(kind).lock().await;
        if cache.loaded && !force_refresh {
            return Ok(cache.entities.clone());
        }

        let entities = self
            .load_all(kind)
            .await
            .map_err(DirectoryError::Unavailable)?;
        cache.entities = entities;
        cache.loaded = true;
        Ok(cache.entities.clone())
    }

    /// Mark the cache for `kind` unloaded; the next `list` reloads it.
    pub async fn invalidate(&self, kind: EntityKind) {
        let mut cache = self.cache(kind).lock().await;
        cache.loaded = false;
    }

    async fn load_all(&self, kind: EntityKind) -> Result<Vec<CanonicalEntity>, StoreError> {
        let mut entities = Vec::new();
        let mut cursor: Option<String> = None;
        let mut skipped = 0usize;

        loop {
            let page = self.store.fetch_page(kind, cursor.as_deref()).await?;
            for raw in page.records {
                match raw.name {
                    Some(name) => entities.push(CanonicalEntity::new(raw.id, kind, name)),
                    None => {
                        skipped += 1;
                        tracing::warn!(id = %raw.id, kind = %kind, "record has no title, skipping");
                    }
                }
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!(kind = %kind, count = entities.len(), skipped, "loaded entity directory");
        Ok(entities)
    }
}
