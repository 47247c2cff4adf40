use meeting_types::{CanonicalEntity, EntityKind};
use thiserror::Error;

use crate::directory::{DirectoryStore, EntityDirectory};
use crate::store::StoreError;

/// The store rejected a create call; the candidate stays unresolved and
/// no cache is invalidated.
#[derive(Debug, Error)]
#[error("could not register {kind} {name:?}: {source}")]
pub struct RegistrationError {
    pub name: String,
    pub kind: EntityKind,
    #[source]
    pub source: StoreError,
}

/// Creates canonical records for names the resolver could not place.
///
/// Two rapid calls for the same unknown name may both create a record;
/// the store owns identity and the next directory reload surfaces both.
/// No create-if-absent locking is attempted here.
pub struct EntityRegistrar<'a, S> {
    directory: &'a EntityDirectory<S>,
}

impl<'a, S: DirectoryStore> EntityRegistrar<'a, S> {
    pub fn new(directory: &'a EntityDirectory<S>) -> Self {
        Self { directory }
    }

    /// Create a canonical record for `name` and invalidate the directory
    /// cache for `kind` so the next read observes it.
    pub async fn create_if_missing(
        &self,
        name: &str,
        kind: EntityKind,
    ) -> Result<CanonicalEntity, RegistrationError> {
        let raw = self
            .directory
            .store()
            .create(kind, name)
            .await
            .map_err(|source| RegistrationError {
                name: name.to_string(),
                kind,
                source,
            })?;

        let canonical_name = raw.name.unwrap_or_else(|| name.to_string());
        let entity = CanonicalEntity::new(raw.id, kind, canonical_name);

        self.directory.invalidate(kind).await;
        tracing::info!(kind = %kind, name = %entity.canonical_name, id = %entity.id, "registered new entity");
        Ok(entity)
    }
}
