use meeting_types::{EntityKind, Resolution, ResolvedMention};

use crate::directory::{DirectoryError, DirectoryStore, EntityDirectory};
use crate::extract::NameExtractor;
use crate::registrar::EntityRegistrar;
use crate::resolver;

/// Extract candidate person names from `text` and resolve each against
/// the people directory.
///
/// Candidates iterate in lexicographic order. A hit joins `resolved` with
/// its similarity score; a miss is created (score 1.0) when
/// `create_missing` is set, otherwise it joins `unresolved`. A failed
/// creation moves that one name to `unresolved` without aborting the
/// rest.
pub async fn resolve_in_text<S: DirectoryStore>(
    extractor: &NameExtractor,
    directory: &EntityDirectory<S>,
    text: &str,
    create_missing: bool,
) -> Result<Resolution, DirectoryError> {
    let candidates = extractor.extract(text);
    tracing::debug!(count = candidates.len(), ?candidates, "extracted candidate names");

    let registrar = EntityRegistrar::new(directory);
    let mut resolution = Resolution::default();

    for candidate in candidates {
        // Re-list every round: a creation below invalidates the cache, so
        // later candidates see entities created earlier in this pass.
        let people = directory.list(EntityKind::Person, false).await?;

        match resolver::resolve(&candidate, &people, resolver::DEFAULT_THRESHOLD) {
            Some((entity, score)) => {
                tracing::debug!(%candidate, matched = %entity.canonical_name, score, "resolved");
                resolution.resolved.push(ResolvedMention {
                    candidate,
                    entity: entity.clone(),
                    score,
                });
            }
            None if create_missing => {
                match registrar.create_if_missing(&candidate, EntityKind::Person).await {
                    Ok(entity) => resolution.resolved.push(ResolvedMention {
                        candidate,
                        entity,
                        score: 1.0,
                    }),
                    Err(error) => {
                        tracing::warn!(%error, "registration failed");
                        resolution.unresolved.push(candidate);
                    }
                }
            }
            None => resolution.unresolved.push(candidate),
        }
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use meeting_types::{EntityPage, RawEntity};
    use std::sync::Mutex;

    struct FakeStore {
        records: Mutex<Vec<RawEntity>>,
        rejected_names: Vec<String>,
    }

    impl FakeStore {
        fn with_names(names: &[&str]) -> Self {
            let records = names
                .iter()
                .enumerate()
                .map(|(i, n)| RawEntity {
                    id: format!("id-{i}"),
                    name: Some((*n).to_string()),
                })
                .collect();
            Self {
                records: Mutex::new(records),
                rejected_names: Vec::new(),
            }
        }
    }

    impl DirectoryStore for FakeStore {
        async fn fetch_page(
            &self,
            _kind: EntityKind,
            _cursor: Option<&str>,
        ) -> Result<EntityPage, StoreError> {
            Ok(EntityPage {
                records: self.records.lock().unwrap().clone(),
                next_cursor: None,
            })
        }

        async fn create(&self, _kind: EntityKind, name: &str) -> Result<RawEntity, StoreError> {
            if self.rejected_names.iter().any(|n| n == name) {
                return Err(StoreError::Api {
                    status: 400,
                    message: "rejected".into(),
                });
            }
            let mut records = self.records.lock().unwrap();
            let raw = RawEntity {
                id: format!("new-{}", records.len()),
                name: Some(name.to_string()),
            };
            records.push(raw.clone());
            Ok(raw)
        }
    }

    const TRANSCRIPT: &str = "Attendees: Aaron, Darren, Susanna\n\
                              Aaron: kickoff notes.\n";

    #[tokio::test]
    async fn known_names_resolve_and_unknown_are_created() {
        let directory = EntityDirectory::new(FakeStore::with_names(&["Aaron", "Darren"]));
        let extractor = NameExtractor::new();

        let result = resolve_in_text(&extractor, &directory, TRANSCRIPT, true)
            .await
            .unwrap();

        assert!(result.unresolved.is_empty());
        let names: Vec<&str> = result.resolved.iter().map(|m| m.candidate.as_str()).collect();
        // Lexicographic candidate order keeps output reproducible.
        assert_eq!(names, vec!["Aaron", "Darren", "Susanna"]);
        // Susanna did not exist and was created.
        assert!(result.resolved[2].entity.id.starts_with("new-"));
        assert!((result.resolved[2].score - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn without_creation_misses_are_reported_unresolved() {
        let directory = EntityDirectory::new(FakeStore::with_names(&["Aaron"]));
        let extractor = NameExtractor::new();

        let result = resolve_in_text(&extractor, &directory, TRANSCRIPT, false)
            .await
            .unwrap();

        assert_eq!(result.resolved.len(), 1);
        assert_eq!(result.unresolved, vec!["Darren".to_string(), "Susanna".to_string()]);
    }

    #[tokio::test]
    async fn one_failed_creation_does_not_abort_the_rest() {
        let mut store = FakeStore::with_names(&[]);
        store.rejected_names.push("Darren".into());
        let directory = EntityDirectory::new(store);
        let extractor = NameExtractor::new();

        let result = resolve_in_text(&extractor, &directory, TRANSCRIPT, true)
            .await
            .unwrap();

        assert_eq!(result.unresolved, vec!["Darren".to_string()]);
        let created: Vec<&str> = result.resolved.iter().map(|m| m.candidate.as_str()).collect();
        assert_eq!(created, vec!["Aaron", "Susanna"]);
    }

    #[tokio::test]
    async fn entities_created_this_pass_serve_later_candidates() {
        let directory = EntityDirectory::new(FakeStore::with_names(&[]));
        let extractor = NameExtractor::new();

        // "Aarons" is a near-duplicate of "Aaron"; it must match the
        // record created earlier in the same pass rather than create a
        // second one.
        let text = "Attendees: Aaron, Aarons\n";
        let result = resolve_in_text(&extractor, &directory, text, true)
            .await
            .unwrap();

        assert_eq!(result.resolved.len(), 2);
        assert_eq!(result.resolved[0].entity.id, result.resolved[1].entity.id);
    }

    #[tokio::test]
    async fn empty_text_yields_empty_resolution() {
        let directory = EntityDirectory::new(FakeStore::with_names(&["Aaron"]));
        let extractor = NameExtractor::new();

        let result = resolve_in_text(&extractor, &directory, "", true).await.unwrap();
        assert!(result.resolved.is_empty());
        assert!(result.unresolved.is_empty());
    }
}
