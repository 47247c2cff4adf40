use meeting_types::CanonicalEntity;

/// Minimum similarity for a candidate name to claim a directory record.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Find the best fuzzy match for `name` among `directory`.
///
/// Similarity is normalized Levenshtein over lowercased strings, so
/// scores fall in [0, 1] and are comparable within one call. Returns the
/// entity with the maximum score at or above `threshold`, with ties
/// resolved by directory order (the first entity reaching the maximum
/// wins). Read-only; no side effects.
pub fn resolve<'a>(
    name: &str,
    directory: &'a [CanonicalEntity],
    threshold: f64,
) -> Option<(&'a CanonicalEntity, f64)> {
    let needle = name.to_lowercase();
    let mut best: Option<(&CanonicalEntity, f64)> = None;

    for entity in directory {
        let score = strsim::normalized_levenshtein(&needle, &entity.canonical_name.to_lowercase());
        if score >= threshold && best.is_none_or(|(_, s)| score > s) {
            best = Some((entity, score));
        }
    }

    best
}
