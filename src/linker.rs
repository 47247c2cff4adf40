use meeting_types::{CanonicalEntity, LinkedSpan};
use regex::{Regex, RegexBuilder};

/// One searchable surface form of an entity, with its pattern compiled as
/// an escaped, case-insensitive literal.
struct Variation<'a> {
    pattern: Regex,
    entity: &'a CanonicalEntity,
}

/// Collect every (variation, entity) pair, longest variation first.
///
/// Length-descending order makes "Acme project" win over a bare "Acme"
/// at the same position; within one entity the order of its own
/// variations is preserved by the stable sort.
fn build_variations(entities: &[CanonicalEntity]) -> Vec<Variation<'_>> {
    let mut forms: Vec<(String, &CanonicalEntity)> = Vec::new();
    for entity in entities {
        for variation in entity.variations() {
            // An empty pattern would match at every offset and stall the
            // cursor.
            if variation.trim().is_empty() {
                continue;
            }
            forms.push((variation, entity));
        }
    }

    forms.sort_by_key(|(v, _)| std::cmp::Reverse(v.chars().count()));

    forms
        .into_iter()
        .map(|(variation, entity)| Variation {
            pattern: RegexBuilder::new(&regex::escape(&variation))
                .case_insensitive(true)
                .build()
                .expect("escaped literal pattern"),
            entity,
        })
        .collect()
}

/// Segment `text` into plain and entity-linked spans.
///
/// A single cursor walks the unconsumed suffix. Each step scans every
/// variation for its first match in the remaining text and takes the
/// match with the smallest starting offset; offset ties go to the
/// variation earlier in the length-descending order. The emitted entity
/// span carries the literal matched substring, so concatenating span
/// texts reproduces the input exactly.
///
/// Never fails: entity names containing regex metacharacters are matched
/// literally, and text with no mentions comes back as one plain span.
pub fn link_mentions(text: &str, entities: &[CanonicalEntity]) -> Vec<LinkedSpan> {
    if text.is_empty() {
        return Vec::new();
    }

    let variations = build_variations(entities);
    let mut spans = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let mut winner: Option<(usize, usize, &CanonicalEntity)> = None;

        for variation in &variations {
            if let Some(m) = variation.pattern.find(rest)
                && winner.is_none_or(|(start, _, _)| m.start() < start)
            {
                winner = Some((m.start(), m.end(), variation.entity));
            }
        }

        match winner {
            Some((start, end, entity)) => {
                if start > 0 {
                    spans.push(LinkedSpan::Plain {
                        text: rest[..start].to_string(),
                    });
                }
                spans.push(LinkedSpan::Entity {
                    text: rest[start..end].to_string(),
                    entity: entity.clone(),
                });
                rest = &rest[end..];
            }
            None => {
                spans.push(LinkedSpan::Plain {
                    text: rest.to_string(),
                });
                break;
            }
        }
    }

    spans
}
