use serde::{Deserialize, Serialize};

// ── Canonical entities ───────────────────────────────────────────────────

/// The kind of canonical directory record a mention can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Project,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Project => "project",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authoritative directory record owned by the document store.
///
/// The store issues the `id`; this process never mutates or deletes the
/// record, it only reads it (via the directory cache) and links to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub id: String,
    pub kind: EntityKind,
    pub canonical_name: String,
}

impl CanonicalEntity {
    pub fn new(id: impl Into<String>, kind: EntityKind, canonical_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            canonical_name: canonical_name.into(),
        }
    }

    /// Alternate surface forms used to detect a mention of this entity in
    /// running text. Derived deterministically from the canonical name and
    /// kind; always non-empty for a non-empty name.
    pub fn variations(&self) -> Vec<String> {
        let name = &self.canonical_name;
        match self.kind {
            EntityKind::Person => vec![name.clone()],
            EntityKind::Project => vec![
                name.clone(),
                format!("{name} project"),
                format!("the {name} project"),
            ],
        }
    }
}

// ── Raw store records ────────────────────────────────────────────────────

/// A single listing record as the store reports it. `name: None` means the
/// record lacks a usable title and is skipped during directory loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One page of a cursor-paginated directory listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityPage {
    pub records: Vec<RawEntity>,
    /// Continuation cursor; `None` means the listing is exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

// ── Resolution results ───────────────────────────────────────────────────

/// An extracted candidate name mapped to its canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMention {
    /// The raw extracted name, as it appeared in the text.
    pub candidate: String,
    pub entity: CanonicalEntity,
    /// The similarity score that produced the match (1.0 for freshly
    /// created entities).
    pub score: f64,
}

/// The outcome of resolving every candidate name found in a text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolved: Vec<ResolvedMention>,
    /// Candidates that matched nothing above threshold and were not created.
    pub unresolved: Vec<String>,
}

// ── Linked spans ─────────────────────────────────────────────────────────

/// A contiguous slice of output text, either plain or entity-linked.
///
/// Concatenating the `text` of a span sequence in order reproduces the
/// original input exactly; an entity span's text is the literal matched
/// substring (original casing), not the canonical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkedSpan {
    Plain { text: String },
    Entity { text: String, entity: CanonicalEntity },
}

impl LinkedSpan {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Entity { text, .. } => text,
        }
    }
}

// ── Structured meeting summaries ─────────────────────────────────────────

/// A task extracted from a meeting, with optional attribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// The summarizer's structured view of one meeting transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredMeeting {
    #[serde(default)]
    pub title: String,
    /// ISO-8601 date string; empty when the transcript carries no date.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub meeting_type: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_variations_are_just_the_name() {
        let e = CanonicalEntity::new("id-1", EntityKind::Person, "Sam Lee");
        assert_eq!(e.variations(), vec!["Sam Lee".to_string()]);
    }

    #[test]
    fn project_variations_include_phrase_forms() {
        let e = CanonicalEntity::new("id-2", EntityKind::Project, "Acme");
        assert_eq!(
            e.variations(),
            vec![
                "Acme".to_string(),
                "Acme project".to_string(),
                "the Acme project".to_string(),
            ]
        );
    }

    #[test]
    fn variations_are_deterministic() {
        let a = CanonicalEntity::new("x", EntityKind::Project, "Gaia");
        let b = CanonicalEntity::new("y", EntityKind::Project, "Gaia");
        assert_eq!(a.variations(), b.variations());
    }

    #[test]
    fn linked_span_serializes_tagged() {
        let span = LinkedSpan::Plain {
            text: "hello".into(),
        };
        let json = serde_json::to_value(&span).unwrap();
        assert_eq!(json["type"], "plain");
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn structured_meeting_tolerates_missing_fields() {
        let m: StructuredMeeting = serde_json::from_str(r#"{"title": "Standup"}"#).unwrap();
        assert_eq!(m.title, "Standup");
        assert!(m.attendees.is_empty());
        assert!(m.action_items.is_empty());
    }

    #[test]
    fn action_item_roundtrip() {
        let item = ActionItem {
            task: "Ship the build".into(),
            assignee: Some("Sarah".into()),
            due_date: None,
        };
        let json = serde_json::to_string(&item).unwrap();
        let back: ActionItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
        assert!(!json.contains("due_date"));
    }
}
