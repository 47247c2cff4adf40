//! Turns linked spans and structured meetings into store payloads.

use meeting_types::{CanonicalEntity, LinkedSpan, StructuredMeeting};

use crate::linker::link_mentions;
use crate::store::{Block, RichTextRun};

/// Store limit on the content of one rich-text run.
const RUN_CHUNK: usize = 2000;

/// Build the share URL for an entity page: dashes stripped, appended to
/// the configured page base.
pub fn entity_url(page_base: &str, entity_id: &str) -> String {
    format!(
        "{}/{}",
        page_base.trim_end_matches('/'),
        entity_id.replace('-', "")
    )
}

/// Serialize spans into rich-text runs; entity spans become hyperlinks to
/// their canonical pages.
pub fn spans_to_rich_text(spans: &[LinkedSpan], page_base: &str) -> Vec<RichTextRun> {
    spans
        .iter()
        .filter(|span| !span.text().is_empty())
        .map(|span| match span {
            LinkedSpan::Plain { text } => RichTextRun::plain(text.clone()),
            LinkedSpan::Entity { text, entity } => {
                RichTextRun::linked(text.clone(), entity_url(page_base, &entity.id))
            }
        })
        .collect()
}

/// Link mentions in `text` and serialize the result in one step.
pub fn linked_runs(
    text: &str,
    entities: &[CanonicalEntity],
    page_base: &str,
) -> Vec<RichTextRun> {
    spans_to_rich_text(&link_mentions(text, entities), page_base)
}

/// Split text into chunks of at most `max_chars` characters, respecting
/// character boundaries.
fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let split = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(i, _)| i);
        chunks.push(&rest[..split]);
        rest = &rest[split..];
    }
    chunks
}

/// Plain rich-text runs for a long string, chunked at the store's limit.
pub fn chunked_runs(text: &str) -> Vec<RichTextRun> {
    chunk_text(text, RUN_CHUNK)
        .into_iter()
        .map(RichTextRun::plain)
        .collect()
}

/// The plain-text rendition of a meeting, used for the page's text
/// property.
pub fn meeting_text(meeting: &StructuredMeeting) -> String {
    let mut parts = Vec::new();

    if !meeting.attendees.is_empty() {
        parts.push(format!("Attendees: {}", meeting.attendees.join(", ")));
    }
    if !meeting.summary.is_empty() {
        parts.push(format!("## Summary\n{}", meeting.summary));
    }
    if !meeting.decisions.is_empty() {
        let bullets: Vec<String> = meeting.decisions.iter().map(|d| format!("• {d}")).collect();
        parts.push(format!("## Key Decisions\n{}", bullets.join("\n")));
    }
    if !meeting.action_items.is_empty() {
        let bullets: Vec<String> = meeting
            .action_items
            .iter()
            .map(|item| {
                let mut line = format!("• {}", item.task);
                if let Some(assignee) = &item.assignee {
                    line.push_str(&format!(" (Assigned to: {assignee})"));
                }
                if let Some(due) = &item.due_date {
                    line.push_str(&format!(" (Due: {due})"));
                }
                line
            })
            .collect();
        parts.push(format!("## Action Items\n{}", bullets.join("\n")));
    }
    if !meeting.next_steps.is_empty() {
        let bullets: Vec<String> = meeting.next_steps.iter().map(|s| format!("• {s}")).collect();
        parts.push(format!("## Next Steps\n{}", bullets.join("\n")));
    }

    parts.join("\n\n")
}

/// The block rendition of a meeting summary, with entity mentions in the
/// attendee line, summary paragraphs, and action items hyperlinked.
pub fn meeting_blocks(
    meeting: &StructuredMeeting,
    entities: &[CanonicalEntity],
    page_base: &str,
) -> Vec<Block> {
    let mut blocks = vec![Block::divider(), Block::heading_1("AI-Processed Meeting Summary")];

    if !meeting.attendees.is_empty() {
        let line = format!("Attendees: {}", meeting.attendees.join(", "));
        blocks.push(Block::paragraph(linked_runs(&line, entities, page_base)));
    }

    if !meeting.summary.is_empty() {
        blocks.push(Block::heading_2("Summary"));
        for chunk in chunk_text(&meeting.summary, RUN_CHUNK) {
            blocks.push(Block::paragraph(linked_runs(chunk, entities, page_base)));
        }
    }

    if !meeting.decisions.is_empty() {
        blocks.push(Block::heading_2("Key Decisions"));
        for decision in &meeting.decisions {
            blocks.push(Block::bullet(vec![RichTextRun::plain(decision.clone())]));
        }
    }

    if !meeting.action_items.is_empty() {
        blocks.push(Block::heading_2("Action Items"));
        for item in &meeting.action_items {
            let mut runs = linked_runs(&item.task, entities, page_base);
            if let Some(assignee) = &item.assignee {
                runs.push(RichTextRun::plain(" (Assigned to: "));
                runs.extend(linked_runs(assignee, entities, page_base));
                runs.push(RichTextRun::plain(")"));
            }
            if let Some(due) = &item.due_date {
                runs.push(RichTextRun::plain(format!(" (Due: {due})")));
            }
            blocks.push(Block::bullet(runs));
        }
    }

    if !meeting.next_steps.is_empty() {
        blocks.push(Block::heading_2("Next Steps"));
        for step in &meeting.next_steps {
            blocks.push(Block::bullet(vec![RichTextRun::plain(step.clone())]));
        }
    }

    blocks.push(Block::heading_2("Original Transcript"));
    blocks.push(Block::paragraph(vec![RichTextRun::plain(
        "See attached transcript file for full meeting recording.",
    )]));

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use meeting_types::{ActionItem, EntityKind};

    fn person(id: &str, name: &str) -> CanonicalEntity {
        CanonicalEntity::new(id, EntityKind::Person, name)
    }

    #[test]
    fn entity_url_strips_dashes() {
        assert_eq!(
            entity_url("https://www.notion.so", "2028b92d-dc2f-811c-a933-e7be5a1e00ee"),
            "https://www.notion.so/2028b92ddc2f811ca933e7be5a1e00ee"
        );
    }

    #[test]
    fn linked_runs_hyperlink_mentions() {
        let entities = vec![person("ab-cd", "Sarah")];
        let runs = linked_runs("Ping Sarah about QA", &entities, "https://www.notion.so");

        assert_eq!(runs.len(), 3);
        assert!(runs[0].text.link.is_none());
        assert_eq!(runs[1].text.content, "Sarah");
        assert_eq!(
            runs[1].text.link.as_ref().unwrap().url,
            "https://www.notion.so/abcd"
        );
        assert!(runs[2].text.link.is_none());
    }

    #[test]
    fn chunking_respects_char_boundaries() {
        let text = "é".repeat(4100);
        let chunks = chunk_text(&text, 2000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 2000);
        assert_eq!(chunks[2].chars().count(), 100);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn meeting_text_lists_all_sections() {
        let meeting = StructuredMeeting {
            title: "Weekly Standup".into(),
            attendees: vec!["Sarah".into(), "Mike".into()],
            summary: "Sprint review went well.".into(),
            action_items: vec![ActionItem {
                task: "Finish QA".into(),
                assignee: Some("Sarah".into()),
                due_date: Some("2025-06-06".into()),
            }],
            decisions: vec!["Ship Monday".into()],
            next_steps: vec!["Schedule deployment review".into()],
            ..StructuredMeeting::default()
        };

        let text = meeting_text(&meeting);
        assert!(text.starts_with("Attendees: Sarah, Mike"));
        assert!(text.contains("## Summary"));
        assert!(text.contains("## Key Decisions\n• Ship Monday"));
        assert!(text.contains("• Finish QA (Assigned to: Sarah) (Due: 2025-06-06)"));
        assert!(text.contains("## Next Steps"));
    }

    #[test]
    fn meeting_blocks_link_attendees_and_tasks() {
        let entities = vec![person("p-1", "Sarah")];
        let meeting = StructuredMeeting {
            attendees: vec!["Sarah".into()],
            summary: "Sarah demoed the dashboard.".into(),
            action_items: vec![ActionItem {
                task: "Sarah to coordinate QA".into(),
                assignee: Some("Sarah".into()),
                due_date: None,
            }],
            ..StructuredMeeting::default()
        };

        let blocks = meeting_blocks(&meeting, &entities, "https://www.notion.so");
        let json = serde_json::to_value(&blocks).unwrap();

        // divider, heading, attendees, summary heading, summary paragraph,
        // action heading, action bullet, transcript heading + note.
        assert_eq!(json.as_array().unwrap().len(), 9);

        let attendee_runs = &json[2]["paragraph"]["rich_text"];
        assert_eq!(attendee_runs[1]["text"]["content"], "Sarah");
        assert!(attendee_runs[1]["text"]["link"]["url"].is_string());

        let bullet_runs = &json[6]["bulleted_list_item"]["rich_text"];
        assert_eq!(bullet_runs[0]["text"]["content"], "Sarah");
    }

    #[test]
    fn empty_meeting_still_carries_header_and_footer() {
        let blocks = meeting_blocks(&StructuredMeeting::default(), &[], "https://www.notion.so");
        let json = serde_json::to_value(&blocks).unwrap();
        assert_eq!(json[0]["type"], "divider");
        assert_eq!(json[1]["type"], "heading_1");
        assert_eq!(json.as_array().unwrap().len(), 4);
    }
}
