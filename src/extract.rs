use std::collections::BTreeSet;

use regex::Regex;

// ── False positive filtering ─────────────────────────────────────────

/// Capitalized words that pass the shape checks but never name a person:
/// meeting vocabulary, weekdays, months, meridiem/timezone abbreviations.
const STOPLIST: &[&str] = &[
    // Meeting vocabulary
    "Team", "Meeting", "Call", "Discussion", "Review", "Update",
    // List markers that double as line labels
    "Attendees", "Participants", "People",
    // Weekdays
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
    // Months
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
    // Meridiem / timezones
    "AM", "PM", "EST", "PST", "UTC", "GMT",
];

/// Check if a string is plausibly a person's name.
///
/// Rejects strings outside 2..=50 chars, strings not starting with an
/// uppercase letter, exact stoplist matches, and strings containing
/// anything other than letters, spaces, hyphens, or apostrophes.
fn is_likely_name(name: &str) -> bool {
    let char_count = name.chars().count();
    if !(2..=50).contains(&char_count) {
        return false;
    }

    match name.chars().next() {
        Some(first) if first.is_ascii_uppercase() => {}
        _ => return false,
    }

    if STOPLIST.contains(&name) {
        return false;
    }

    name.chars()
        .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '-' || c == '\'')
}

// ── Scanner ──────────────────────────────────────────────────────────

/// Heuristic candidate-name scanner over raw meeting text.
///
/// Two patterns feed the result set: speaker labels at the start of a
/// line ("Sarah: ..."), and attendee-list context ("Attendees: A, B").
/// Broader capitalized-word patterns are deliberately not applied; they
/// flood the output with false positives. Misses on irregular formatting
/// are expected.
pub struct NameExtractor {
    /// ^Name[ Name]: one or two capitalized words labelling a line
    re_speaker: Regex,
    /// attendees:/participants:/people: up to the next sentence terminator
    re_list: Regex,
}

impl Default for NameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl NameExtractor {
    pub fn new() -> Self {
        let re_speaker =
            Regex::new(r"^([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?):\s").expect("speaker regex");
        let re_list = Regex::new(r"(?i)(?:attendees?|participants?|people):\s*([^.!?\n]+)")
            .expect("list regex");

        NameExtractor { re_speaker, re_list }
    }

    /// Pull candidate person names out of `text`.
    ///
    /// Never fails; unmatched input yields an empty set. The sorted set
    /// gives downstream resolution a reproducible iteration order.
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();

        for line in text.lines() {
            if let Some(caps) = self.re_speaker.captures(line.trim()) {
                let label = caps[1].trim();
                if is_likely_name(label) {
                    names.insert(label.to_string());
                }
            }
        }

        for caps in self.re_list.captures_iter(text) {
            for token in caps[1].split([',', ';', '&']) {
                let token = token.trim();
                if is_likely_name(token) && token.split_whitespace().count() <= 3 {
                    names.insert(token.to_string());
                }
            }
        }

        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> BTreeSet<String> {
        NameExtractor::new().extract(text)
    }

    #[test]
    fn attendee_list_yields_names_not_vocabulary() {
        let names = extract("Meeting with Gaia Team. Attendees: Aaron, Darren, Susanna");
        assert!(names.contains("Aaron"));
        assert!(names.contains("Darren"));
        assert!(names.contains("Susanna"));
        assert!(!names.contains("Team"));
        assert!(!names.contains("Meeting"));
    }

    #[test]
    fn speaker_labels_are_extracted() {
        let text = "John: Good morning everyone.\nSarah Lee: The wireframes are done.\n";
        let names = extract(text);
        assert!(names.contains("John"));
        assert!(names.contains("Sarah Lee"));
    }

    #[test]
    fn weekdays_and_months_are_rejected() {
        let text = "Monday: kickoff\nAttendees: Tuesday, January, Aaron";
        let names = extract(text);
        assert!(!names.contains("Monday"));
        assert!(!names.contains("Tuesday"));
        assert!(!names.contains("January"));
        assert!(names.contains("Aaron"));
    }

    #[test]
    fn participants_marker_is_case_insensitive() {
        let names = extract("PARTICIPANTS: Mei, Alex");
        assert!(names.contains("Mei"));
        assert!(names.contains("Alex"));
    }

    #[test]
    fn list_tokens_split_on_all_separators() {
        let names = extract("People: Aaron; Darren & Susanna, Mike");
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn long_phrases_in_lists_are_rejected() {
        let names = extract("Attendees: The Whole Engineering Org Leadership, Aaron");
        assert!(names.contains("Aaron"));
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn names_with_hyphens_and_apostrophes_pass() {
        let names = extract("Attendees: Mary-Jane, O'Brien");
        assert!(names.contains("Mary-Jane"));
        assert!(names.contains("O'Brien"));
    }

    #[test]
    fn tokens_with_digits_or_symbols_are_rejected() {
        let names = extract("Attendees: Speaker1, J@ne, Aaron");
        assert_eq!(names.len(), 1);
        assert!(names.contains("Aaron"));
    }

    #[test]
    fn lowercase_tokens_are_rejected() {
        let names = extract("Attendees: aaron, Darren");
        assert!(!names.contains("aaron"));
        assert!(names.contains("Darren"));
    }

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let text = "Sarah: hi\nSarah: hello again\nAttendees: Sarah";
        let names = extract(text);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn mid_line_colon_is_not_a_speaker_label() {
        let names = extract("We agreed John: is not a label here");
        assert!(names.is_empty());
    }
}
