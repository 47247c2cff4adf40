//! Transcript summarization through an OpenAI-compatible chat endpoint.

use meeting_types::StructuredMeeting;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are an expert meeting analyst. Extract structured \
    information from transcripts accurately and comprehensively. Always respond with \
    valid JSON only.";

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("summarizer API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("summarizer returned malformed output: {0}")]
    Malformed(String),
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

// ── Client ───────────────────────────────────────────────────────────

/// Converts a raw transcript into a [`StructuredMeeting`].
pub struct Summarizer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl Summarizer {
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` fails to build.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("meeting_link/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("reqwest client should build"),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Summarize `transcript` into structured meeting data.
    ///
    /// `known_people` steers the model toward canonical attendee names;
    /// `meeting_types` lists the select options the meeting database
    /// accepts.
    pub async fn summarize(
        &self,
        transcript: &str,
        known_people: &[String],
        meeting_types: &[String],
    ) -> Result<StructuredMeeting, SummarizeError> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let prompt = extraction_prompt(transcript, known_people, meeting_types, &today);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &prompt,
                },
            ],
            // Low temperature for consistent extraction.
            temperature: 0.1,
            max_tokens: 4000,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SummarizeError::Api {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let data: ChatResponse = resp.json().await?;
        let content = data
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| SummarizeError::Malformed("no choices in response".into()))?;

        parse_meeting(content)
    }
}

/// Parse the completion text into a meeting, tolerating prose around the
/// JSON object.
fn parse_meeting(content: &str) -> Result<StructuredMeeting, SummarizeError> {
    let json = extract_json_object(content).unwrap_or(content);
    serde_json::from_str(json).map_err(|e| SummarizeError::Malformed(e.to_string()))
}

/// The outermost `{...}` slice of `content`, if any.
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn extraction_prompt(
    transcript: &str,
    known_people: &[String],
    meeting_types: &[String],
    today: &str,
) -> String {
    let people_context = if known_people.is_empty() {
        String::new()
    } else {
        format!(
            "EXISTING PEOPLE IN DATABASE:\n{}\n\n\
             When extracting attendees, try to match names to these existing people. \
             If you find variations (e.g., \"John\" vs \"John Smith\"), use the full \
             name from the database.\n\n",
            known_people.join(", ")
        )
    };

    let types = if meeting_types.is_empty() {
        "Standard Meeting, Strategy Call, Discovery Call, Technical Consultation".to_string()
    } else {
        meeting_types.join(", ")
    };

    format!(
        "Extract key information from this meeting transcript and return ONLY valid JSON.\n\n\
         {people_context}\
         MEETING TYPES AVAILABLE: {types}\n\n\
         TRANSCRIPT:\n{transcript}\n\n\
         INSTRUCTIONS:\n\
         1. Extract the meeting title (if not explicit, create a descriptive one)\n\
         2. Extract or infer the meeting date and time (if not found, use today's date: {today})\n\
         3. Determine the meeting type from the available options\n\
         4. Extract all attendee names mentioned in the transcript\n\
         5. Create a summary of key discussion points, decisions, and action items\n\
         6. If speaker labels are present (e.g., John:, Speaker 1:), preserve attribution for important points\n\
         7. Extract any action items or tasks mentioned, noting who they're assigned to\n\n\
         Return JSON with this exact structure:\n\
         {{\n\
         \x20   \"title\": \"string - descriptive meeting title\",\n\
         \x20   \"date\": \"string - ISO format YYYY-MM-DDTHH:MM:SS\",\n\
         \x20   \"meeting_type\": \"string - one of the available meeting types\",\n\
         \x20   \"attendees\": [\"array of attendee names\"],\n\
         \x20   \"summary\": \"string - comprehensive summary including key points, decisions, and action items with speaker attribution where relevant\",\n\
         \x20   \"action_items\": [\n\
         \x20       {{\n\
         \x20           \"task\": \"string - description of the task\",\n\
         \x20           \"assignee\": \"string - person assigned (if mentioned)\",\n\
         \x20           \"due_date\": \"string - ONLY if explicitly mentioned in transcript, otherwise null\"\n\
         \x20       }}\n\
         \x20   ],\n\
         \x20   \"decisions\": [\"array of key decisions made\"],\n\
         \x20   \"next_steps\": [\"array of next steps or follow-up actions\"]\n\
         }}\n\n\
         CRITICAL RULES:\n\
         - Return ONLY the JSON object, no additional text\n\
         - Use ISO 8601 format for dates\n\
         - If date/time is not in transcript, use {today} as the date\n\
         - NEVER invent or hallucinate due dates - only use dates explicitly mentioned in the transcript\n\
         - If no due date is mentioned for an action item, set due_date to null\n\
         - Be comprehensive in the summary but concise\n\
         - Preserve speaker attribution for action items and decisions\n\
         - Only include attendees who are actually mentioned or speak in the transcript\n\
         - If meeting type is unclear, default to Standard Meeting\n\
         - Do NOT make up information that is not in the transcript"
    )
}
