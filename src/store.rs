//! Workspace document-store client (Notion-compatible wire format).
//!
//! Speaks the store's v1 REST surface: cursor-paginated database queries,
//! page creation with typed property payloads, block appends, schema
//! reads. Everything the rest of the crate needs from the store funnels
//! through [`StoreClient`].

use std::collections::BTreeMap;

use meeting_types::{EntityKind, EntityPage, RawEntity};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::DirectoryStore;

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_PAGE_URL: &str = "https://www.notion.so";

/// Wire protocol revision sent with every request.
const STORE_VERSION: &str = "2022-06-28";

/// Maximum children accepted by a single block-append call.
const BLOCK_CHUNK: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned a non-success status code.
    #[error("store API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// No database is configured for this entity kind.
    #[error("no {0} database configured")]
    Unconfigured(&'static str),
}

/// Map a non-success response to [`StoreError::Api`], keeping the body as
/// the message.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if !resp.status().is_success() {
        return Err(StoreError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

// ── Rich text ────────────────────────────────────────────────────────

/// One run of rich text: plain content, optionally hyperlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextRun {
    #[serde(rename = "type")]
    pub run_type: String,
    pub text: TextPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

impl RichTextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            run_type: "text".into(),
            text: TextPayload {
                content: content.into(),
                link: None,
            },
        }
    }

    pub fn linked(content: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            run_type: "text".into(),
            text: TextPayload {
                content: content.into(),
                link: Some(Link { url: url.into() }),
            },
        }
    }
}

// ── Page properties ──────────────────────────────────────────────────

/// A typed property payload for page creation/update. Serializes to the
/// store's `{"title": [...]}` / `{"date": {...}}` shapes.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PropertyPayload {
    Title { title: Vec<RichTextRun> },
    RichText { rich_text: Vec<RichTextRun> },
    Date { date: DateValue },
    Select { select: SelectValue },
    Relation { relation: Vec<RelationRef> },
}

#[derive(Debug, Clone, Serialize)]
pub struct DateValue {
    pub start: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectValue {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationRef {
    pub id: String,
}

impl PropertyPayload {
    pub fn title(text: impl Into<String>) -> Self {
        Self::Title {
            title: vec![RichTextRun::plain(text)],
        }
    }

    pub fn rich_text(runs: Vec<RichTextRun>) -> Self {
        Self::RichText { rich_text: runs }
    }

    pub fn date(start: impl Into<String>) -> Self {
        Self::Date {
            date: DateValue { start: start.into() },
        }
    }

    pub fn select(name: impl Into<String>) -> Self {
        Self::Select {
            select: SelectValue { name: name.into() },
        }
    }

    pub fn relation(ids: impl IntoIterator<Item = String>) -> Self {
        Self::Relation {
            relation: ids.into_iter().map(|id| RelationRef { id }).collect(),
        }
    }
}

pub type Properties = BTreeMap<String, PropertyPayload>;

// ── Blocks ───────────────────────────────────────────────────────────

/// A content block appended to a page.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    object: &'static str,
    #[serde(flatten)]
    body: BlockBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum BlockBody {
    #[serde(rename = "divider")]
    Divider { divider: EmptyObject },
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: RichTextBody },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: RichTextBody },
    #[serde(rename = "paragraph")]
    Paragraph { paragraph: RichTextBody },
    #[serde(rename = "bulleted_list_item")]
    Bullet { bulleted_list_item: RichTextBody },
}

#[derive(Debug, Clone, Serialize)]
struct EmptyObject {}

#[derive(Debug, Clone, Serialize)]
struct RichTextBody {
    rich_text: Vec<RichTextRun>,
}

impl Block {
    fn body(body: BlockBody) -> Self {
        Self {
            object: "block",
            body,
        }
    }

    pub fn divider() -> Self {
        Self::body(BlockBody::Divider {
            divider: EmptyObject {},
        })
    }

    pub fn heading_1(text: impl Into<String>) -> Self {
        Self::body(BlockBody::Heading1 {
            heading_1: RichTextBody {
                rich_text: vec![RichTextRun::plain(text)],
            },
        })
    }

    pub fn heading_2(text: impl Into<String>) -> Self {
        Self::body(BlockBody::Heading2 {
            heading_2: RichTextBody {
                rich_text: vec![RichTextRun::plain(text)],
            },
        })
    }

    pub fn paragraph(runs: Vec<RichTextRun>) -> Self {
        Self::body(BlockBody::Paragraph {
            paragraph: RichTextBody { rich_text: runs },
        })
    }

    pub fn bullet(runs: Vec<RichTextRun>) -> Self {
        Self::body(BlockBody::Bullet {
            bulleted_list_item: RichTextBody { rich_text: runs },
        })
    }
}

// ── Wire responses ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<RecordObject>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordObject {
    id: String,
    #[serde(default)]
    properties: BTreeMap<String, RecordProperty>,
}

#[derive(Debug, Default, Deserialize)]
struct RecordProperty {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    title: Vec<RichTextWire>,
}

#[derive(Debug, Default, Deserialize)]
struct RichTextWire {
    #[serde(default)]
    plain_text: Option<String>,
    #[serde(default)]
    text: Option<TextPayload>,
}

impl RecordObject {
    /// The record's display title: the content of its first title run,
    /// whichever property carries the title type.
    fn title(&self) -> Option<String> {
        self.properties
            .values()
            .find(|p| p.kind == "title")
            .and_then(|p| p.title.first())
            .and_then(|run| {
                run.text
                    .as_ref()
                    .map(|t| t.content.clone())
                    .or_else(|| run.plain_text.clone())
            })
            .filter(|title| !title.is_empty())
    }

    fn into_raw_entity(self) -> RawEntity {
        let name = self.title();
        RawEntity { id: self.id, name }
    }
}

/// A page as returned by create/get calls.
#[derive(Debug, Deserialize)]
pub struct CreatedPage {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Database schema: title plus a property-name → descriptor map.
#[derive(Debug, Deserialize)]
pub struct DatabaseSchema {
    #[serde(default)]
    title: Vec<RichTextWire>,
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchemaProperty {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub select: Option<SelectSchema>,
    #[serde(default)]
    pub relation: Option<RelationSchema>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectSchema {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelationSchema {
    #[serde(default)]
    pub database_id: Option<String>,
}

impl DatabaseSchema {
    pub fn display_title(&self) -> String {
        self.title
            .first()
            .and_then(|run| run.plain_text.clone())
            .unwrap_or_else(|| "(untitled)".to_string())
    }

    /// Names of select options for `property`, if it is a select.
    pub fn select_options(&self, property: &str) -> Vec<String> {
        self.properties
            .get(property)
            .and_then(|p| p.select.as_ref())
            .map(|s| s.options.iter().map(|o| o.name.clone()).collect())
            .unwrap_or_default()
    }

    /// The first relation property pointing at `database_id`.
    pub fn relation_property_for(&self, database_id: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, p)| {
                p.kind == "relation"
                    && p.relation
                        .as_ref()
                        .is_some_and(|r| r.database_id.as_deref() == Some(database_id))
            })
            .map(|(name, _)| name.as_str())
    }
}

// ── Client ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreatePageRequest<'a> {
    parent: Parent<'a>,
    properties: &'a Properties,
}

#[derive(Debug, Serialize)]
struct Parent<'a> {
    database_id: &'a str,
}

#[derive(Debug, Serialize)]
struct AppendBlocksRequest<'a> {
    children: &'a [Block],
}

/// HTTP client for the workspace document store.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl StoreClient {
    /// Create a client with a bearer token against `base_url`.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` fails to build.
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("meeting_link/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client should build"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", STORE_VERSION)
    }

    /// Query one listing page of `database_id`, continuing from `cursor`.
    pub async fn query_entities(
        &self,
        database_id: &str,
        cursor: Option<&str>,
    ) -> Result<EntityPage, StoreError> {
        let resp = self
            .request(reqwest::Method::POST, &format!("databases/{database_id}/query"))
            .json(&QueryRequest { start_cursor: cursor })
            .send()
            .await?;
        let data: QueryResponse = check_response(resp).await?.json().await?;

        let next_cursor = data.has_more.then_some(data.next_cursor).flatten();
        Ok(EntityPage {
            records: data
                .results
                .into_iter()
                .map(RecordObject::into_raw_entity)
                .collect(),
            next_cursor,
        })
    }

    /// Create a record titled `name` in `database_id`.
    pub async fn create_entity(
        &self,
        database_id: &str,
        name: &str,
    ) -> Result<RawEntity, StoreError> {
        let mut properties = Properties::new();
        properties.insert("Name".to_string(), PropertyPayload::title(name));
        let page = self.create_page(database_id, &properties).await?;
        Ok(RawEntity {
            id: page.id,
            name: Some(name.to_string()),
        })
    }

    /// Create a page in `database_id` with the given properties.
    pub async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
    ) -> Result<CreatedPage, StoreError> {
        let resp = self
            .request(reqwest::Method::POST, "pages")
            .json(&CreatePageRequest {
                parent: Parent { database_id },
                properties,
            })
            .send()
            .await?;
        Ok(check_response(resp).await?.json().await?)
    }

    /// Append content blocks to a page, chunked at the store's limit.
    pub async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> Result<(), StoreError> {
        for chunk in blocks.chunks(BLOCK_CHUNK) {
            let resp = self
                .request(reqwest::Method::PATCH, &format!("blocks/{page_id}/children"))
                .json(&AppendBlocksRequest { children: chunk })
                .send()
                .await?;
            check_response(resp).await?;
            tracing::debug!(page_id, count = chunk.len(), "appended block chunk");
        }
        Ok(())
    }

    /// Fetch the schema of `database_id`.
    pub async fn database_schema(&self, database_id: &str) -> Result<DatabaseSchema, StoreError> {
        let resp = self
            .request(reqwest::Method::GET, &format!("databases/{database_id}"))
            .send()
            .await?;
        Ok(check_response(resp).await?.json().await?)
    }
}

// ── Directory adapter ────────────────────────────────────────────────

/// Binds the generic directory seam to concrete entity databases.
pub struct StoreDirectorySource {
    client: StoreClient,
    people_db: String,
    projects_db: Option<String>,
}

impl StoreDirectorySource {
    pub fn new(client: StoreClient, people_db: String, projects_db: Option<String>) -> Self {
        Self {
            client,
            people_db,
            projects_db,
        }
    }

    fn database_for(&self, kind: EntityKind) -> Result<&str, StoreError> {
        match kind {
            EntityKind::Person => Ok(&self.people_db),
            EntityKind::Project => self
                .projects_db
                .as_deref()
                .ok_or(StoreError::Unconfigured("project")),
        }
    }
}

impl DirectoryStore for StoreDirectorySource {
    async fn fetch_page(
        &self,
        kind: EntityKind,
        cursor: Option<&str>,
    ) -> Result<EntityPage, StoreError> {
        // An unconfigured projects database simply lists as empty.
        let database_id = match self.database_for(kind) {
            Ok(id) => id,
            Err(StoreError::Unconfigured(_)) => return Ok(EntityPage::default()),
            Err(e) => return Err(e),
        };
        self.client.query_entities(database_id, cursor).await
    }

    async fn create(&self, kind: EntityKind, name: &str) -> Result<RawEntity, StoreError> {
        let database_id = self.database_for(kind)?;
        self.client.create_entity(database_id, name).await
    }
}

// ── Page URLs ────────────────────────────────────────────────────────

/// Extract a page ID from a store share URL.
///
/// Handles the `?p=` query form, the dashed-UUID form, and the bare
/// 32-hex-suffix form; the result is normalized to the dashed shape the
/// API expects.
pub fn page_id_from_url(url: &str) -> Option<String> {
    let query_form = Regex::new(r"[?&]p=([0-9a-f]{32})").expect("query-form regex");
    let dashed_form = Regex::new(
        r"([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})",
    )
    .expect("dashed-form regex");
    let bare_form = Regex::new(r"([0-9a-f]{32})(?:[?#]|$)").expect("bare-form regex");

    let hex = query_form
        .captures(url)
        .or_else(|| dashed_form.captures(url))
        .or_else(|| bare_form.captures(url))
        .map(|caps| caps[1].replace('-', ""))?;

    Some(format_page_id(&hex))
}

/// Insert dashes into a 32-hex page ID: 8-4-4-4-12.
fn format_page_id(hex: &str) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY_FIXTURE: &str = r#"{
        "results": [
            {
                "id": "aaaa1111-0000-0000-0000-000000000001",
                "properties": {
                    "Name": {
                        "id": "title",
                        "type": "title",
                        "title": [
                            {
                                "type": "text",
                                "text": {"content": "Aaron Swart"},
                                "plain_text": "Aaron Swart"
                            }
                        ]
                    },
                    "Role": {"id": "abc", "type": "rich_text"}
                }
            },
            {
                "id": "aaaa1111-0000-0000-0000-000000000002",
                "properties": {
                    "Title": {
                        "id": "title",
                        "type": "title",
                        "title": []
                    }
                }
            }
        ],
        "has_more": true,
        "next_cursor": "cursor-2"
    }"#;

    #[test]
    fn query_response_parses_titles_and_cursor() {
        let data: QueryResponse = serde_json::from_str(QUERY_FIXTURE).unwrap();
        assert_eq!(data.results.len(), 2);
        assert!(data.has_more);
        assert_eq!(data.next_cursor.as_deref(), Some("cursor-2"));

        let first = data.results[0].title();
        assert_eq!(first.as_deref(), Some("Aaron Swart"));

        // An empty title array is a malformed record.
        assert!(data.results[1].title().is_none());
    }

    #[test]
    fn record_with_plain_text_only_still_titles() {
        let json = r#"{
            "id": "x",
            "properties": {
                "Name": {"type": "title", "title": [{"plain_text": "Mira"}]}
            }
        }"#;
        let record: RecordObject = serde_json::from_str(json).unwrap();
        assert_eq!(record.title().as_deref(), Some("Mira"));
    }

    #[test]
    fn create_page_request_shape() {
        let mut properties = Properties::new();
        properties.insert("Name".into(), PropertyPayload::title("Weekly Standup"));
        properties.insert("Date".into(), PropertyPayload::date("2025-05-28T10:00:00Z"));
        properties.insert("Type".into(), PropertyPayload::select("Standard Meeting"));
        properties.insert(
            "People".into(),
            PropertyPayload::relation(vec!["p-1".to_string(), "p-2".to_string()]),
        );

        let body = serde_json::to_value(CreatePageRequest {
            parent: Parent { database_id: "db-1" },
            properties: &properties,
        })
        .unwrap();

        assert_eq!(body["parent"]["database_id"], "db-1");
        assert_eq!(
            body["properties"]["Name"]["title"][0]["text"]["content"],
            "Weekly Standup"
        );
        assert_eq!(body["properties"]["Date"]["date"]["start"], "2025-05-28T10:00:00Z");
        assert_eq!(body["properties"]["Type"]["select"]["name"], "Standard Meeting");
        assert_eq!(body["properties"]["People"]["relation"][1]["id"], "p-2");
    }

    #[test]
    fn block_serialization_matches_wire_shape() {
        let block = Block::heading_2("Summary");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["object"], "block");
        assert_eq!(json["type"], "heading_2");
        assert_eq!(json["heading_2"]["rich_text"][0]["text"]["content"], "Summary");

        let divider = serde_json::to_value(Block::divider()).unwrap();
        assert_eq!(divider["type"], "divider");
        assert!(divider["divider"].as_object().unwrap().is_empty());
    }

    #[test]
    fn linked_run_carries_url() {
        let run = RichTextRun::linked("Sarah", "https://www.notion.so/abc123");
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["text"]["link"]["url"], "https://www.notion.so/abc123");

        let plain = serde_json::to_value(RichTextRun::plain("hi")).unwrap();
        assert!(plain["text"].get("link").is_none());
    }

    #[test]
    fn schema_helpers_find_properties() {
        let json = r#"{
            "title": [{"plain_text": "Meetings"}],
            "properties": {
                "Name": {"type": "title"},
                "Type": {"type": "select", "select": {"options": [
                    {"name": "Standard Meeting"}, {"name": "Strategy Call"}
                ]}},
                "Text": {"type": "rich_text"},
                "Attendees": {"type": "relation", "relation": {"database_id": "people-db"}}
            }
        }"#;
        let schema: DatabaseSchema = serde_json::from_str(json).unwrap();

        assert_eq!(schema.display_title(), "Meetings");
        assert_eq!(
            schema.select_options("Type"),
            vec!["Standard Meeting".to_string(), "Strategy Call".to_string()]
        );
        assert_eq!(schema.relation_property_for("people-db"), Some("Attendees"));
        assert_eq!(schema.relation_property_for("other-db"), None);
    }

    #[test]
    fn page_id_from_query_parameter() {
        let url = "https://www.notion.so/Page-Title-abc?p=2028b92ddc2f811ca933e7be5a1e00ee&pm=c";
        assert_eq!(
            page_id_from_url(url).as_deref(),
            Some("2028b92d-dc2f-811c-a933-e7be5a1e00ee")
        );
    }

    #[test]
    fn page_id_from_bare_suffix() {
        let url = "https://www.notion.so/Page-Title-2028b92ddc2f811ca933e7be5a1e00ee";
        assert_eq!(
            page_id_from_url(url).as_deref(),
            Some("2028b92d-dc2f-811c-a933-e7be5a1e00ee")
        );
    }

    #[test]
    fn page_id_from_dashed_form() {
        let url = "https://www.notion.so/2028b92d-dc2f-811c-a933-e7be5a1e00ee";
        assert_eq!(
            page_id_from_url(url).as_deref(),
            Some("2028b92d-dc2f-811c-a933-e7be5a1e00ee")
        );
    }

    #[test]
    fn page_id_absent_returns_none() {
        assert!(page_id_from_url("https://www.notion.so/not-a-page").is_none());
    }

    #[tokio::test]
    async fn check_response_maps_error_status() {
        let resp = reqwest::Response::from(
            http::Response::builder()
                .status(403)
                .body("forbidden")
                .unwrap(),
        );
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn unconfigured_projects_database_lists_empty() {
        let source = StoreDirectorySource::new(
            StoreClient::new("token", DEFAULT_BASE_URL),
            "people-db".into(),
            None,
        );
        let page = source.fetch_page(EntityKind::Project, None).await.unwrap();
        assert!(page.records.is_empty());
        assert!(page.next_cursor.is_none());

        let err = source.create(EntityKind::Project, "Atlas").await.unwrap_err();
        assert!(matches!(err, StoreError::Unconfigured(_)));
    }
}
