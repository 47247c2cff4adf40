use thiserror::Error;

use crate::store;
use crate::summarize;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Runtime configuration, read from the environment (a `.env` file is
/// honored when present).
#[derive(Debug, Clone)]
pub struct Config {
    /// Document-store integration token.
    pub token: String,
    /// Meeting database ID.
    pub meetings_db: String,
    /// People database ID.
    pub people_db: String,
    /// Projects database ID; project linking is skipped when unset.
    pub projects_db: Option<String>,
    /// Store API endpoint.
    pub store_url: String,
    /// Base for page share URLs (hyperlink targets).
    pub page_url: String,
    /// Summarizer API key; `ingest`/`update` require it.
    pub summarizer_key: Option<String>,
    pub summarizer_url: String,
    pub summarizer_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name| get(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            token: required("MEETLINK_TOKEN")?,
            meetings_db: required("MEETLINK_MEETINGS_DB")?,
            people_db: required("MEETLINK_PEOPLE_DB")?,
            projects_db: get("MEETLINK_PROJECTS_DB"),
            store_url: get("MEETLINK_STORE_URL")
                .unwrap_or_else(|| store::DEFAULT_BASE_URL.to_string()),
            page_url: get("MEETLINK_PAGE_URL")
                .unwrap_or_else(|| store::DEFAULT_PAGE_URL.to_string()),
            summarizer_key: get("MEETLINK_SUMMARIZER_KEY"),
            summarizer_url: get("MEETLINK_SUMMARIZER_URL")
                .unwrap_or_else(|| summarize::DEFAULT_API_URL.to_string()),
            summarizer_model: get("MEETLINK_SUMMARIZER_MODEL")
                .unwrap_or_else(|| summarize::DEFAULT_MODEL.to_string()),
        })
    }
}
