// Error types for the catalog engine.
//
// `Empty` results are not errors: they are reported through
// `search::PageOutcome::Empty`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Query text could not be used (blank, or a YouTube URL with no video id).
    /// Raised before any network call.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// Network or API failure, carrying a message fit for the user.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("YouTube API key is not set (YOUTUBE_API_KEY or api_key in config.toml)")]
    MissingApiKey,

    /// `request_page`/`set_filter` called before any query was submitted.
    #[error("No active search session")]
    NoSession,
}

impl CatalogError {
    pub fn upstream(message: impl Into<String>) -> Self {
        CatalogError::Upstream(message.into())
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, CatalogError::Upstream(_))
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        CatalogError::Upstream(e.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Upstream(format!("Invalid response: {}", e))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}
