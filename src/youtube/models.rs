// Catalog records
// `Candidate` is what the rest of the crate works with; the `*Response`
// structs mirror the YouTube Data API v3 JSON and are only used by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::duration::parse_iso8601_duration;

// Which upstream signal produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Related to the item that is playing
    ArtistSimilar,
    /// From the inferred-genre query
    Genre,
    /// Searched for or picked by the user
    Direct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    /// 0 when unknown
    pub duration_seconds: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub provenance: Provenance,
}

impl Candidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, channel_title: impl Into<String>) -> Self {
        Candidate {
            id: id.into(),
            title: title.into(),
            channel_title: channel_title.into(),
            thumbnail_url: String::new(),
            duration_seconds: 0,
            published_at: None,
            provenance: Provenance::Direct,
        }
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

// ==========================================
// WIRE FORMAT: search.list
// ==========================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub next_page_token: Option<String>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub live_broadcast_content: Option<String>,
}

impl SearchItem {
    // "live" and "upcoming" broadcasts can't be queued; "none" or absent is fine
    pub fn is_live_or_upcoming(&self) -> bool {
        matches!(
            self.snippet
                .as_ref()
                .and_then(|s| s.live_broadcast_content.as_deref()),
            Some("live") | Some("upcoming")
        )
    }
}

// ==========================================
// WIRE FORMAT: videos.list
// ==========================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentDetails {
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

impl From<VideoItem> for Candidate {
    fn from(item: VideoItem) -> Self {
        let thumbnail_url = item
            .snippet
            .thumbnails
            .medium
            .or(item.snippet.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();
        let duration_seconds = item
            .content_details
            .map(|c| parse_iso8601_duration(&c.duration))
            .unwrap_or(0);

        Candidate {
            id: item.id,
            title: item.snippet.title,
            channel_title: item.snippet.channel_title,
            thumbnail_url,
            duration_seconds,
            published_at: item.snippet.published_at,
            provenance: Provenance::Direct,
        }
    }
}
