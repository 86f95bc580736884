// YouTube catalog access
// `CatalogApi` is the only thing the search and mixer code depend on:
// one "search" call (text or related-to-id, cursor paginated) and one
// "details by id batch" call. `YouTubeDataApi` implements it over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{ApiErrorBody, Candidate, SearchListResponse, VideoListResponse};
use crate::config::AppConfig;
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Text(String),
    RelatedTo(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub max_results: usize,
    pub page_token: Option<String>,
    pub category_id: Option<String>,
}

impl SearchRequest {
    pub fn text(query: impl Into<String>, max_results: usize) -> Self {
        SearchRequest {
            query: SearchQuery::Text(query.into()),
            max_results,
            page_token: None,
            category_id: None,
        }
    }

    pub fn related_to(video_id: impl Into<String>, max_results: usize) -> Self {
        SearchRequest {
            query: SearchQuery::RelatedTo(video_id.into()),
            max_results,
            page_token: None,
            category_id: None,
        }
    }

    pub fn page_token(mut self, token: Option<String>) -> Self {
        self.page_token = token;
        self
    }

    pub fn category(mut self, category_id: Option<String>) -> Self {
        self.category_id = category_id;
        self
    }
}

// Lightweight search result: just enough to decide whether to fetch details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub live_or_upcoming: bool,
}

impl SearchHit {
    pub fn new(id: impl Into<String>) -> Self {
        SearchHit {
            id: id.into(),
            live_or_upcoming: false,
        }
    }

    pub fn live(id: impl Into<String>) -> Self {
        SearchHit {
            id: id.into(),
            live_or_upcoming: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub next_page_token: Option<String>,
}

impl SearchPage {
    /// Ids that can be queued, in upstream order.
    pub fn playable_ids(&self) -> Vec<String> {
        self.hits
            .iter()
            .filter(|h| !h.live_or_upcoming)
            .map(|h| h.id.clone())
            .collect()
    }
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage>;

    /// Full records for `ids`. Ids the catalog doesn't know are simply absent.
    async fn video_details(&self, ids: &[String]) -> Result<Vec<Candidate>>;
}

pub struct YouTubeDataApi {
    http: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeDataApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CatalogError::MissingApiKey)?;
        let http = Client::builder().timeout(config.request_timeout()).build()?;
        Self::with_client(http, config.api_base_url.clone(), api_key)
    }

    fn with_client(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CatalogError::MissingApiKey);
        }
        Ok(YouTubeDataApi {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // The API explains itself in {"error": {...}} even on 4xx/5xx
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(CatalogError::Upstream(message));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiErrorBody>,
}

fn api_error(error: ApiErrorBody) -> CatalogError {
    if error.message.is_empty() {
        CatalogError::Upstream(format!("API error {}", error.code))
    } else {
        CatalogError::Upstream(error.message)
    }
}

#[async_trait]
impl CatalogApi for YouTubeDataApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("maxResults", request.max_results.to_string()),
        ];
        match &request.query {
            SearchQuery::Text(q) => params.push(("q", q.clone())),
            SearchQuery::RelatedTo(id) => params.push(("relatedToVideoId", id.clone())),
        }
        if let Some(category) = &request.category_id {
            params.push(("videoCategoryId", category.clone()));
        }
        if let Some(token) = request.page_token.as_ref().filter(|t| !t.is_empty()) {
            params.push(("pageToken", token.clone()));
        }

        debug!(query = ?request.query, page_token = ?request.page_token, "search.list");
        let response: SearchListResponse = self.get_json("search", &params).await?;
        if let Some(error) = response.error {
            return Err(api_error(error));
        }

        let hits = response
            .items
            .iter()
            .filter_map(|item| {
                let id = item.id.video_id.clone()?;
                Some(SearchHit {
                    id,
                    live_or_upcoming: item.is_live_or_upcoming(),
                })
            })
            .collect();

        Ok(SearchPage {
            hits,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<Candidate>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "videos.list");
        let params = [
            ("part", "snippet,contentDetails".to_string()),
            ("id", ids.join(",")),
        ];
        let response: VideoListResponse = self.get_json("videos", &params).await?;
        if let Some(error) = response.error {
            return Err(api_error(error));
        }

        Ok(response.items.into_iter().map(Candidate::from).collect())
    }
}

// Details come back in whatever order the catalog likes; put them back in `ids` order
pub fn order_by_ids(ids: &[String], mut records: Vec<Candidate>) -> Vec<Candidate> {
    let mut ordered = Vec::with_capacity(records.len());
    for id in ids {
        if let Some(pos) = records.iter().position(|c| &c.id == id) {
            ordered.push(records.swap_remove(pos));
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            YouTubeDataApi::new("http://localhost", "  "),
            Err(CatalogError::MissingApiKey)
        ));
    }

    #[test]
    fn from_config_requires_a_key() {
        let config = AppConfig::default();
        assert!(matches!(
            YouTubeDataApi::from_config(&config),
            Err(CatalogError::MissingApiKey)
        ));
    }

    #[test]
    fn playable_ids_skip_live() {
        let page = SearchPage {
            hits: vec![SearchHit::new("a"), SearchHit::live("b"), SearchHit::new("c")],
            next_page_token: None,
        };
        assert_eq!(page.playable_ids(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn order_by_ids_restores_search_order_and_drops_unknown() {
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let records = vec![
            Candidate::new("c", "C", "x"),
            Candidate::new("z", "Z", "x"),
            Candidate::new("a", "A", "x"),
        ];
        let ordered = order_by_ids(&ids, records);
        let got: Vec<&str> = ordered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(got, vec!["a", "c"]);
    }
}
