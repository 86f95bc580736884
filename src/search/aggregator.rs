// ==========================================
// SEARCH AGGREGATOR MODULE
// ==========================================
// Owns the current SearchSession and fills pages from the catalog.
//
// With the "all" filter a page is exactly one upstream page (minus live,
// upcoming and short-form items). With a duration floor most upstream pages
// come back thin, so the aggregator keeps pulling upstream pages until it has
// a full page, runs out of continuation tokens, or hits the fetch bound.
//
// The session lock is never held across a network call. Every submit and
// every page request advances the generation; a fetch whose generation is no
// longer current when it returns is dropped instead of applied.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::session::{QueryKind, SearchSession};
use super::{DurationFilter, PageOutcome};
use crate::classify::is_short_form;
use crate::config::SearchSettings;
use crate::error::{CatalogError, Result};
use crate::generation::{Generation, GenerationToken};
use crate::youtube::api::{order_by_ids, CatalogApi, SearchRequest};
use crate::youtube::models::Candidate;
use crate::youtube::url::{extract_video_id, is_youtube_url};

// ==========================================
// INTERNAL PAGE TYPES
// ==========================================
// One upstream page after live/upcoming exclusion and detail lookup
struct UpstreamPage {
    candidates: Vec<Candidate>,
    next_token: Option<String>,
}

// Result of filling one session page
struct FilledPage {
    items: Vec<Candidate>,
    next_token: Option<String>,
}

// ==========================================
// AGGREGATOR STRUCT
// ==========================================
pub struct SearchAggregator {
    api: Arc<dyn CatalogApi>,
    settings: SearchSettings,
    session: Mutex<Option<SearchSession>>,
    generation: Generation,
}

impl SearchAggregator {
    pub fn new(api: Arc<dyn CatalogApi>, settings: SearchSettings) -> Self {
        SearchAggregator {
            api,
            settings,
            session: Mutex::new(None),
            generation: Generation::new(),
        }
    }

    // ==========================================
    // USER OPERATIONS
    // ==========================================
    // What the console calls. Each one locks the session only long enough to
    // read or update it; the fetches happen with the lock released.

    /// Start a new session for `text`, replacing any previous one, and load page 1.
    pub async fn submit_query(&self, text: &str, filter: DurationFilter) -> Result<PageOutcome> {
        let query = text.trim();
        if query.is_empty() {
            return Err(CatalogError::MalformedQuery("empty query".to_string()));
        }

        let kind = if is_youtube_url(query) {
            let id = extract_video_id(query).ok_or_else(|| {
                CatalogError::MalformedQuery(format!("no video id in '{}'", query))
            })?;
            QueryKind::Video(id)
        } else {
            QueryKind::Keyword
        };

        let token = {
            let mut session = self.session.lock().await;
            *session = Some(SearchSession::new(query, kind.clone(), filter));
            self.generation.advance()
        };
        info!(query, %filter, "new search session");

        match kind {
            QueryKind::Video(id) => self.resolve_video(token, &id).await,
            QueryKind::Keyword => self.load_page(token, query.to_string(), filter, 1, None).await,
        }
    }

    /// Navigate to `page`. Pages that aren't reachable yet (past the known last
    /// page, or with no recorded token) leave the session where it is.
    pub async fn request_page(&self, page: u32) -> Result<PageOutcome> {
        let (query, filter, page_token, token) = {
            let guard = self.session.lock().await;
            let session = guard.as_ref().ok_or(CatalogError::NoSession)?;

            if !session.can_navigate_to(page) || matches!(session.kind(), QueryKind::Video(_)) {
                debug!(page, current = session.current_page(), "page not reachable, staying");
                return Ok(PageOutcome::from_session(session));
            }

            let page_token = session.token_for(page).flatten();
            // Advance while still holding the lock so no other request slips in between
            let token = self.generation.advance();
            (
                session.query().to_string(),
                session.fetch_filter(),
                page_token,
                token,
            )
        };

        self.load_page(token, query, filter, page, page_token).await
    }

    /// Re-derive the current page for `filter` from what was already fetched.
    ///
    /// This is a local preview: narrowing can leave the page short and widening
    /// can't bring back items the first fetch skipped. The returned view is
    /// marked `partial` whenever it differs from the filter the page was fetched
    /// under; submit the query again for a complete page.
    pub async fn set_filter(&self, filter: DurationFilter) -> Result<PageOutcome> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(CatalogError::NoSession)?;
        session.set_active_filter(filter);
        Ok(PageOutcome::from_session(session))
    }

    pub async fn session(&self) -> Option<SearchSession> {
        self.session.lock().await.clone()
    }

    pub async fn results(&self) -> Vec<Candidate> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.results().to_vec())
            .unwrap_or_default()
    }

    // ==========================================
    // PAGE LOADING
    // ==========================================
    // Fetch first, then lock and check the generation. If a newer query or
    // page request started meanwhile, the result is thrown away and the
    // caller gets Superseded.

    async fn resolve_video(&self, token: GenerationToken, id: &str) -> Result<PageOutcome> {
        let details = self.api.video_details(&[id.to_string()]).await;
        let mut guard = self.session.lock().await;
        if !token.is_current() {
            debug!(id, "dropping stale video lookup");
            return Ok(PageOutcome::Superseded);
        }

        let items: Vec<Candidate> = details?.into_iter().filter(|c| c.id == id).take(1).collect();
        let session = guard.as_mut().ok_or(CatalogError::NoSession)?;
        session.apply_page(1, items, None);
        Ok(PageOutcome::from_session(session))
    }

    async fn load_page(
        &self,
        token: GenerationToken,
        query: String,
        filter: DurationFilter,
        page: u32,
        page_token: Option<String>,
    ) -> Result<PageOutcome> {
        let filled = match filter {
            DurationFilter::All => self.fill_single(&query, page_token).await,
            _ => self.fill_with_floor(&query, filter, page_token).await,
        };

        let mut guard = self.session.lock().await;
        if !token.is_current() {
            debug!(query, page, "dropping stale page");
            return Ok(PageOutcome::Superseded);
        }

        let filled = filled?;
        let session = guard.as_mut().ok_or(CatalogError::NoSession)?;
        debug!(page, items = filled.items.len(), next = ?filled.next_token, "page loaded");
        session.apply_page(page, filled.items, filled.next_token);
        Ok(PageOutcome::from_session(session))
    }

    // ==========================================
    // FILL STRATEGIES
    // ==========================================
    // fill_single: "all" filter, one upstream page is one session page.
    //
    // fill_with_floor: duration filter, keep pulling upstream pages until
    //   - the page is full, OR
    //   - upstream has no next token, OR
    //   - max_fetch_iterations fetches were made
    // The returned next_token is the one after the last page fetched, so the
    // following session page picks up where this one stopped.

    async fn fill_single(&self, query: &str, page_token: Option<String>) -> Result<FilledPage> {
        let upstream = self.fetch_upstream(query, page_token).await?;
        let items = upstream
            .candidates
            .into_iter()
            .filter(|c| !is_short_form(c))
            .collect();
        Ok(FilledPage {
            items,
            next_token: upstream.next_token,
        })
    }

    async fn fill_with_floor(
        &self,
        query: &str,
        filter: DurationFilter,
        page_token: Option<String>,
    ) -> Result<FilledPage> {
        let page_size = self.settings.page_size;
        let mut collected: Vec<Candidate> = Vec::with_capacity(page_size);
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor = page_token;
        let mut next_token = None;

        for iteration in 1..=self.settings.max_fetch_iterations {
            let upstream = match self.fetch_upstream(query, cursor.clone()).await {
                Ok(upstream) => upstream,
                Err(e) if collected.is_empty() => return Err(e),
                Err(e) => {
                    warn!(iteration, error = %e, "upstream failed mid-page, keeping {} items", collected.len());
                    break;
                }
            };

            next_token = upstream.next_token;
            for candidate in upstream.candidates {
                if !filter.admits(&candidate) || is_short_form(&candidate) {
                    continue;
                }
                if seen.insert(candidate.id.clone()) {
                    collected.push(candidate);
                }
            }

            debug!(iteration, collected = collected.len(), "filtered fetch");
            if collected.len() >= page_size {
                break;
            }
            match &next_token {
                Some(token) => cursor = Some(token.clone()),
                None => break,
            }
        }

        collected.truncate(page_size);
        Ok(FilledPage {
            items: collected,
            next_token,
        })
    }

    // One search call plus one details call for its playable ids
    async fn fetch_upstream(&self, query: &str, page_token: Option<String>) -> Result<UpstreamPage> {
        let request = SearchRequest::text(query, self.settings.page_size).page_token(page_token);
        let page = self.api.search(&request).await?;

        let ids = page.playable_ids();
        let candidates = if ids.is_empty() {
            Vec::new()
        } else {
            order_by_ids(&ids, self.api.video_details(&ids).await?)
        };

        Ok(UpstreamPage {
            candidates,
            next_token: page.next_page_token,
        })
    }
}
