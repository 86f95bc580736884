// Search session state
// One per submitted query. Holds the page → continuation token map, which only
// ever grows: once a page's token has been observed it is never replaced.

use std::collections::BTreeMap;

use super::DurationFilter;
use crate::youtube::models::Candidate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    Keyword,
    /// A pasted YouTube URL, already reduced to its video id
    Video(String),
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    query: String,
    kind: QueryKind,
    /// Filter pages are fetched under; fixed for the session's lifetime
    fetch_filter: DurationFilter,
    /// Filter the current view is derived with; `set_filter` changes only this
    active_filter: DurationFilter,
    page_cursor: BTreeMap<u32, Option<String>>,
    current_page: u32,
    known_last_page: Option<u32>,
    fetched: Vec<Candidate>,
    results: Vec<Candidate>,
}

impl SearchSession {
    /// A pasted URL names the one video the user wants, so `Video` sessions
    /// ignore `filter` and always show the resolved item.
    pub fn new(query: impl Into<String>, kind: QueryKind, filter: DurationFilter) -> Self {
        let filter = match kind {
            QueryKind::Video(_) => DurationFilter::All,
            QueryKind::Keyword => filter,
        };
        let mut page_cursor = BTreeMap::new();
        page_cursor.insert(1, None);
        SearchSession {
            query: query.into(),
            kind,
            fetch_filter: filter,
            active_filter: filter,
            page_cursor,
            current_page: 1,
            known_last_page: None,
            fetched: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn kind(&self) -> &QueryKind {
        &self.kind
    }

    pub fn fetch_filter(&self) -> DurationFilter {
        self.fetch_filter
    }

    pub fn active_filter(&self) -> DurationFilter {
        self.active_filter
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn known_last_page(&self) -> Option<u32> {
        self.known_last_page
    }

    pub fn results(&self) -> &[Candidate] {
        &self.results
    }

    /// Continuation token for `page`: `None` if the page hasn't been reached
    /// yet, `Some(None)` for page 1.
    pub fn token_for(&self, page: u32) -> Option<Option<String>> {
        self.page_cursor.get(&page).cloned()
    }

    pub fn has_next_page(&self) -> bool {
        self.page_cursor.contains_key(&(self.current_page + 1))
    }

    /// A view that doesn't reflect a full fetch under the active filter.
    pub fn is_partial(&self) -> bool {
        self.active_filter != self.fetch_filter
    }

    pub fn can_navigate_to(&self, page: u32) -> bool {
        if page == 0 {
            return false;
        }
        if matches!(self.kind, QueryKind::Video(_)) && page != 1 {
            return false;
        }
        if let Some(last) = self.known_last_page {
            if page > last {
                return false;
            }
        }
        self.page_cursor.contains_key(&page)
    }

    pub(crate) fn record_cursor(&mut self, page: u32, token: String) {
        self.page_cursor.entry(page).or_insert(Some(token));
    }

    pub(crate) fn apply_page(&mut self, page: u32, fetched: Vec<Candidate>, next_token: Option<String>) {
        match next_token {
            Some(token) => self.record_cursor(page + 1, token),
            None => self.known_last_page = Some(page),
        }
        self.current_page = page;
        self.fetched = fetched;
        self.rederive_view();
    }

    pub(crate) fn set_active_filter(&mut self, filter: DurationFilter) {
        if matches!(self.kind, QueryKind::Video(_)) {
            return;
        }
        self.active_filter = filter;
        self.rederive_view();
    }

    fn rederive_view(&mut self) {
        let filter = self.active_filter;
        self.results = self
            .fetched
            .iter()
            .filter(|c| filter.admits(c))
            .cloned()
            .collect();
    }
}
