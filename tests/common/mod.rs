// Scripted in-memory catalog shared by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use youtube_queue_engine::error::{CatalogError, Result};
use youtube_queue_engine::youtube::api::{CatalogApi, SearchHit, SearchPage, SearchQuery, SearchRequest};
use youtube_queue_engine::Candidate;

type SearchScript = dyn Fn(&SearchRequest, usize) -> Result<SearchPage> + Send + Sync;

pub struct FakeCatalog {
    script: Box<SearchScript>,
    videos: Mutex<HashMap<String, Candidate>>,
    latency: Duration,
    fail_details: AtomicBool,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    search_log: Mutex<Vec<SearchRequest>>,
    detail_log: Mutex<Vec<Vec<String>>>,
}

impl FakeCatalog {
    /// `script` gets each request and the 0-based index of the search call.
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&SearchRequest, usize) -> Result<SearchPage> + Send + Sync + 'static,
    {
        FakeCatalog {
            script: Box::new(script),
            videos: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
            fail_details: AtomicBool::new(false),
            search_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            search_log: Mutex::new(Vec::new()),
            detail_log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_videos(self, videos: impl IntoIterator<Item = Candidate>) -> Self {
        self.add_videos(videos);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn add_videos(&self, videos: impl IntoIterator<Item = Candidate>) {
        let mut known = self.videos.lock().unwrap();
        for video in videos {
            known.insert(video.id.clone(), video);
        }
    }

    pub fn fail_details(&self, fail: bool) {
        self.fail_details.store(fail, Ordering::SeqCst);
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn detail_count(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.search_log.lock().unwrap().clone()
    }

    pub fn detail_requests(&self) -> Vec<Vec<String>> {
        self.detail_log.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let call = self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_log.lock().unwrap().push(request.clone());
        self.pause().await;
        (self.script)(request, call)
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<Candidate>> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.detail_log.lock().unwrap().push(ids.to_vec());
        self.pause().await;
        if self.fail_details.load(Ordering::SeqCst) {
            return Err(CatalogError::upstream("quota exceeded"));
        }
        let known = self.videos.lock().unwrap();
        Ok(ids.iter().filter_map(|id| known.get(id).cloned()).collect())
    }
}

pub fn clip(id: &str, title: &str, channel: &str, seconds: u64) -> Candidate {
    Candidate::new(id, title, channel).with_duration(seconds)
}

pub fn page(ids: &[String], next: Option<&str>) -> SearchPage {
    SearchPage {
        hits: ids.iter().map(|id| SearchHit::new(id.clone())).collect(),
        next_page_token: next.map(str::to_string),
    }
}

pub fn text_of(request: &SearchRequest) -> Option<&str> {
    match &request.query {
        SearchQuery::Text(q) => Some(q.as_str()),
        SearchQuery::RelatedTo(_) => None,
    }
}
