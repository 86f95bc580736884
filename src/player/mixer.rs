// ==========================================
// QUEUE MIXER MODULE
// ==========================================
// Keeps the playback queue from running dry. One cycle:
//   1. take the single-flight guard (a second trigger while one runs is a no-op)
//   2. "related to the current item" and "inferred genre" searches, concurrently
//   3. drop live/upcoming, merge (first seen wins), one batched details call
//   4. drop what's queued, duplicates of the current item, short-form, blank titles
//   5. diversity-sample a batch and append it, unless the queue was replaced meanwhile
//
// Upstream failures never surface to the listener: a failed source counts as
// an empty one and a cycle with nothing to add just leaves the queue alone.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::queue::QueueHandle;
use super::sampler::sample_diverse;
use crate::classify::{infer_genre, is_short_form, normalize_title, normalized_duplicates};
use crate::config::MixerSettings;
use crate::youtube::api::{order_by_ids, CatalogApi, SearchPage, SearchRequest};
use crate::youtube::models::{Candidate, Provenance};

// ==========================================
// CYCLE OUTCOMES
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixOutcome {
    /// This many items were added to the end of the queue
    Appended(usize),
    /// Another cycle was already running; nothing was fetched
    AlreadyInFlight,
    /// The queue doesn't need more items yet
    NotNeeded,
    /// Upstream returned nothing usable (or failed); the queue is unchanged
    NoCandidates,
    /// The queue was replaced while this cycle ran; its batch was dropped
    Superseded,
}

// ==========================================
// MIXER STRUCT
// ==========================================
pub struct QueueMixer {
    api: Arc<dyn CatalogApi>,
    settings: MixerSettings,
}

impl QueueMixer {
    pub fn new(api: Arc<dyn CatalogApi>, settings: MixerSettings) -> Self {
        QueueMixer { api, settings }
    }

    pub fn settings(&self) -> &MixerSettings {
        &self.settings
    }

    // ==========================================
    // TRIGGERS
    // ==========================================
    // Three ways a cycle starts:
    // - continue_if_needed: after navigation, when the queue is running low
    // - on_nearing_queue_end: unconditionally, seeded from a given item
    // - schedule_continuation: a short delay after play-now

    /// Run a cycle if fewer than `refill_threshold` items follow the current one.
    pub async fn continue_if_needed(&self, queue: &QueueHandle) -> MixOutcome {
        if !queue.needs_continuation(self.settings.refill_threshold).await {
            return MixOutcome::NotNeeded;
        }
        match queue.current().await {
            Some(current) => self.on_nearing_queue_end(queue, &current).await,
            None => MixOutcome::NotNeeded,
        }
    }

    /// One continuation cycle seeded from `current`.
    pub async fn on_nearing_queue_end(&self, queue: &QueueHandle, current: &Candidate) -> MixOutcome {
        let Some(_flight) = queue.try_begin_flight() else {
            debug!(seed = %current.id, "mixer already running, skipping");
            return MixOutcome::AlreadyInFlight;
        };
        let token = queue.generation_token();

        let candidates = self.gather(current).await;
        if candidates.is_empty() {
            return MixOutcome::NoCandidates;
        }

        let queued = queue.ids().await;
        let eligible = eligible_candidates(candidates, &queued, current);
        if eligible.is_empty() {
            debug!(seed = %current.id, "no eligible candidates after filtering");
            return MixOutcome::NoCandidates;
        }

        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let batch = sample_diverse(
            &eligible,
            self.settings.batch_size,
            self.settings.per_channel_cap(),
            &mut rng,
        );

        match queue.append_batch(&token, batch).await {
            None => MixOutcome::Superseded,
            Some(0) => MixOutcome::NoCandidates,
            Some(added) => {
                info!(seed = %current.id, added, "queue extended");
                MixOutcome::Appended(added)
            }
        }
    }

    /// Seed the queue shortly after play-now, without waiting for it to run low.
    /// Does nothing if the queue is replaced before `delay` elapses.
    pub fn schedule_continuation(self: &Arc<Self>, queue: Arc<QueueHandle>, delay: Duration) -> JoinHandle<MixOutcome> {
        let mixer = Arc::clone(self);
        let token = queue.generation_token();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !token.is_current() {
                debug!("queue replaced before scheduled continuation");
                return MixOutcome::Superseded;
            }
            match queue.current().await {
                Some(current) => mixer.on_nearing_queue_end(&queue, &current).await,
                None => MixOutcome::NotNeeded,
            }
        })
    }

    // ==========================================
    // CANDIDATE GATHERING
    // ==========================================
    // Both sources, merged with similarity first, then resolved to
    // full records. Failures are logged and treated as empty.
    async fn gather(&self, current: &Candidate) -> Vec<Candidate> {
        let genre = infer_genre(&current.title);
        let category = self.settings.category_id.clone();
        let related_request =
            SearchRequest::related_to(current.id.clone(), self.settings.source_results).category(category.clone());
        let genre_request = SearchRequest::text(genre, self.settings.source_results).category(category);

        let (related, by_genre) = tokio::join!(
            self.api.search(&related_request),
            self.api.search(&genre_request)
        );
        let related = related.unwrap_or_else(|e| {
            warn!(seed = %current.id, error = %e, "related search failed");
            SearchPage::default()
        });
        let by_genre = by_genre.unwrap_or_else(|e| {
            warn!(genre, error = %e, "genre search failed");
            SearchPage::default()
        });

        let mut provenance: HashMap<String, Provenance> = HashMap::new();
        let mut ids: Vec<String> = Vec::new();
        let sources = [
            (related.playable_ids(), Provenance::ArtistSimilar),
            (by_genre.playable_ids(), Provenance::Genre),
        ];
        for (source_ids, source) in sources {
            for id in source_ids {
                if !provenance.contains_key(&id) {
                    provenance.insert(id.clone(), source);
                    ids.push(id);
                }
            }
        }
        ids.truncate(self.settings.detail_batch_cap);

        if ids.is_empty() {
            return Vec::new();
        }
        debug!(seed = %current.id, genre, ids = ids.len(), "resolving mixer candidates");

        let details = match self.api.video_details(&ids).await {
            Ok(details) => details,
            Err(e) => {
                warn!(seed = %current.id, error = %e, "detail lookup failed");
                return Vec::new();
            }
        };

        order_by_ids(&ids, details)
            .into_iter()
            .map(|c| {
                let source = provenance.get(&c.id).copied().unwrap_or(Provenance::Genre);
                c.with_provenance(source)
            })
            .collect()
    }
}

// ==========================================
// ELIGIBILITY FILTER
// ==========================================
// Drops candidates that are:
// - already queued, or the current item itself
// - short-form
// - blank once normalized
// - the same song as the current item under another upload
fn eligible_candidates(candidates: Vec<Candidate>, queued: &HashSet<String>, current: &Candidate) -> Vec<Candidate> {
    let current_title = normalize_title(&current.title);

    candidates
        .into_iter()
        .filter(|c| {
            if c.id.is_empty() || c.id == current.id || queued.contains(&c.id) {
                return false;
            }
            if is_short_form(c) {
                return false;
            }
            let title = normalize_title(&c.title);
            if title.is_empty() {
                return false;
            }
            current_title.is_empty() || !normalized_duplicates(&title, &current_title)
        })
        .collect()
}
