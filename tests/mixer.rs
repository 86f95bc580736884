mod common;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use common::{clip, page, FakeCatalog};
use youtube_queue_engine::config::MixerSettings;
use youtube_queue_engine::error::CatalogError;
use youtube_queue_engine::youtube::api::SearchQuery;
use youtube_queue_engine::{Candidate, MixOutcome, Provenance, QueueHandle, QueueMixer};

fn settings() -> MixerSettings {
    MixerSettings {
        seed: Some(42),
        ..MixerSettings::default()
    }
}

// 25 related items over two channels, 25 genre items over three
fn mix_catalog(fail_related: bool, fail_genre: bool) -> FakeCatalog {
    let related: Vec<String> = (0..25).map(|i| format!("r{}", i)).collect();
    let genre: Vec<String> = (0..25).map(|i| format!("g{}", i)).collect();

    let mut videos = Vec::new();
    for i in 0..25 {
        videos.push(clip(
            &format!("r{}", i),
            &format!("Related track {}", i),
            &format!("Artist {}", i % 2),
            240,
        ));
        videos.push(clip(
            &format!("g{}", i),
            &format!("Genre track {}", i),
            &format!("Channel {}", i % 3),
            240,
        ));
    }

    FakeCatalog::new(move |request, _| match &request.query {
        SearchQuery::RelatedTo(_) if fail_related => Err(CatalogError::upstream("related down")),
        SearchQuery::RelatedTo(_) => Ok(page(&related, None)),
        SearchQuery::Text(_) if fail_genre => Err(CatalogError::upstream("search down")),
        SearchQuery::Text(_) => Ok(page(&genre, None)),
    })
    .with_videos(videos)
}

fn seed_item() -> Candidate {
    clip("seed", "Lofi Night Drive", "Artist 0", 240)
}

async fn playing(item: &Candidate) -> QueueHandle {
    let queue = QueueHandle::new();
    queue.play_now(item.clone(), Some(vec![item.clone()])).await;
    queue
}

fn max_per_channel(items: &[Candidate]) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.channel_title.to_lowercase()).or_insert(0) += 1;
    }
    counts.values().copied().max().unwrap_or(0)
}

#[tokio::test]
async fn batch_is_diverse_and_deduplicated() {
    let api = Arc::new(mix_catalog(false, false));
    let mixer = QueueMixer::new(api.clone(), settings());
    let current = seed_item();
    let queue = playing(&current).await;

    let outcome = mixer.on_nearing_queue_end(&queue, &current).await;
    assert_eq!(outcome, MixOutcome::Appended(20));

    let snapshot = queue.snapshot().await;
    assert_eq!(snapshot.len(), 21);
    let appended = &snapshot.items()[1..];
    assert!(max_per_channel(appended) <= 6);

    let unique: HashSet<&str> = snapshot.items().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(unique.len(), 21);

    let similar = appended
        .iter()
        .filter(|c| c.provenance == Provenance::ArtistSimilar)
        .count();
    assert_eq!(similar, 10);

    // One search per source, one detail lookup for the merged ids
    assert_eq!(api.search_count(), 2);
    assert_eq!(api.detail_count(), 1);
    assert_eq!(api.detail_requests()[0].len(), 50);

    let searches = api.searches();
    assert!(searches
        .iter()
        .any(|r| r.query == SearchQuery::RelatedTo("seed".to_string())));
    assert!(searches
        .iter()
        .any(|r| r.query == SearchQuery::Text("lofi mix".to_string())));
    assert!(searches
        .iter()
        .all(|r| r.category_id.as_deref() == Some("10") && r.max_results == 25));
}

#[tokio::test]
async fn concurrent_triggers_run_one_cycle() {
    let api = Arc::new(mix_catalog(false, false));
    let mixer = QueueMixer::new(api.clone(), settings());
    let current = seed_item();
    let queue = playing(&current).await;

    let (a, b) = tokio::join!(
        mixer.on_nearing_queue_end(&queue, &current),
        mixer.on_nearing_queue_end(&queue, &current)
    );

    let outcomes = [a, b];
    assert_eq!(
        outcomes.iter().filter(|o| **o == MixOutcome::AlreadyInFlight).count(),
        1
    );
    assert!(outcomes.contains(&MixOutcome::Appended(20)));
    assert_eq!(api.search_count(), 2);
    assert!(!queue.is_mixing());

    // The guard is released, so the next trigger runs
    let again = mixer.on_nearing_queue_end(&queue, &current).await;
    assert_ne!(again, MixOutcome::AlreadyInFlight);
    assert_eq!(api.search_count(), 4);
}

#[tokio::test]
async fn failed_upstream_leaves_queue_alone() {
    let api = Arc::new(mix_catalog(true, true));
    let mixer = QueueMixer::new(api.clone(), settings());
    let current = seed_item();
    let queue = playing(&current).await;

    assert_eq!(
        mixer.on_nearing_queue_end(&queue, &current).await,
        MixOutcome::NoCandidates
    );
    assert_eq!(queue.snapshot().await.len(), 1);
    assert!(!queue.is_mixing());
    // Nothing to look up
    assert_eq!(api.detail_count(), 0);
}

#[tokio::test]
async fn failed_detail_lookup_leaves_queue_alone() {
    let api = Arc::new(mix_catalog(false, false));
    api.fail_details(true);
    let mixer = QueueMixer::new(api.clone(), settings());
    let current = seed_item();
    let queue = playing(&current).await;

    assert_eq!(
        mixer.on_nearing_queue_end(&queue, &current).await,
        MixOutcome::NoCandidates
    );
    assert_eq!(queue.snapshot().await.len(), 1);
}

#[tokio::test]
async fn one_source_down_still_mixes() {
    let api = Arc::new(mix_catalog(true, false));
    let mixer = QueueMixer::new(api.clone(), settings());
    let current = seed_item();
    let queue = playing(&current).await;

    assert_eq!(
        mixer.on_nearing_queue_end(&queue, &current).await,
        MixOutcome::Appended(20)
    );
    let snapshot = queue.snapshot().await;
    assert!(snapshot.items()[1..]
        .iter()
        .all(|c| c.provenance == Provenance::Genre));
}

#[tokio::test(start_paused = true)]
async fn replaced_queue_drops_the_batch() {
    let api = Arc::new(mix_catalog(false, false).with_latency(Duration::from_millis(100)));
    let mixer = QueueMixer::new(api.clone(), settings());
    let current = seed_item();
    let queue = playing(&current).await;
    let other = clip("other", "Something Else", "Someone", 200);

    let (outcome, _) = tokio::join!(mixer.on_nearing_queue_end(&queue, &current), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.play_now(other.clone(), None).await
    });

    assert_eq!(outcome, MixOutcome::Superseded);
    let ids: Vec<String> = queue.snapshot().await.items().iter().map(|c| c.id.clone()).collect();
    assert_eq!(ids, vec!["other"]);
}

#[tokio::test(start_paused = true)]
async fn scheduled_continuation_seeds_after_delay() {
    let api = Arc::new(mix_catalog(false, false));
    let mixer = Arc::new(QueueMixer::new(api.clone(), settings()));
    let current = seed_item();
    let queue = Arc::new(playing(&current).await);

    let handle = mixer.schedule_continuation(Arc::clone(&queue), Duration::from_secs(1));
    assert_eq!(handle.await.unwrap(), MixOutcome::Appended(20));
    assert_eq!(queue.snapshot().await.len(), 21);
}

#[tokio::test(start_paused = true)]
async fn scheduled_continuation_is_cancelled_by_replacement() {
    let api = Arc::new(mix_catalog(false, false));
    let mixer = Arc::new(QueueMixer::new(api.clone(), settings()));
    let current = seed_item();
    let queue = Arc::new(playing(&current).await);

    let handle = mixer.schedule_continuation(Arc::clone(&queue), Duration::from_secs(1));
    queue
        .play_now(clip("other", "Something Else", "Someone", 200), None)
        .await;

    assert_eq!(handle.await.unwrap(), MixOutcome::Superseded);
    assert_eq!(api.search_count(), 0);
}

#[tokio::test]
async fn refill_waits_for_the_threshold() {
    let api = Arc::new(mix_catalog(false, false));
    let mixer = QueueMixer::new(api.clone(), settings());
    let items: Vec<Candidate> = (0..10)
        .map(|i| clip(&format!("q{}", i), &format!("Queued song {}", i), "Band", 200))
        .collect();
    let queue = QueueHandle::new();
    queue.play_now(items[0].clone(), Some(items)).await;

    assert_eq!(mixer.continue_if_needed(&queue).await, MixOutcome::NotNeeded);
    assert_eq!(api.search_count(), 0);

    // Index 7 leaves two items after it, under the threshold of three
    queue.select(7).await;
    assert_eq!(
        mixer.continue_if_needed(&queue).await,
        MixOutcome::Appended(20)
    );
    assert_eq!(queue.snapshot().await.len(), 30);
}
