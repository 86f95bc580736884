// ==========================================
// PLAYBACK QUEUE MODULE
// ==========================================
// The ordered list of candidates the user is listening through.
//
// Unlike a consume-as-you-go queue, items stay in place after they play:
// `current_index` walks the list, next/previous wrap around, and the mixer
// appends fresh batches at the end when playback gets close to it.
//
// `PlaybackQueue` is the plain data structure. `QueueHandle` wraps it for
// sharing between the console loop and background mixer tasks:
// - a tokio Mutex around the queue itself
// - the mixer's single-flight flag
// - a Generation that advances whenever the queue is replaced
// - a broadcast channel of QueueEvents for whoever displays the queue

use std::collections::HashSet;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use super::flight::{FlightGuard, MixerFlight};
use crate::generation::{Generation, GenerationToken};
use crate::youtube::models::Candidate;

const EVENT_CHANNEL_CAPACITY: usize = 64;

// ==========================================
// QUEUE EVENTS
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum QueueEvent {
    /// The whole queue was swapped out (play-now with a new list)
    Replaced { len: usize, current: Option<usize> },
    /// The current item changed without the list changing
    CurrentChanged { current: usize },
    /// An item was moved; `current` still points at the same item
    Reordered { current: Option<usize> },
    /// The mixer appended a batch
    Appended { added: usize, len: usize },
}

// ==========================================
// QUEUE STRUCT
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaybackQueue {
    items: Vec<Candidate>,
    current_index: Option<usize>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Candidate] {
        &self.items
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.current_index.and_then(|i| self.items.get(i))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|c| c.id == id)
    }

    pub fn ids(&self) -> HashSet<String> {
        self.items.iter().map(|c| c.id.clone()).collect()
    }

    // ==========================================
    // PLAYBACK: play_now()
    // ==========================================
    // Start playing `item`.
    //
    // - With a list (e.g. the search page it was picked from), the list
    //   becomes the queue and `item` is located in it. If it isn't in the
    //   list it is put in front.
    // - Without a list, an item already queued is just selected; anything
    //   else replaces the queue with a single-item list.
    //
    // Returns true when the queue contents were replaced.
    pub fn play_now(&mut self, item: Candidate, list: Option<Vec<Candidate>>) -> bool {
        match list {
            Some(mut list) => {
                let index = match list.iter().position(|c| c.id == item.id) {
                    Some(index) => index,
                    None => {
                        list.insert(0, item);
                        0
                    }
                };
                self.items = list;
                self.current_index = Some(index);
                true
            }
            None => {
                if let Some(index) = self.items.iter().position(|c| c.id == item.id) {
                    self.current_index = Some(index);
                    false
                } else {
                    self.items = vec![item];
                    self.current_index = Some(0);
                    true
                }
            }
        }
    }

    // ==========================================
    // NAVIGATION: advance() / previous()
    // ==========================================
    // Both wrap around. With nothing selected yet, advance starts at the
    // first item and previous at the last.
    pub fn advance(&mut self) -> Option<&Candidate> {
        if self.items.is_empty() {
            return None;
        }
        let next = match self.current_index {
            Some(i) => (i + 1) % self.items.len(),
            None => 0,
        };
        self.current_index = Some(next);
        self.items.get(next)
    }

    pub fn previous(&mut self) -> Option<&Candidate> {
        if self.items.is_empty() {
            return None;
        }
        let len = self.items.len();
        let prev = match self.current_index {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        self.current_index = Some(prev);
        self.items.get(prev)
    }

    pub fn select(&mut self, index: usize) -> Option<&Candidate> {
        if index >= self.items.len() {
            return None;
        }
        self.current_index = Some(index);
        self.items.get(index)
    }

    // ==========================================
    // QUEUE MANAGEMENT: move_item()
    // ==========================================
    // Moves the item at `from` to `to`. The current index follows the item
    // that is playing, wherever it ends up.
    //
    // Example (current = C at 2):
    // - [A, B, C, D], move_item(0, 3) → [B, C, D, A], current = 1
    // - [A, B, C, D], move_item(2, 0) → [C, A, B, D], current = 0
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if let Some(current) = self.current_index {
            self.current_index = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }
        true
    }

    /// Items queued after the current one.
    pub fn remaining_after_current(&self) -> usize {
        match self.current_index {
            Some(i) => self.items.len().saturating_sub(i + 1),
            None => self.items.len(),
        }
    }

    /// Something is playing and fewer than `threshold` items follow it.
    pub fn needs_continuation(&self, threshold: usize) -> bool {
        self.current().is_some() && self.remaining_after_current() < threshold
    }

    // ==========================================
    // QUEUE MANAGEMENT: append()
    // ==========================================
    // Adds items at the end, skipping ids already queued (and repeats within
    // `items`). Returns how many were added.
    pub fn append(&mut self, items: Vec<Candidate>) -> usize {
        let mut ids = self.ids();
        let before = self.items.len();
        for item in items {
            if ids.insert(item.id.clone()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

// ==========================================
// SHARED QUEUE HANDLE
// ==========================================
pub struct QueueHandle {
    queue: Mutex<PlaybackQueue>,
    flight: MixerFlight,
    generation: Generation,
    events: broadcast::Sender<QueueEvent>,
}

impl Default for QueueHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueHandle {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        QueueHandle {
            queue: Mutex::new(PlaybackQueue::new()),
            flight: MixerFlight::new(),
            generation: Generation::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> PlaybackQueue {
        self.queue.lock().await.clone()
    }

    pub async fn current(&self) -> Option<Candidate> {
        self.queue.lock().await.current().cloned()
    }

    pub async fn ids(&self) -> HashSet<String> {
        self.queue.lock().await.ids()
    }

    pub async fn needs_continuation(&self, threshold: usize) -> bool {
        self.queue.lock().await.needs_continuation(threshold)
    }

    /// Token tied to the queue's present contents.
    pub fn generation_token(&self) -> GenerationToken {
        self.generation.token()
    }

    pub fn try_begin_flight(&self) -> Option<FlightGuard<'_>> {
        self.flight.try_begin()
    }

    pub fn is_mixing(&self) -> bool {
        self.flight.is_in_flight()
    }

    /// Replacing the queue invalidates every batch still being mixed for the old one.
    pub async fn play_now(&self, item: Candidate, list: Option<Vec<Candidate>>) -> Option<Candidate> {
        let mut queue = self.queue.lock().await;
        let replaced = queue.play_now(item, list);
        let event = if replaced {
            self.generation.advance();
            QueueEvent::Replaced {
                len: queue.len(),
                current: queue.current_index(),
            }
        } else {
            QueueEvent::CurrentChanged {
                current: queue.current_index().unwrap_or(0),
            }
        };
        self.notify(event);
        queue.current().cloned()
    }

    pub async fn advance(&self) -> Option<Candidate> {
        let mut queue = self.queue.lock().await;
        let next = queue.advance().cloned();
        if let Some(current) = queue.current_index() {
            self.notify(QueueEvent::CurrentChanged { current });
        }
        next
    }

    pub async fn previous(&self) -> Option<Candidate> {
        let mut queue = self.queue.lock().await;
        let prev = queue.previous().cloned();
        if let Some(current) = queue.current_index() {
            self.notify(QueueEvent::CurrentChanged { current });
        }
        prev
    }

    pub async fn select(&self, index: usize) -> Option<Candidate> {
        let mut queue = self.queue.lock().await;
        let selected = queue.select(index).cloned();
        if selected.is_some() {
            self.notify(QueueEvent::CurrentChanged { current: index });
        }
        selected
    }

    pub async fn move_item(&self, from: usize, to: usize) -> bool {
        let mut queue = self.queue.lock().await;
        let moved = queue.move_item(from, to);
        if moved {
            self.notify(QueueEvent::Reordered {
                current: queue.current_index(),
            });
        }
        moved
    }

    /// Append a mixed batch, unless the queue was replaced since `token` was taken.
    /// `None` means the batch was discarded.
    pub async fn append_batch(&self, token: &GenerationToken, items: Vec<Candidate>) -> Option<usize> {
        let mut queue = self.queue.lock().await;
        if !token.is_current() {
            debug!(generation = token.value(), "queue replaced, dropping batch");
            return None;
        }
        let added = queue.append(items);
        if added > 0 {
            self.notify(QueueEvent::Appended {
                added,
                len: queue.len(),
            });
        }
        Some(added)
    }

    // No subscribers is fine
    fn notify(&self, event: QueueEvent) {
        let _ = self.events.send(event);
    }
}
