// Diversity sampling for continuation batches
//
// Half the batch comes from "similar to what's playing", the rest from the
// genre query, and no single channel may take more than its cap. When the
// capped picks can't fill the batch, the remainder is drawn from a fresh
// shuffle of everything without the cap, so a one-channel pool still
// produces a full batch.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::youtube::models::{Candidate, Provenance};

struct Picker<'a> {
    target: usize,
    per_channel_cap: usize,
    picked: Vec<&'a Candidate>,
    chosen: HashSet<&'a str>,
    per_channel: HashMap<String, usize>,
}

impl<'a> Picker<'a> {
    fn is_full(&self) -> bool {
        self.picked.len() >= self.target
    }

    // Capped pass: stops at `limit` picks overall
    fn fill_capped(&mut self, pool: &[&'a Candidate], limit: usize) {
        let limit = limit.min(self.target);
        for &candidate in pool {
            if self.picked.len() >= limit {
                break;
            }
            if self.chosen.contains(candidate.id.as_str()) {
                continue;
            }
            // Items without a channel name aren't counted against anyone
            let channel = candidate.channel_title.to_lowercase();
            if !channel.is_empty() {
                let count = self.per_channel.entry(channel).or_insert(0);
                if *count >= self.per_channel_cap {
                    continue;
                }
                *count += 1;
            }
            self.chosen.insert(candidate.id.as_str());
            self.picked.push(candidate);
        }
    }

    fn fill_relaxed(&mut self, pool: &[&'a Candidate]) {
        for &candidate in pool {
            if self.is_full() {
                break;
            }
            if self.chosen.insert(candidate.id.as_str()) {
                self.picked.push(candidate);
            }
        }
    }
}

/// Pick up to `target` items from `candidates`.
///
/// Returns `min(target, candidates.len())` items (fewer only if ids repeat),
/// with no channel above `per_channel_cap` unless the relaxed fill was needed.
pub fn sample_diverse<R: Rng + ?Sized>(
    candidates: &[Candidate],
    target: usize,
    per_channel_cap: usize,
    rng: &mut R,
) -> Vec<Candidate> {
    let (mut similar, mut genre): (Vec<&Candidate>, Vec<&Candidate>) = candidates
        .iter()
        .partition(|c| c.provenance == Provenance::ArtistSimilar);
    similar.shuffle(rng);
    genre.shuffle(rng);

    let mut picker = Picker {
        target,
        per_channel_cap: per_channel_cap.max(1),
        picked: Vec::with_capacity(target),
        chosen: HashSet::new(),
        per_channel: HashMap::new(),
    };

    picker.fill_capped(&similar, target / 2);
    picker.fill_capped(&genre, target);

    if !picker.is_full() {
        let mut everything: Vec<&Candidate> = candidates.iter().collect();
        everything.shuffle(rng);
        picker.fill_relaxed(&everything);
    }

    picker.picked.into_iter().cloned().collect()
}
