// Request generations
// There is no way to cancel an in-flight HTTP round-trip, so work is tagged
// with the generation it was issued under and its result is dropped if the
// owner has moved on (new query, new page, queue replaced) by the time it lands.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Generation {
    counter: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Invalidate every outstanding token and hand out one for the new generation.
    pub fn advance(&self) -> GenerationToken {
        let value = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationToken {
            value,
            counter: Arc::clone(&self.counter),
        }
    }

    /// Token for the present generation, without invalidating anything.
    pub fn token(&self) -> GenerationToken {
        GenerationToken {
            value: self.current(),
            counter: Arc::clone(&self.counter),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationToken {
    value: u64,
    counter: Arc<AtomicU64>,
}

impl GenerationToken {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_invalidates_older_tokens() {
        let generation = Generation::new();
        let first = generation.advance();
        assert!(first.is_current());

        let peek = generation.token();
        assert_eq!(peek.value(), first.value());

        let second = generation.advance();
        assert!(!first.is_current());
        assert!(!peek.is_current());
        assert!(second.is_current());
        assert_eq!(second.value(), first.value() + 1);
    }

    #[test]
    fn clones_share_the_counter() {
        let generation = Generation::new();
        let other = generation.clone();
        let token = generation.token();
        other.advance();
        assert!(!token.is_current());
    }
}
