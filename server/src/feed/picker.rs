//! Shuffled consumption queue over a message pool.
//!
//! Each pass hands out every pool index exactly once in random order. When a
//! pass runs dry the queue is refilled and reshuffled. The first pick of a new
//! pass is never the last pick of the previous one, so a pool with two or more
//! entries never repeats back to back.

use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Default)]
pub struct ShuffledPicker {
    /// Remaining indices of the current pass; picks pop from the back.
    queue: Vec<usize>,
    /// Pool size the queue was built for.
    pool_len: usize,
    last: Option<usize>,
}

impl ShuffledPicker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the current pass. The next pick starts a fresh shuffle.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.pool_len = 0;
        self.last = None;
    }

    /// Picks left before the queue reshuffles.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Pick the next message. Returns `None` only for an empty pool.
    pub fn pick<'a, R: Rng + ?Sized>(&mut self, pool: &'a [String], rng: &mut R) -> Option<&'a str> {
        if pool.is_empty() {
            return None;
        }
        if pool.len() != self.pool_len {
            self.reset();
            self.pool_len = pool.len();
        }
        if self.queue.is_empty() {
            self.refill(rng);
        }
        let index = self.queue.pop()?;
        self.last = Some(index);
        pool.get(index).map(String::as_str)
    }

    fn refill<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.queue.extend(0..self.pool_len);
        self.queue.shuffle(rng);
        // EDGE: avoid repeating the previous pass's final pick across the seam.
        if let (Some(last), Some(&next)) = (self.last, self.queue.last()) {
            if next == last && self.queue.len() > 1 {
                let top = self.queue.len() - 1;
                self.queue.swap(0, top);
            }
        }
    }
}

#[cfg(test)]
#[path = "picker_test.rs"]
mod tests;
