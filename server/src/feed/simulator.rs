//! Chat feed simulator: turns draws and manual messages into feed entries.
//!
//! DESIGN
//! ======
//! The simulator is synchronous and owns no timers. The scheduling loop in
//! `services::feed` decides *when* to draw; this type decides *what* gets
//! appended. That split keeps every feed invariant testable without a
//! runtime:
//! - the retained buffer never exceeds its cap, oldest evicted first
//! - manual messages are converted exactly once, in log order
//! - a mood switch only affects draws made after it

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use super::buffer::RollingBuffer;
use super::controls::ManualMessage;
use super::entry::{ChatEntry, Origin, random_username};
use super::hearts::{HeartBoard, HeartEvent, HeartOrigin};
use super::picker::ShuffledPicker;
use super::pools::{MessagePools, Mood};

pub const DEFAULT_BUFFER_CAP: usize = 50;
pub const DEFAULT_VISIBLE: usize = 12;

#[derive(Debug)]
pub struct Simulator {
    pools: Arc<MessagePools>,
    buffer: RollingBuffer<ChatEntry>,
    picker: ShuffledPicker,
    hearts: HeartBoard,
    /// Absolute count of manual messages already converted into entries.
    manual_seen: usize,
    visible: usize,
}

impl Simulator {
    #[must_use]
    pub fn new(pools: Arc<MessagePools>, buffer_cap: usize, visible: usize) -> Self {
        Self {
            pools,
            buffer: RollingBuffer::new(buffer_cap),
            picker: ShuffledPicker::new(),
            hearts: HeartBoard::new(),
            manual_seen: 0,
            visible: visible.max(1),
        }
    }

    #[must_use]
    pub fn pools(&self) -> &MessagePools {
        &self.pools
    }

    /// Draw one automatic entry from the mood's pool and append it.
    pub fn draw<R: Rng + ?Sized>(&mut self, mood: Mood, rng: &mut R) -> ChatEntry {
        let pools = Arc::clone(&self.pools);
        let message = self.picker.pick(pools.messages(mood), rng).unwrap_or_default();
        if self.picker.remaining() == 0 {
            debug!(%mood, "feed: pool pass complete");
        }
        let username = random_username(&pools, rng);
        let entry = ChatEntry::build(&pools, username, message, Origin::Auto, rng);
        self.append(entry)
    }

    /// Convert the part of the manual log not seen yet. `log[0]` sits at
    /// absolute position `base`. Returns the new entries.
    pub fn ingest_manual<R: Rng + ?Sized>(
        &mut self,
        log: &[ManualMessage],
        base: usize,
        rng: &mut R,
    ) -> Vec<ChatEntry> {
        // EDGE: a log ending before the cursor means it was replaced; start over at its end.
        let start = self.manual_seen.saturating_sub(base).min(log.len());
        let pools = Arc::clone(&self.pools);
        let entries = log[start..]
            .iter()
            .map(|msg| {
                let entry = ChatEntry::build(&pools, msg.username.clone(), msg.text.clone(), Origin::Manual, rng);
                self.append(entry)
            })
            .collect();
        self.manual_seen = base + log.len();
        entries
    }

    /// Drop the current shuffle pass so the next draw starts fresh on the new pool.
    pub fn mood_changed(&mut self) {
        self.picker.reset();
    }

    pub fn spawn_heart<R: Rng + ?Sized>(&mut self, origin: HeartOrigin, rng: &mut R) -> HeartEvent {
        self.hearts.spawn(origin, rng)
    }

    /// Remove a heart after its animation. Returns `false` if it was already gone.
    pub fn expire_heart(&mut self, id: u64) -> bool {
        self.hearts.expire(id)
    }

    #[must_use]
    pub fn live_hearts(&self) -> Vec<HeartEvent> {
        self.hearts.live()
    }

    /// Every retained entry, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &ChatEntry> {
        self.buffer.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[must_use]
    pub fn manual_seen(&self) -> usize {
        self.manual_seen
    }

    /// The rendered tail of the feed, oldest first.
    #[must_use]
    pub fn visible(&self) -> Vec<ChatEntry> {
        self.buffer.tail(self.visible).cloned().collect()
    }

    fn append(&mut self, entry: ChatEntry) -> ChatEntry {
        if let Some(evicted) = self.buffer.push(entry.clone()) {
            debug!(id = %evicted.id, "feed: entry evicted");
        }
        entry
    }
}

#[cfg(test)]
#[path = "simulator_test.rs"]
mod tests;
