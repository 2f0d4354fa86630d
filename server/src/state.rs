//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the single `FeedState` (panel, simulator, scheduling slots) and
//! the map of connected overlay clients. Lock order is always feed first,
//! then clients, so an event is broadcast in the same order it was appended.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, RwLock, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::feed::cadence::Jitter;
use crate::feed::controls::ControlPanel;
use crate::feed::entry::ChatEntry;
use crate::feed::pools::MessagePools;
use crate::feed::simulator::Simulator;
use crate::frame::Frame;
use crate::services::scheduler::TaskSlot;

// =============================================================================
// FEED STATE
// =============================================================================

/// Everything the feed owns. Only ever touched under `AppState::feed`.
pub struct FeedState {
    pub panel: ControlPanel,
    pub sim: Simulator,
    pub rng: StdRng,
    pub jitter: Jitter,
    /// The pending automatic chat draw loop.
    pub message_task: TaskSlot,
    /// The pending automatic heart loop. Empty while hearts are off.
    pub heart_task: TaskSlot,
    /// Generation of the live chat loop; a loop with an older epoch must exit.
    pub message_epoch: u64,
    /// Generation of the live heart loop.
    pub heart_epoch: u64,
}

impl FeedState {
    #[must_use]
    pub fn new(config: &Config, pools: Arc<MessagePools>, rng: StdRng) -> Self {
        Self {
            panel: ControlPanel::new(config.controls),
            sim: Simulator::new(pools, config.buffer_cap, config.visible),
            rng,
            jitter: config.jitter,
            message_task: TaskSlot::new(),
            heart_task: TaskSlot::new(),
            message_epoch: 0,
            heart_epoch: 0,
        }
    }

    /// Draw one automatic entry from the active mood.
    pub fn draw(&mut self) -> ChatEntry {
        let mood = self.panel.controls().mood;
        self.sim.draw(mood, &mut self.rng)
    }

    /// Jittered delay until the next automatic draw.
    pub fn next_message_delay(&mut self) -> Duration {
        let base = self.panel.controls().cadence_ms.as_ms();
        self.jitter.next_delay(base, &mut self.rng)
    }

    /// Jittered delay until the next automatic heart, `None` while hearts are off.
    pub fn next_heart_delay(&mut self) -> Option<Duration> {
        let base = self.panel.controls().heart_cadence_ms.base()?;
        Some(self.jitter.next_delay(base, &mut self.rng))
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum: all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<Mutex<FeedState>>,
    /// Connected overlay clients: `client_id` -> sender for outgoing frames.
    pub clients: Arc<RwLock<HashMap<Uuid, mpsc::Sender<Frame>>>>,
    /// How long a heart stays on screen.
    pub heart_ttl: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(config: &Config, pools: MessagePools) -> Self {
        Self::with_rng(config, pools, StdRng::from_os_rng())
    }

    #[must_use]
    pub fn with_rng(config: &Config, pools: MessagePools, rng: StdRng) -> Self {
        let feed = FeedState::new(config, Arc::new(pools), rng);
        Self {
            feed: Arc::new(Mutex::new(feed)),
            clients: Arc::new(RwLock::new(HashMap::new())),
            heart_ttl: config.heart_ttl,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Deterministic state over the built-in pools and default config.
    #[must_use]
    pub fn test_app_state() -> AppState {
        test_app_state_with(&Config::default())
    }

    #[must_use]
    pub fn test_app_state_with(config: &Config) -> AppState {
        AppState::with_rng(config, MessagePools::builtin(), StdRng::seed_from_u64(0xC0FFEE))
    }

    /// Register a fake overlay client and return its receiving end.
    pub async fn connect_client(state: &AppState) -> (Uuid, mpsc::Receiver<Frame>) {
        let client_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(256);
        state.clients.write().await.insert(client_id, tx);
        (client_id, rx)
    }
}
