//! Feed service: scheduling loops, panel operations, and broadcast.
//!
//! DESIGN
//! ======
//! Two self-rescheduling loops run as `ScheduledTask`s: the chat draw loop
//! and, while enabled, the heart loop. Each sleeps for a jittered delay,
//! locks the feed, appends, broadcasts, and computes its next delay.
//!
//! Changing the cadence or the mood bumps the chat loop's epoch and replaces
//! its task under the feed lock (heart cadence does the same for the heart
//! loop). The old task is aborted at its next await; if it already woke and
//! is waiting on the lock, the epoch check makes it exit without drawing.
//! Either way the pending draw is cancelled exactly once, and the new loop
//! starts a full cadence later, drawing from the new pool.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::feed::controls::{ControlError, ControlUpdate, Controls};
use crate::feed::entry::ChatEntry;
use crate::feed::hearts::{HeartEvent, HeartOrigin};
use crate::frame::{Data, Frame};
use crate::services::scheduler::ScheduledTask;
use crate::state::{AppState, FeedState};

/// What a newly connected overlay needs to render immediately.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub entries: Vec<ChatEntry>,
    pub hearts: Vec<HeartEvent>,
    pub controls: Controls,
    pub heart_ttl_ms: u64,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Start the chat loop, and the heart loop if hearts are enabled.
pub async fn start(state: &AppState) {
    let mut feed = state.feed.lock().await;
    schedule_message_loop(state, &mut feed);
    schedule_heart_loop(state, &mut feed);
    let controls = feed.panel.controls();
    let (min_delay, max_delay) = feed.jitter.delay_bounds(controls.cadence_ms.as_ms());
    info!(
        cadence_ms = controls.cadence_ms.as_ms(),
        min_delay_ms = u64::try_from(min_delay.as_millis()).unwrap_or(u64::MAX),
        max_delay_ms = u64::try_from(max_delay.as_millis()).unwrap_or(u64::MAX),
        heart_cadence_ms = controls.heart_cadence_ms.as_ms(),
        mood = %controls.mood,
        jitter = ?feed.jitter,
        "feed: simulator started"
    );
}

/// Cancel both loops. Pending heart expiries still run out on their own.
pub async fn shutdown(state: &AppState) {
    let mut feed = state.feed.lock().await;
    feed.message_epoch += 1;
    feed.heart_epoch += 1;
    feed.message_task.cancel();
    feed.heart_task.cancel();
    info!("feed: simulator stopped");
}

// =============================================================================
// PANEL OPERATIONS
// =============================================================================

/// Apply a control update and reschedule whichever loop it affects.
///
/// # Errors
///
/// Returns [`ControlError`] if a cadence is out of range; nothing changes.
pub async fn apply_update(state: &AppState, update: ControlUpdate) -> Result<Controls, ControlError> {
    let mut feed = state.feed.lock().await;
    let changes = feed.panel.apply(update)?;
    let controls = feed.panel.controls();

    if changes.mood {
        feed.sim.mood_changed();
    }
    if changes.cadence || changes.mood {
        schedule_message_loop(state, &mut feed);
    }
    if changes.heart_cadence {
        schedule_heart_loop(state, &mut feed);
    }
    if changes.any() {
        info!(
            cadence_ms = controls.cadence_ms.as_ms(),
            heart_cadence_ms = controls.heart_cadence_ms.as_ms(),
            mood = %controls.mood,
            "feed: controls changed"
        );
        broadcast(state, &Frame::event(frames::CONTROL_CHANGED, &controls)).await;
    }
    Ok(controls)
}

/// Submit a manual message. Blank text is ignored and returns `None`.
pub async fn submit_message(state: &AppState, username: Option<&str>, text: &str) -> Option<ChatEntry> {
    let mut feed = state.feed.lock().await;
    let FeedState { panel, sim, rng, .. } = &mut *feed;

    panel.submit(sim.pools(), username, text, rng)?;
    let entries = sim.ingest_manual(panel.manual_log(), panel.manual_base(), rng);
    panel.compact_manual(sim.manual_seen());
    for entry in &entries {
        debug!(id = %entry.id, username = %entry.username, "feed: manual entry");
        broadcast(state, &Frame::event(frames::CHAT_ENTRY, entry)).await;
    }
    entries.into_iter().last()
}

/// Throw one heart right now, independent of the heart loop.
pub async fn throw_heart(state: &AppState, origin: HeartOrigin) -> HeartEvent {
    let mut feed = state.feed.lock().await;
    spawn_heart(state, &mut feed, origin).await
}

/// Visible entries, live hearts, and current controls.
pub async fn snapshot(state: &AppState) -> FeedSnapshot {
    let feed = state.feed.lock().await;
    snapshot_locked(state, &feed)
}

// =============================================================================
// CLIENTS
// =============================================================================

/// Register an overlay client and return the snapshot it should render first.
///
/// Registration happens under the feed lock, so the client sees every entry
/// appended after the snapshot and none of those in it twice.
pub async fn subscribe(state: &AppState, client_id: Uuid, tx: tokio::sync::mpsc::Sender<Frame>) -> FeedSnapshot {
    let feed = state.feed.lock().await;
    state.clients.write().await.insert(client_id, tx);
    snapshot_locked(state, &feed)
}

pub async fn unsubscribe(state: &AppState, client_id: Uuid) {
    state.clients.write().await.remove(&client_id);
}

/// Send a frame to every connected client.
pub async fn broadcast(state: &AppState, frame: &Frame) {
    let clients = state.clients.read().await;
    for tx in clients.values() {
        // Best-effort: a client whose channel is full misses this frame.
        let _ = tx.try_send(frame.clone());
    }
}

// =============================================================================
// LOOPS
// =============================================================================

fn schedule_message_loop(state: &AppState, feed: &mut FeedState) {
    feed.message_epoch += 1;
    let epoch = feed.message_epoch;
    let first_delay = feed.panel.controls().cadence_ms.as_duration();

    let task = ScheduledTask::spawn("chat-draw", run_message_loop(state.clone(), epoch, first_delay));
    if feed.message_task.replace(task) {
        debug!(epoch, "feed: pending draw cancelled");
    }
}

fn schedule_heart_loop(state: &AppState, feed: &mut FeedState) {
    feed.heart_epoch += 1;
    let epoch = feed.heart_epoch;
    let Some(base) = feed.panel.controls().heart_cadence_ms.base() else {
        if feed.heart_task.cancel() {
            debug!(epoch, "feed: heart loop stopped");
        }
        return;
    };

    let first_delay = Duration::from_millis(u64::from(base));
    let task = ScheduledTask::spawn("heart", run_heart_loop(state.clone(), epoch, first_delay));
    if feed.heart_task.replace(task) {
        debug!(epoch, "feed: pending heart cancelled");
    }
}

async fn run_message_loop(state: AppState, epoch: u64, first_delay: Duration) {
    let mut delay = first_delay;
    loop {
        tokio::time::sleep(delay).await;

        let mut feed = state.feed.lock().await;
        if feed.message_epoch != epoch {
            return;
        }
        let entry = feed.draw();
        debug!(id = %entry.id, username = %entry.username, badges = ?entry.badges.labels(), "feed: auto entry");
        broadcast(&state, &Frame::event(frames::CHAT_ENTRY, &entry)).await;
        delay = feed.next_message_delay();
    }
}

async fn run_heart_loop(state: AppState, epoch: u64, first_delay: Duration) {
    let mut delay = first_delay;
    loop {
        tokio::time::sleep(delay).await;

        let mut feed = state.feed.lock().await;
        if feed.heart_epoch != epoch {
            return;
        }
        spawn_heart(&state, &mut feed, HeartOrigin::Auto).await;
        let Some(next) = feed.next_heart_delay() else {
            return;
        };
        delay = next;
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn spawn_heart(state: &AppState, feed: &mut FeedState, origin: HeartOrigin) -> HeartEvent {
    let FeedState { sim, rng, .. } = feed;
    let heart = sim.spawn_heart(origin, rng);
    let ttl_ms = u64::try_from(state.heart_ttl.as_millis()).unwrap_or(u64::MAX);

    let frame = Frame::event(frames::HEART_SPAWN, &heart).with_data("ttl_ms", ttl_ms);
    broadcast(state, &frame).await;
    spawn_heart_expiry(state.clone(), heart.id);
    heart
}

/// Remove a heart after its lifetime. Each heart gets its own task, so
/// concurrent hearts never wait on one another.
fn spawn_heart_expiry(state: AppState, id: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(state.heart_ttl).await;
        let mut feed = state.feed.lock().await;
        if feed.sim.expire_heart(id) {
            let frame = Frame::request(frames::HEART_EXPIRE, Data::new()).with_data("id", id);
            broadcast(&state, &frame).await;
        }
    });
}

fn snapshot_locked(state: &AppState, feed: &FeedState) -> FeedSnapshot {
    FeedSnapshot {
        entries: feed.sim.visible(),
        hearts: feed.sim.live_hearts(),
        controls: feed.panel.controls(),
        heart_ttl_ms: u64::try_from(state.heart_ttl.as_millis()).unwrap_or(u64::MAX),
    }
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
