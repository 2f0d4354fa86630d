//! Control panel: the user-adjustable simulation parameters.
//!
//! DESIGN
//! ======
//! The panel owns the parameters and the manual message log. It never
//! touches the feed directly; the simulator reads the log suffix it has not
//! seen yet. Updates are validated as a whole before any field changes, so a
//! rejected update leaves the panel untouched.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cadence::{Cadence, CadenceError, HeartCadence};
use super::entry::random_username;
use super::pools::{MessagePools, Mood};

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("message {0}")]
    Cadence(CadenceError),
    #[error("heart {0}")]
    HeartCadence(CadenceError),
}

/// Current parameter values. This is also the wire shape of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Controls {
    pub cadence_ms: Cadence,
    pub heart_cadence_ms: HeartCadence,
    pub mood: Mood,
}

/// Partial update. Absent fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ControlUpdate {
    pub cadence_ms: Option<u32>,
    pub heart_cadence_ms: Option<u32>,
    pub mood: Option<Mood>,
}

/// Which parameters an applied update actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlChanges {
    pub cadence: bool,
    pub heart_cadence: bool,
    pub mood: bool,
}

impl ControlChanges {
    #[must_use]
    pub fn any(self) -> bool {
        self.cadence || self.heart_cadence || self.mood
    }
}

/// One message typed into the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualMessage {
    pub username: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct ControlPanel {
    controls: Controls,
    /// Messages not yet compacted away. `manual_log[0]` is message number
    /// `manual_base` counted from startup.
    manual_log: Vec<ManualMessage>,
    manual_base: usize,
}

impl ControlPanel {
    #[must_use]
    pub fn new(controls: Controls) -> Self {
        Self { controls, manual_log: Vec::new(), manual_base: 0 }
    }

    #[must_use]
    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Validate then apply an update.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] if any cadence is out of range. Nothing is
    /// applied in that case.
    pub fn apply(&mut self, update: ControlUpdate) -> Result<ControlChanges, ControlError> {
        let cadence = update
            .cadence_ms
            .map(Cadence::new)
            .transpose()
            .map_err(ControlError::Cadence)?;
        let heart_cadence = update
            .heart_cadence_ms
            .map(HeartCadence::new)
            .transpose()
            .map_err(ControlError::HeartCadence)?;

        let mut changes = ControlChanges::default();
        if let Some(cadence) = cadence {
            changes.cadence = cadence != self.controls.cadence_ms;
            self.controls.cadence_ms = cadence;
        }
        if let Some(heart_cadence) = heart_cadence {
            changes.heart_cadence = heart_cadence != self.controls.heart_cadence_ms;
            self.controls.heart_cadence_ms = heart_cadence;
        }
        if let Some(mood) = update.mood {
            changes.mood = mood != self.controls.mood;
            self.controls.mood = mood;
        }
        Ok(changes)
    }

    /// Append a manual message. Blank text is ignored and returns `None`;
    /// a blank username is replaced by a random one from the pool.
    pub fn submit<R: Rng + ?Sized>(
        &mut self,
        pools: &MessagePools,
        username: Option<&str>,
        text: &str,
        rng: &mut R,
    ) -> Option<&ManualMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let username = match username.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => random_username(pools, rng),
        };
        self.manual_log.push(ManualMessage { username, text: text.to_owned() });
        self.manual_log.last()
    }

    /// Retained manual messages, oldest first.
    #[must_use]
    pub fn manual_log(&self) -> &[ManualMessage] {
        &self.manual_log
    }

    /// Absolute position of the first retained message.
    #[must_use]
    pub fn manual_base(&self) -> usize {
        self.manual_base
    }

    /// Drop every message before absolute position `cursor`. Positions stay
    /// stable, so a cursor taken before compaction remains valid after it.
    pub fn compact_manual(&mut self, cursor: usize) {
        let n = cursor.saturating_sub(self.manual_base).min(self.manual_log.len());
        self.manual_log.drain(..n);
        self.manual_base += n;
    }
}

#[cfg(test)]
#[path = "controls_test.rs"]
mod tests;
