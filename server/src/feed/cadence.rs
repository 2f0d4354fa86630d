//! Cadence values and delay jitter.
//!
//! DESIGN
//! ======
//! A cadence is the base delay between two automatic draws. The scheduler
//! never sleeps for exactly the cadence: each delay is the cadence scaled by
//! a random factor from the active [`Jitter`] policy, then floored at
//! [`MIN_DELAY_MS`] so a tiny cadence can never spin the loop.

use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Hard floor for any scheduled delay.
pub const MIN_DELAY_MS: u64 = 100;

pub const MESSAGE_CADENCE_MIN_MS: u32 = 100;
pub const MESSAGE_CADENCE_MAX_MS: u32 = 3000;
pub const HEART_CADENCE_MIN_MS: u32 = 100;
pub const HEART_CADENCE_MAX_MS: u32 = 10_000;
pub const CADENCE_STEP_MS: u32 = 100;

/// Probability of a burst draw under [`Jitter::Bursty`].
pub const BURST_PROBABILITY: f64 = 0.3;

const BURSTY_RANGE: (f64, f64) = (0.5, 2.0);
const BURST_RANGE: (f64, f64) = (0.3, 0.6);
const STEADY_RANGE: (f64, f64) = (1.0, 1.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cadence {value}ms out of range ({min}..={max}ms)")]
pub struct CadenceError {
    pub value: u32,
    pub min: u32,
    pub max: u32,
}

// =============================================================================
// CADENCE
// =============================================================================

/// Base delay between automatic chat draws, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Cadence(u32);

impl Cadence {
    pub const DEFAULT: Cadence = Cadence(1000);

    /// Validate against `[100, 3000]` and snap to the 100 ms step.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError`] when `ms` is outside the slider range.
    pub fn new(ms: u32) -> Result<Self, CadenceError> {
        checked(ms, MESSAGE_CADENCE_MIN_MS, MESSAGE_CADENCE_MAX_MS).map(Self)
    }

    #[must_use]
    pub fn as_ms(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0))
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Cadence {
    type Error = CadenceError;

    fn try_from(ms: u32) -> Result<Self, Self::Error> {
        Self::new(ms)
    }
}

impl From<Cadence> for u32 {
    fn from(c: Cadence) -> Self {
        c.0
    }
}

/// Automatic heart emission rate. Zero means off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct HeartCadence(Option<u32>);

impl HeartCadence {
    pub const OFF: HeartCadence = HeartCadence(None);

    /// `0` disables automatic hearts; anything else must lie in `[100, 10000]`.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError`] for a non-zero value outside the range.
    pub fn new(ms: u32) -> Result<Self, CadenceError> {
        if ms == 0 {
            return Ok(Self::OFF);
        }
        checked(ms, HEART_CADENCE_MIN_MS, HEART_CADENCE_MAX_MS).map(|ms| Self(Some(ms)))
    }

    #[must_use]
    pub fn as_ms(self) -> u32 {
        self.0.unwrap_or(0)
    }

    /// Base delay, or `None` when automatic hearts are off.
    #[must_use]
    pub fn base(self) -> Option<u32> {
        self.0
    }
}

impl TryFrom<u32> for HeartCadence {
    type Error = CadenceError;

    fn try_from(ms: u32) -> Result<Self, Self::Error> {
        Self::new(ms)
    }
}

impl From<HeartCadence> for u32 {
    fn from(c: HeartCadence) -> Self {
        c.as_ms()
    }
}

fn checked(ms: u32, min: u32, max: u32) -> Result<u32, CadenceError> {
    if !(min..=max).contains(&ms) {
        return Err(CadenceError { value: ms, min, max });
    }
    let snapped = (ms + CADENCE_STEP_MS / 2) / CADENCE_STEP_MS * CADENCE_STEP_MS;
    Ok(snapped.clamp(min, max))
}

// =============================================================================
// JITTER
// =============================================================================

/// How a base cadence is perturbed into the next delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Factor in `[1.0, 1.5)`: never faster than the cadence.
    Steady,
    /// Factor in `[0.5, 2.0]`, or `[0.3, 0.6]` on a burst draw.
    #[default]
    Bursty,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown jitter policy: {0} (expected steady or bursty)")]
pub struct UnknownJitter(pub String);

impl FromStr for Jitter {
    type Err = UnknownJitter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "steady" => Ok(Self::Steady),
            "bursty" | "burst" => Ok(Self::Bursty),
            _ => Err(UnknownJitter(s.to_owned())),
        }
    }
}

impl Jitter {
    /// Bounds of the multiplicative factor across every branch of the policy.
    #[must_use]
    pub fn factor_bounds(self) -> (f64, f64) {
        match self {
            Self::Steady => STEADY_RANGE,
            Self::Bursty => (BURST_RANGE.0, BURSTY_RANGE.1),
        }
    }

    /// Draw one multiplicative factor.
    pub fn factor<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            Self::Steady => rng.random_range(STEADY_RANGE.0..STEADY_RANGE.1),
            Self::Bursty if rng.random_bool(BURST_PROBABILITY) => rng.random_range(BURST_RANGE.0..=BURST_RANGE.1),
            Self::Bursty => rng.random_range(BURSTY_RANGE.0..=BURSTY_RANGE.1),
        }
    }

    /// Next delay for a base cadence, floored at [`MIN_DELAY_MS`].
    pub fn next_delay<R: Rng + ?Sized>(self, base_ms: u32, rng: &mut R) -> Duration {
        let scaled = f64::from(base_ms) * self.factor(rng);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ms = scaled.round() as u64;
        Duration::from_millis(ms.max(MIN_DELAY_MS))
    }

    /// Inclusive bounds of [`Jitter::next_delay`] for a base cadence.
    #[must_use]
    pub fn delay_bounds(self, base_ms: u32) -> (Duration, Duration) {
        let (lo, hi) = self.factor_bounds();
        let base = f64::from(base_ms);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (lo, hi) = ((base * lo).floor() as u64, (base * hi).ceil() as u64);
        (Duration::from_millis(lo.max(MIN_DELAY_MS)), Duration::from_millis(hi.max(MIN_DELAY_MS)))
    }
}

#[cfg(test)]
#[path = "cadence_test.rs"]
mod tests;
