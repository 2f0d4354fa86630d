//! Service configuration parsed from environment variables.
//!
//! Every variable is optional:
//! - `PORT`: listen port (default 3000)
//! - `CHAT_CADENCE_MS`: initial message cadence, 100..=3000 (default 1000)
//! - `HEART_CADENCE_MS`: initial heart cadence, 0 = off (default 0)
//! - `CHAT_MOOD`: `neutral` (default), `happy`, or `hostile`
//! - `CHAT_BUFFER_CAP`: retained entries (default 50)
//! - `CHAT_VISIBLE`: rendered entries (default 12)
//! - `HEART_TTL_MS`: heart animation lifetime (default 1000)
//! - `CHAT_JITTER`: `bursty` (default) or `steady`
//! - `POOLS_FILE`: YAML file replacing the built-in pools
//! - `OVERLAY_DIR`: static overlay page directory

use std::path::PathBuf;
use std::time::Duration;

use crate::feed::cadence::{Cadence, CadenceError, HeartCadence, Jitter, UnknownJitter};
use crate::feed::controls::Controls;
use crate::feed::pools::{MessagePools, Mood, PoolError, UnknownMood};
use crate::feed::simulator::{DEFAULT_BUFFER_CAP, DEFAULT_VISIBLE};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HEART_TTL_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{key}: {source}")]
    Cadence {
        key: &'static str,
        #[source]
        source: CadenceError,
    },
    #[error(transparent)]
    Mood(#[from] UnknownMood),
    #[error(transparent)]
    Jitter(#[from] UnknownJitter),
    #[error("{path}: {source}")]
    Pools {
        path: PathBuf,
        #[source]
        source: PoolError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub controls: Controls,
    pub buffer_cap: usize,
    pub visible: usize,
    pub heart_ttl: Duration,
    pub jitter: Jitter,
    pub pools_file: Option<PathBuf>,
    pub overlay_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            controls: Controls::default(),
            buffer_cap: DEFAULT_BUFFER_CAP,
            visible: DEFAULT_VISIBLE,
            heart_ttl: Duration::from_millis(DEFAULT_HEART_TTL_MS),
            jitter: Jitter::default(),
            pools_file: None,
            overlay_dir: default_overlay_dir(),
        }
    }
}

impl Config {
    /// Build config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any variable that is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any key that is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cadence = match env_parse::<u32>(&lookup, "CHAT_CADENCE_MS")? {
            Some(ms) => Cadence::new(ms).map_err(|source| ConfigError::Cadence { key: "CHAT_CADENCE_MS", source })?,
            None => defaults.controls.cadence_ms,
        };
        let heart_cadence = match env_parse::<u32>(&lookup, "HEART_CADENCE_MS")? {
            Some(ms) => {
                HeartCadence::new(ms).map_err(|source| ConfigError::Cadence { key: "HEART_CADENCE_MS", source })?
            }
            None => defaults.controls.heart_cadence_ms,
        };
        let mood = match lookup("CHAT_MOOD") {
            Some(v) => v.parse::<Mood>()?,
            None => defaults.controls.mood,
        };
        let jitter = match lookup("CHAT_JITTER") {
            Some(v) => v.parse::<Jitter>()?,
            None => defaults.jitter,
        };

        Ok(Self {
            port: env_parse(&lookup, "PORT")?.unwrap_or(defaults.port),
            controls: Controls { cadence_ms: cadence, heart_cadence_ms: heart_cadence, mood },
            buffer_cap: env_parse(&lookup, "CHAT_BUFFER_CAP")?.unwrap_or(defaults.buffer_cap),
            visible: env_parse(&lookup, "CHAT_VISIBLE")?.unwrap_or(defaults.visible),
            heart_ttl: env_parse(&lookup, "HEART_TTL_MS")?.map_or(defaults.heart_ttl, Duration::from_millis),
            jitter,
            pools_file: lookup("POOLS_FILE").filter(|p| !p.trim().is_empty()).map(PathBuf::from),
            overlay_dir: lookup("OVERLAY_DIR").map_or(defaults.overlay_dir, PathBuf::from),
        })
    }

    /// Load the configured pools, or the built-in ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pools`] if `POOLS_FILE` is set and unusable.
    pub fn load_pools(&self) -> Result<MessagePools, ConfigError> {
        let Some(path) = &self.pools_file else {
            return Ok(MessagePools::builtin());
        };
        MessagePools::load(path).map_err(|source| ConfigError::Pools { path: path.clone(), source })
    }
}

fn env_parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn default_overlay_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../overlay")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
