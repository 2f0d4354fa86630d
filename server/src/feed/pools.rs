//! Static word pools: messages per mood, usernames, and username colors.
//!
//! DESIGN
//! ======
//! Pools are read-only after startup. The built-in set covers every list;
//! a YAML file can replace it wholesale. Every list is validated at load
//! time: non-empty and free of blank entries, so draws from it are total.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// MOOD
// =============================================================================

/// Which message pool feeds the automatic draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Happy,
    Hostile,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Neutral, Mood::Happy, Mood::Hostile];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Hostile => "hostile",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown mood: {0} (expected neutral, happy or hostile)")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" | "normal" => Ok(Self::Neutral),
            "happy" | "positive" => Ok(Self::Happy),
            "hostile" | "angry" => Ok(Self::Hostile),
            _ => Err(UnknownMood(s.to_owned())),
        }
    }
}

// =============================================================================
// POOLS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read pools file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid pools yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("pool `{0}` must not be empty")]
    Empty(&'static str),
    #[error("pool `{list}` has a blank entry at index {index}")]
    BlankEntry { list: &'static str, index: usize },
}

/// All static inputs to the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePools {
    pub neutral: Vec<String>,
    pub happy: Vec<String>,
    pub hostile: Vec<String>,
    pub usernames: Vec<String>,
    pub colors: Vec<String>,
}

impl MessagePools {
    /// The pools compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            neutral: owned(NEUTRAL_MESSAGES),
            happy: owned(HAPPY_MESSAGES),
            hostile: owned(HOSTILE_MESSAGES),
            usernames: owned(USERNAMES),
            colors: owned(COLORS),
        }
    }

    /// Parse pools from YAML. Missing keys, empty lists and blank entries
    /// are errors.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Yaml`] for malformed input,
    /// [`PoolError::Empty`] when any list has no entries and
    /// [`PoolError::BlankEntry`] when any entry is whitespace only.
    pub fn from_yaml_str(text: &str) -> Result<Self, PoolError> {
        let pools: Self = serde_yaml::from_str(text)?;
        pools.validate()?;
        Ok(pools)
    }

    /// Load pools from a YAML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Io`] if the file cannot be read, otherwise the
    /// errors of [`MessagePools::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self, PoolError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Message pool for a mood.
    #[must_use]
    pub fn messages(&self, mood: Mood) -> &[String] {
        match mood {
            Mood::Neutral => &self.neutral,
            Mood::Happy => &self.happy,
            Mood::Hostile => &self.hostile,
        }
    }

    fn validate(&self) -> Result<(), PoolError> {
        let lists: [(&'static str, &Vec<String>); 5] = [
            ("neutral", &self.neutral),
            ("happy", &self.happy),
            ("hostile", &self.hostile),
            ("usernames", &self.usernames),
            ("colors", &self.colors),
        ];
        for (name, list) in lists {
            if list.is_empty() {
                return Err(PoolError::Empty(name));
            }
            if let Some(index) = list.iter().position(|s| s.trim().is_empty()) {
                return Err(PoolError::BlankEntry { list: name, index });
            }
        }
        Ok(())
    }
}

impl Default for MessagePools {
    fn default() -> Self {
        Self::builtin()
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// =============================================================================
// BUILT-IN CONTENT
// =============================================================================

const NEUTRAL_MESSAGES: &[&str] = &[
    "hi chat",
    "what game is this?",
    "first time here, looks fun",
    "how long have you been streaming today?",
    "audio is a bit low",
    "lurking from work",
    "what's the plan for tomorrow?",
    "is this a new keyboard?",
    "just got here, what did I miss?",
    "greetings from Buenos Aires",
    "what rank are you?",
    "that map looks different",
    "brb getting food",
    "which settings are you using?",
    "how many hours in this save?",
];

const HAPPY_MESSAGES: &[&str] = &[
    "LETS GOOO",
    "that was insane!!",
    "best stream of the week",
    "gg wp",
    "clip it clip it",
    "you're cracked",
    "PogChamp",
    "love this community <3",
    "what a play",
    "hype hype hype",
    "this is so wholesome",
    "W streamer",
    "legendary moment",
    "happy birthday to the mod!",
    "can't stop laughing",
];

const HOSTILE_MESSAGES: &[&str] = &[
    "uninstall",
    "this is painful to watch",
    "L",
    "how did you miss that",
    "ratio",
    "worst take ever",
    "refund the stream",
    "bro is throwing",
    "skill issue",
    "mods are asleep",
    "boring",
    "my grandma plays better",
    "just give up",
    "cringe",
    "who even watches this",
];

const USERNAMES: &[&str] = &[
    "PixelPanda",
    "NightOwl42",
    "CaptainCrunch",
    "LunaByte",
    "SirLurksAlot",
    "GlitchWizard",
    "TacoTuesday",
    "ZeroCool",
    "MangoMadness",
    "frost_bite",
    "RetroRaccoon",
    "el_gaucho",
    "QuietStorm",
    "NoScopeNana",
    "CoffeeAndCode",
    "turbo_tortuga",
];

const COLORS: &[&str] = &[
    "#ff6b35", "#4ecdc4", "#45b7d1", "#96ceb4", "#feca57", "#a55eea", "#fd79a8", "#00b894", "#e17055", "#74b9ff",
];

#[cfg(test)]
#[path = "pools_test.rs"]
mod tests;
