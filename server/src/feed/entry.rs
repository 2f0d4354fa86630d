//! Chat entries and their randomized metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pools::MessagePools;

pub const SUBSCRIBER_PROBABILITY: f64 = 0.20;
pub const MEMBER_PROBABILITY: f64 = 0.10;
pub const MODERATOR_PROBABILITY: f64 = 0.05;

const AVATAR_BASE_URL: &str = "https://i.pravatar.cc/32";
const FALLBACK_USERNAME: &str = "anonymous";
const FALLBACK_COLOR: &str = "#ffffff";

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Drawn by the scheduling loop.
    Auto,
    /// Converted from the manual message log.
    Manual,
}

/// Independent badge flags, each rolled separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Badges {
    pub moderator: bool,
    pub subscriber: bool,
    pub member: bool,
}

impl Badges {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            subscriber: rng.random_bool(SUBSCRIBER_PROBABILITY),
            member: rng.random_bool(MEMBER_PROBABILITY),
            moderator: rng.random_bool(MODERATOR_PROBABILITY),
        }
    }

    /// Labels in render order: MOD, member, SUB.
    #[must_use]
    pub fn labels(self) -> Vec<&'static str> {
        let mut labels = Vec::with_capacity(3);
        if self.moderator {
            labels.push("MOD");
        }
        if self.member {
            labels.push("#3");
        }
        if self.subscriber {
            labels.push("SUB");
        }
        labels
    }
}

/// One line in the chat feed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: Uuid,
    pub username: String,
    pub message: String,
    pub avatar: String,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
    pub badges: Badges,
    pub color: String,
    pub origin: Origin,
}

impl ChatEntry {
    /// Build an entry with fresh id, avatar, color, and badges.
    pub fn build<R: Rng + ?Sized>(
        pools: &MessagePools,
        username: impl Into<String>,
        message: impl Into<String>,
        origin: Origin,
        rng: &mut R,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            username: username.into(),
            message: message.into(),
            avatar: format!("{AVATAR_BASE_URL}?u={}", id.simple()),
            created_at: now_ms(),
            color: random_color(pools, rng),
            badges: Badges::roll(rng),
            origin,
        }
    }
}

pub fn random_username<R: Rng + ?Sized>(pools: &MessagePools, rng: &mut R) -> String {
    pools
        .usernames
        .choose(rng)
        .map_or_else(|| FALLBACK_USERNAME.to_owned(), Clone::clone)
}

pub fn random_color<R: Rng + ?Sized>(pools: &MessagePools, rng: &mut R) -> String {
    pools
        .colors
        .choose(rng)
        .map_or_else(|| FALLBACK_COLOR.to_owned(), Clone::clone)
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn build_fills_metadata_from_pools() {
        let pools = MessagePools::builtin();
        let mut rng = StdRng::seed_from_u64(11);
        let entry = ChatEntry::build(&pools, "LunaByte", "hello", Origin::Manual, &mut rng);

        assert_eq!(entry.username, "LunaByte");
        assert_eq!(entry.message, "hello");
        assert_eq!(entry.origin, Origin::Manual);
        assert!(pools.colors.contains(&entry.color));
        assert!(entry.avatar.starts_with(AVATAR_BASE_URL));
        assert!(entry.avatar.ends_with(&entry.id.simple().to_string()));
        assert!(entry.created_at > 0);
    }

    #[test]
    fn entry_ids_are_unique() {
        let pools = MessagePools::builtin();
        let mut rng = StdRng::seed_from_u64(12);
        let a = ChatEntry::build(&pools, "a", "x", Origin::Auto, &mut rng);
        let b = ChatEntry::build(&pools, "a", "x", Origin::Auto, &mut rng);
        assert_ne!(a.id, b.id);
        assert_ne!(a.avatar, b.avatar);
    }

    #[test]
    fn badge_rates_follow_probabilities() {
        let mut rng = StdRng::seed_from_u64(13);
        let n = 20_000;
        let rolls: Vec<Badges> = (0..n).map(|_| Badges::roll(&mut rng)).collect();
        let rate = |f: fn(&Badges) -> bool| {
            #[allow(clippy::cast_precision_loss)]
            let r = rolls.iter().filter(|b| f(b)).count() as f64 / f64::from(n);
            r
        };
        assert!((rate(|b| b.subscriber) - 0.20).abs() < 0.02);
        assert!((rate(|b| b.member) - 0.10).abs() < 0.015);
        assert!((rate(|b| b.moderator) - 0.05).abs() < 0.01);
    }

    #[test]
    fn badge_labels_render_in_order() {
        let all = Badges { moderator: true, subscriber: true, member: true };
        assert_eq!(all.labels(), vec!["MOD", "#3", "SUB"]);
        assert!(Badges::default().labels().is_empty());
    }

    #[test]
    fn random_username_comes_from_pool() {
        let pools = MessagePools::builtin();
        let mut rng = StdRng::seed_from_u64(14);
        for _ in 0..50 {
            assert!(pools.usernames.contains(&random_username(&pools, &mut rng)));
        }
    }
}
