//! Floating heart reactions.
//!
//! Heart ids are derived from the spawn timestamp in milliseconds. Two hearts
//! spawned within the same millisecond get consecutive ids so every live
//! heart stays addressable for its own expiry.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entry::now_ms;

/// Horizontal drift range for the float animation, in percent of the lane width.
const DRIFT_RANGE: i8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartOrigin {
    Manual,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartEvent {
    pub id: u64,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
    pub origin: HeartOrigin,
    /// Sideways drift in `[-30, 30]`.
    pub drift: i8,
}

/// Hearts currently on screen, keyed by id.
#[derive(Debug, Default)]
pub struct HeartBoard {
    live: BTreeMap<u64, HeartEvent>,
    last_id: u64,
}

impl HeartBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<R: Rng + ?Sized>(&mut self, origin: HeartOrigin, rng: &mut R) -> HeartEvent {
        let created_at = now_ms();
        let stamp = u64::try_from(created_at).unwrap_or(0);
        let id = stamp.max(self.last_id + 1);
        self.last_id = id;

        let heart = HeartEvent { id, created_at, origin, drift: rng.random_range(-DRIFT_RANGE..=DRIFT_RANGE) };
        self.live.insert(id, heart);
        heart
    }

    /// Remove a heart. Returns `false` if it was already gone.
    pub fn expire(&mut self, id: u64) -> bool {
        self.live.remove(&id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live hearts, oldest first.
    #[must_use]
    pub fn live(&self) -> Vec<HeartEvent> {
        self.live.values().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn burst_of_hearts_gets_distinct_ids() {
        let mut board = HeartBoard::new();
        let mut rng = StdRng::seed_from_u64(21);
        let ids: Vec<u64> = (0..10).map(|_| board.spawn(HeartOrigin::Manual, &mut rng).id).collect();

        assert_eq!(board.len(), 10);
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids must be strictly increasing: {ids:?}");
    }

    #[test]
    fn expire_removes_only_that_heart() {
        let mut board = HeartBoard::new();
        let mut rng = StdRng::seed_from_u64(22);
        let a = board.spawn(HeartOrigin::Manual, &mut rng);
        let b = board.spawn(HeartOrigin::Auto, &mut rng);

        assert!(board.expire(a.id));
        assert!(!board.expire(a.id));
        assert_eq!(board.live(), vec![b]);
    }

    #[test]
    fn drift_stays_in_range() {
        let mut board = HeartBoard::new();
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..200 {
            let heart = board.spawn(HeartOrigin::Auto, &mut rng);
            assert!((-DRIFT_RANGE..=DRIFT_RANGE).contains(&heart.drift));
        }
    }

    #[test]
    fn id_tracks_timestamp() {
        let mut board = HeartBoard::new();
        let mut rng = StdRng::seed_from_u64(24);
        let heart = board.spawn(HeartOrigin::Manual, &mut rng);
        assert!(heart.id >= u64::try_from(heart.created_at).unwrap());
        assert!(!board.is_empty());
    }
}
