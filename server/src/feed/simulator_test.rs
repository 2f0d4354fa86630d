use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

fn sim() -> Simulator {
    Simulator::new(Arc::new(MessagePools::builtin()), DEFAULT_BUFFER_CAP, DEFAULT_VISIBLE)
}

fn manual(username: &str, text: &str) -> ManualMessage {
    ManualMessage { username: username.into(), text: text.into() }
}

#[test]
fn draws_come_from_active_mood() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(41);
    let pools = MessagePools::builtin();
    for _ in 0..20 {
        let entry = sim.draw(Mood::Hostile, &mut rng);
        assert!(pools.messages(Mood::Hostile).contains(&entry.message));
        assert!(pools.usernames.contains(&entry.username));
        assert_eq!(entry.origin, Origin::Auto);
    }
}

#[test]
fn buffer_holds_exactly_the_last_fifty() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(42);
    let mut drawn = Vec::new();
    for _ in 0..137 {
        drawn.push(sim.draw(Mood::Neutral, &mut rng).id);
        assert!(sim.len() <= DEFAULT_BUFFER_CAP);
    }
    let kept: Vec<_> = sim.entries().map(|e| e.id).collect();
    assert_eq!(kept, drawn[drawn.len() - DEFAULT_BUFFER_CAP..]);
}

#[test]
fn visible_is_the_newest_tail() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(43);
    let ids: Vec<_> = (0..30).map(|_| sim.draw(Mood::Happy, &mut rng).id).collect();
    let visible: Vec<_> = sim.visible().iter().map(|e| e.id).collect();
    assert_eq!(visible, ids[30 - DEFAULT_VISIBLE..]);
}

#[test]
fn one_pass_covers_the_whole_pool() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(44);
    let pool_len = MessagePools::builtin().messages(Mood::Neutral).len();
    let seen: HashSet<String> = (0..pool_len).map(|_| sim.draw(Mood::Neutral, &mut rng).message).collect();
    assert_eq!(seen.len(), pool_len);
}

#[test]
fn mood_switch_leaves_existing_entries_alone() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(45);
    let pools = MessagePools::builtin();
    for _ in 0..5 {
        sim.draw(Mood::Happy, &mut rng);
    }
    let before: Vec<ChatEntry> = sim.entries().cloned().collect();

    sim.mood_changed();
    for _ in 0..5 {
        let entry = sim.draw(Mood::Hostile, &mut rng);
        assert!(pools.messages(Mood::Hostile).contains(&entry.message));
    }

    let after: Vec<ChatEntry> = sim.entries().take(5).cloned().collect();
    assert_eq!(before, after);
    assert!(after.iter().all(|e| pools.messages(Mood::Happy).contains(&e.message)));
}

#[test]
fn manual_suffix_is_converted_once() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(46);
    let mut log = vec![manual("ana", "hola")];

    let first = sim.ingest_manual(&log, 0, &mut rng);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].username, "ana");
    assert_eq!(first[0].origin, Origin::Manual);

    // Nothing new: nothing converted.
    assert!(sim.ingest_manual(&log, 0, &mut rng).is_empty());

    log.push(manual("beto", "que tal"));
    log.push(manual("caro", "buenas"));
    let second = sim.ingest_manual(&log, 0, &mut rng);
    let texts: Vec<_> = second.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(texts, ["que tal", "buenas"]);
    assert_eq!(sim.manual_seen(), 3);
    assert_eq!(sim.len(), 3);
}

#[test]
fn manual_and_auto_interleave_by_arrival() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(47);
    sim.draw(Mood::Neutral, &mut rng);
    sim.ingest_manual(&[manual("ana", "hola")], 0, &mut rng);
    sim.draw(Mood::Neutral, &mut rng);

    let origins: Vec<_> = sim.entries().map(|e| e.origin).collect();
    assert_eq!(origins, [Origin::Auto, Origin::Manual, Origin::Auto]);
}

#[test]
fn shrunk_log_resets_cursor() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(48);
    sim.ingest_manual(&[manual("a", "1"), manual("b", "2")], 0, &mut rng);
    assert!(sim.ingest_manual(&[manual("c", "3")], 0, &mut rng).is_empty());
    assert_eq!(sim.manual_seen(), 1);
}

#[test]
fn compacted_log_keeps_cursor_position() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(49);
    sim.ingest_manual(&[manual("a", "1"), manual("b", "2")], 0, &mut rng);

    // Both converted messages were compacted away; only the new one is retained.
    let fresh = sim.ingest_manual(&[manual("c", "3")], 2, &mut rng);
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].message, "3");
    assert_eq!(sim.manual_seen(), 3);

    // A partially compacted log converts only what is past the cursor.
    let fresh = sim.ingest_manual(&[manual("c", "3"), manual("d", "4")], 2, &mut rng);
    let texts: Vec<_> = fresh.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(texts, ["4"]);
    assert_eq!(sim.manual_seen(), 4);
}

#[test]
fn hearts_expire_independently() {
    let mut sim = sim();
    let mut rng = StdRng::seed_from_u64(49);
    let hearts: Vec<_> = (0..4).map(|_| sim.spawn_heart(HeartOrigin::Manual, &mut rng)).collect();
    assert_eq!(sim.live_hearts().len(), 4);

    assert!(sim.expire_heart(hearts[1].id));
    assert!(sim.expire_heart(hearts[3].id));
    let live: Vec<_> = sim.live_hearts().iter().map(|h| h.id).collect();
    assert_eq!(live, [hearts[0].id, hearts[2].id]);
}

#[test]
fn small_buffer_cap_is_honoured() {
    let mut sim = Simulator::new(Arc::new(MessagePools::builtin()), 5, 3);
    let mut rng = StdRng::seed_from_u64(50);
    for _ in 0..20 {
        sim.draw(Mood::Neutral, &mut rng);
    }
    assert_eq!(sim.len(), 5);
    assert_eq!(sim.visible().len(), 3);
}
