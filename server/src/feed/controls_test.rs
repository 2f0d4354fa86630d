use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

fn panel() -> ControlPanel {
    ControlPanel::new(Controls::default())
}

#[test]
fn defaults_match_slider_start() {
    let controls = panel().controls();
    assert_eq!(controls.cadence_ms.as_ms(), 1000);
    assert_eq!(controls.heart_cadence_ms, HeartCadence::OFF);
    assert_eq!(controls.mood, Mood::Neutral);
}

#[test]
fn apply_reports_only_real_changes() {
    let mut panel = panel();
    let changes = panel
        .apply(ControlUpdate { cadence_ms: Some(1000), mood: Some(Mood::Happy), ..ControlUpdate::default() })
        .unwrap();
    assert_eq!(changes, ControlChanges { cadence: false, heart_cadence: false, mood: true });
    assert_eq!(panel.controls().mood, Mood::Happy);
}

#[test]
fn apply_empty_update_changes_nothing() {
    let mut panel = panel();
    let changes = panel.apply(ControlUpdate::default()).unwrap();
    assert!(!changes.any());
}

#[test]
fn invalid_update_is_atomic() {
    let mut panel = panel();
    let err = panel
        .apply(ControlUpdate { cadence_ms: Some(400), heart_cadence_ms: Some(5), mood: Some(Mood::Hostile) })
        .unwrap_err();
    assert!(matches!(err, ControlError::HeartCadence(_)));
    assert_eq!(panel.controls(), Controls::default());
}

#[test]
fn cadence_error_names_the_slider() {
    let mut panel = panel();
    let err = panel
        .apply(ControlUpdate { cadence_ms: Some(5000), ..ControlUpdate::default() })
        .unwrap_err();
    assert_eq!(err.to_string(), "message cadence 5000ms out of range (100..=3000ms)");
}

#[test]
fn blank_text_is_ignored() {
    let pools = MessagePools::builtin();
    let mut rng = StdRng::seed_from_u64(31);
    let mut panel = panel();
    assert!(panel.submit(&pools, Some("ana"), "   ", &mut rng).is_none());
    assert!(panel.submit(&pools, None, "", &mut rng).is_none());
    assert!(panel.manual_log().is_empty());
}

#[test]
fn submit_trims_and_keeps_username() {
    let pools = MessagePools::builtin();
    let mut rng = StdRng::seed_from_u64(32);
    let mut panel = panel();
    let msg = panel.submit(&pools, Some(" ana "), "  hola chat ", &mut rng).cloned().unwrap();
    assert_eq!(msg, ManualMessage { username: "ana".into(), text: "hola chat".into() });
    assert_eq!(panel.manual_log().len(), 1);
}

#[test]
fn blank_username_falls_back_to_pool() {
    let pools = MessagePools::builtin();
    let mut rng = StdRng::seed_from_u64(33);
    let mut panel = panel();
    for name in [None, Some(""), Some("   ")] {
        let msg = panel.submit(&pools, name, "hi", &mut rng).cloned().unwrap();
        assert!(pools.usernames.contains(&msg.username));
    }
    assert_eq!(panel.manual_log().len(), 3);
}

#[test]
fn compact_manual_drops_converted_prefix() {
    let pools = MessagePools::builtin();
    let mut rng = StdRng::seed_from_u64(34);
    let mut panel = panel();
    for text in ["uno", "dos", "tres"] {
        panel.submit(&pools, Some("ana"), text, &mut rng);
    }

    panel.compact_manual(2);
    assert_eq!(panel.manual_base(), 2);
    let texts: Vec<_> = panel.manual_log().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, ["tres"]);

    // Stale or oversized cursors never move the base backwards or past the log.
    panel.compact_manual(1);
    assert_eq!(panel.manual_base(), 2);
    panel.compact_manual(10);
    assert_eq!(panel.manual_base(), 3);
    assert!(panel.manual_log().is_empty());

    panel.submit(&pools, None, "cuatro", &mut rng);
    assert_eq!(panel.manual_base(), 3);
    assert_eq!(panel.manual_log().len(), 1);
}

#[test]
fn controls_serialize_as_plain_numbers() {
    let json = serde_json::to_value(Controls::default()).unwrap();
    assert_eq!(json, serde_json::json!({"cadence_ms": 1000, "heart_cadence_ms": 0, "mood": "neutral"}));
}

#[test]
fn update_deserializes_partial_json() {
    let update: ControlUpdate = serde_json::from_str(r#"{"mood":"hostile"}"#).unwrap();
    assert_eq!(update, ControlUpdate { mood: Some(Mood::Hostile), ..ControlUpdate::default() });
}
