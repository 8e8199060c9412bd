//! CommandDispatcher against a mock registry: framing rules and payload shapes.

use sensornode::dispatch::{CommandDispatcher, FrameKind, InboundFrame, MAX_FRAME_LEN};
use sensornode::error::DropReason;
use sensornode::registry::Registry;
use sensornode::sync::SyncEngine;

use crate::mock_hw::{MockAnalog, MockToggle};

fn board() -> Registry {
    let mut reg = Registry::new();
    reg.register(Box::new(MockToggle::new("A"))).unwrap();
    let (b, _raw) = MockAnalog::new("B", 4095, 1000);
    reg.register(Box::new(b)).unwrap();
    reg.register(Box::new(MockToggle::new("C"))).unwrap();
    reg
}

fn levels(reg: &mut Registry) -> (f32, f32, f32) {
    let snap = SyncEngine::new().collect(reg);
    (
        snap.get("A").unwrap(),
        snap.get("B").unwrap(),
        snap.get("C").unwrap(),
    )
}

#[test]
fn applies_known_keys_in_registry_order() {
    let mut reg = board();
    let mut d = CommandDispatcher::new();
    let frame = InboundFrame::text(r#"{"C": true, "A": true, "zzz": false}"#).unwrap();

    let outcome = d.dispatch(&frame, &mut reg).unwrap();

    assert_eq!(
        outcome.applied,
        vec![("A".to_owned(), true), ("C".to_owned(), true)]
    );
    assert_eq!(outcome.ignored, 1);
    assert_eq!(levels(&mut reg).0, 100.0);
    assert_eq!(levels(&mut reg).2, 100.0);
}

#[test]
fn sensed_only_key_is_ignored_not_an_error() {
    let mut reg = board();
    let before = levels(&mut reg);
    let mut d = CommandDispatcher::new();
    let frame = InboundFrame::text(r#"{"B": true}"#).unwrap();

    let outcome = d.dispatch(&frame, &mut reg).unwrap();

    assert!(outcome.applied.is_empty());
    assert_eq!(outcome.ignored, 1);
    assert_eq!(levels(&mut reg), before);
}

#[test]
fn off_command_turns_output_back_off() {
    let mut reg = board();
    let mut d = CommandDispatcher::new();
    d.dispatch(&InboundFrame::text(r#"{"A": true}"#).unwrap(), &mut reg)
        .unwrap();
    d.dispatch(&InboundFrame::text(r#"{"A": false}"#).unwrap(), &mut reg)
        .unwrap();
    assert_eq!(levels(&mut reg).0, 0.0);
    assert_eq!(d.accepted(), 2);
}

#[test]
fn malformed_shapes_leave_every_element_untouched() {
    let payloads = [
        "",
        "not json",
        "[true, false]",
        "true",
        r#""A""#,
        r#"{"A": 1}"#,
        r#"{"A": "true"}"#,
        r#"{"A": null}"#,
        r#"{"A": {"on": true}}"#,
        r#"{"C": true, "A": 1}"#,
        r#"{"A": true"#,
    ];
    let mut reg = board();
    let before = levels(&mut reg);
    let mut d = CommandDispatcher::new();

    for payload in payloads {
        let frame = InboundFrame::text(payload).unwrap();
        assert_eq!(
            d.dispatch(&frame, &mut reg),
            Err(DropReason::Malformed),
            "payload {:?}",
            payload
        );
    }
    assert_eq!(levels(&mut reg), before);
    assert_eq!(d.dropped(), payloads.len() as u32);
    assert_eq!(d.accepted(), 0);
}

#[test]
fn fragmented_and_continuation_frames_are_dropped() {
    let mut reg = board();
    let mut d = CommandDispatcher::new();
    let body = br#"{"A": true}"#;

    let first = InboundFrame::from_parts(FrameKind::Text, false, body).unwrap();
    assert_eq!(d.dispatch(&first, &mut reg), Err(DropReason::Fragmented));

    let last = InboundFrame::from_parts(FrameKind::Continuation, true, body).unwrap();
    assert_eq!(d.dispatch(&last, &mut reg), Err(DropReason::Fragmented));

    assert_eq!(levels(&mut reg).0, 0.0);
}

#[test]
fn binary_and_control_frames_are_dropped() {
    let mut reg = board();
    let mut d = CommandDispatcher::new();
    let body = br#"{"A": true}"#;

    for kind in [FrameKind::Binary, FrameKind::Ping, FrameKind::Pong, FrameKind::Close] {
        let frame = InboundFrame::from_parts(kind, true, body).unwrap();
        assert_eq!(d.dispatch(&frame, &mut reg), Err(DropReason::NotText));
    }
    assert_eq!(levels(&mut reg).0, 0.0);
}

#[test]
fn oversized_payload_cannot_become_a_frame() {
    let big = vec![b' '; MAX_FRAME_LEN + 1];
    assert_eq!(
        InboundFrame::from_parts(FrameKind::Text, true, &big).err(),
        Some(DropReason::TooLarge)
    );
    assert!(InboundFrame::from_parts(FrameKind::Text, true, &big[..MAX_FRAME_LEN]).is_ok());
}

#[test]
fn empty_object_is_accepted_and_does_nothing() {
    let mut reg = board();
    let mut d = CommandDispatcher::new();
    let outcome = d
        .dispatch(&InboundFrame::text("{}").unwrap(), &mut reg)
        .unwrap();
    assert!(outcome.applied.is_empty());
    assert_eq!(outcome.ignored, 0);
}
