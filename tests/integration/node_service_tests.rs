//! End-to-end NodeService scenarios: connect → command → tick → broadcast.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use sensornode::app::commands::TransportEvent;
use sensornode::app::events::NodeEvent;
use sensornode::app::service::NodeService;
use sensornode::config::NodeConfig;
use sensornode::dispatch::InboundFrame;
use sensornode::element::PageScaffold;
use sensornode::error::{DropReason, RegistryError};
use sensornode::registry::Registry;
use sensornode::sessions::{load_client_count, SessionId};

use crate::mock_hw::{BrokenSensor, EventLog, MockAnalog, MockNvs, MockToggle, TestSink, Wire};

/// Registry {scaffold, A: toggle, B: analog(max 4095, raw 4095)}.
fn board() -> Registry {
    let mut reg = Registry::new();
    reg.register(Box::new(PageScaffold::new("test node"))).unwrap();
    reg.register(Box::new(MockToggle::new("A"))).unwrap();
    let (b, _raw) = MockAnalog::new("B", 4095, 4095);
    reg.register(Box::new(b)).unwrap();
    reg
}

fn connect(
    svc: &mut NodeService,
    nvs: &mut MockNvs,
    log: &mut EventLog,
    session: SessionId,
) -> Arc<Mutex<Wire>> {
    let (sink, wire) = TestSink::open();
    svc.handle(
        TransportEvent::Connected {
            session,
            remote: heapless::String::try_from("10.0.0.7").unwrap(),
            sink,
        },
        nvs,
        log,
    );
    wire
}

fn send(svc: &mut NodeService, nvs: &mut MockNvs, log: &mut EventLog, session: SessionId, text: &str) {
    let frame = InboundFrame::text(text).unwrap();
    svc.handle(TransportEvent::Frame { session, frame }, nvs, log);
}

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

// ── Snapshot scenarios ────────────────────────────────────────

#[test]
fn toggle_command_shows_up_in_next_broadcast() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    let wire = connect(&mut svc, &mut nvs, &mut log, 1);

    send(&mut svc, &mut nvs, &mut log, 1, r#"{"A": true}"#);
    svc.tick(&mut log);

    let sent = wire.lock().unwrap().sent.clone();
    assert_eq!(sent.len(), 1);
    let msg = parse(&sent[0]);
    let obj = msg.as_object().unwrap();
    assert_eq!(obj.len(), 2, "scaffold must not be reported");
    assert_eq!(obj["A"].as_f64(), Some(100.0));
    assert_eq!(obj["B"].as_f64(), Some(0.0));
}

#[test]
fn unknown_key_leaves_snapshot_unchanged() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    let wire = connect(&mut svc, &mut nvs, &mut log, 1);

    svc.tick(&mut log);
    send(&mut svc, &mut nvs, &mut log, 1, r#"{"C": true}"#);
    svc.tick(&mut log);

    let sent = wire.lock().unwrap().sent.clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(parse(&sent[0]), parse(&sent[1]));
    assert!(!log
        .events
        .iter()
        .any(|e| matches!(e, NodeEvent::CommandApplied { .. })));
}

#[test]
fn every_session_receives_the_same_snapshot() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    let w1 = connect(&mut svc, &mut nvs, &mut log, 1);
    let w2 = connect(&mut svc, &mut nvs, &mut log, 2);

    send(&mut svc, &mut nvs, &mut log, 2, r#"{"A": true}"#);
    let report = svc.tick(&mut log);

    assert_eq!(report.delivered, 2);
    assert_eq!(w1.lock().unwrap().sent, w2.lock().unwrap().sent);
}

#[test]
fn reconnecting_client_converges_on_next_tick() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    let _w1 = connect(&mut svc, &mut nvs, &mut log, 1);
    send(&mut svc, &mut nvs, &mut log, 1, r#"{"A": true}"#);
    svc.tick(&mut log);

    svc.handle(TransportEvent::Disconnected { session: 1 }, &mut nvs, &mut log);
    let w2 = connect(&mut svc, &mut nvs, &mut log, 7);
    svc.tick(&mut log);

    let sent = w2.lock().unwrap().sent.clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(parse(&sent[0])["A"].as_f64(), Some(100.0));
}

#[test]
fn failing_sensor_is_omitted_but_others_still_broadcast() {
    let mut reg = board();
    reg.register(Box::new(BrokenSensor { name: "D" })).unwrap();
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(reg, &NodeConfig::default(), &nvs);
    let wire = connect(&mut svc, &mut nvs, &mut log, 1);

    let report = svc.tick(&mut log);

    assert_eq!(report.elements, 2);
    let msg = parse(&wire.lock().unwrap().sent[0]);
    assert!(msg.get("D").is_none());
    assert!(msg.get("A").is_some());
}

#[test]
fn page_contains_every_binding_in_order() {
    let nvs = MockNvs::new();
    let svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    let page = svc.render_page();

    let a = page.find(r#"id="A""#).expect("A display node");
    let b = page.find(r#"id="B""#).expect("B display node");
    assert!(a < b);
    assert!(page.contains(r#"data-element="A""#));
    assert!(!page.contains(r#"data-element="B""#));
}

// ── Registry misconfiguration ─────────────────────────────────

#[test]
fn duplicate_name_fails_before_service_exists() {
    let mut reg = board();
    let err = reg.register(Box::new(MockToggle::new("A"))).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateName("A".into()));
    assert_eq!(reg.len(), 3);
}

// ── Client counter ────────────────────────────────────────────

#[test]
fn counter_is_persisted_on_connect_only() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);

    let _w1 = connect(&mut svc, &mut nvs, &mut log, 1);
    let _w2 = connect(&mut svc, &mut nvs, &mut log, 2);
    assert_eq!(nvs.writes, 2);
    assert_eq!(load_client_count(&nvs), 2);

    svc.handle(TransportEvent::Disconnected { session: 1 }, &mut nvs, &mut log);
    assert_eq!(nvs.writes, 2);
    assert_eq!(load_client_count(&nvs), 2);
    assert_eq!(svc.sessions().client_count(), 2);
    assert_eq!(svc.sessions().session_count(), 1);

    assert!(log.events.contains(&NodeEvent::ClientDisconnected { session: 1, count: 2 }));
}

#[test]
fn counter_resumes_from_storage_after_reboot() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    {
        let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
        let _w = connect(&mut svc, &mut nvs, &mut log, 1);
        let _w = connect(&mut svc, &mut nvs, &mut log, 2);
        let _w = connect(&mut svc, &mut nvs, &mut log, 3);
    }

    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    svc.start(&mut log);
    assert!(log.events.contains(&NodeEvent::Started {
        elements: 3,
        client_count: 3
    }));

    let _w = connect(&mut svc, &mut nvs, &mut log, 4);
    assert_eq!(load_client_count(&nvs), 4);
}

#[test]
fn storage_failure_does_not_reject_the_client() {
    let mut nvs = MockNvs::new();
    nvs.fail_writes = true;
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);

    let wire = connect(&mut svc, &mut nvs, &mut log, 1);
    svc.tick(&mut log);

    assert_eq!(svc.sessions().client_count(), 1);
    assert_eq!(wire.lock().unwrap().sent.len(), 1);
}

// ── Session cleanup ───────────────────────────────────────────

#[test]
fn housekeeping_reclaims_closed_sessions() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    let w1 = connect(&mut svc, &mut nvs, &mut log, 1);
    let _w2 = connect(&mut svc, &mut nvs, &mut log, 2);

    w1.lock().unwrap().open = false;
    assert_eq!(svc.housekeeping(&mut log), 1);
    assert_eq!(svc.sessions().session_count(), 1);
    assert!(log.events.contains(&NodeEvent::SessionsReclaimed(1)));

    assert_eq!(svc.housekeeping(&mut log), 0);
    assert_eq!(svc.sessions().client_count(), 2);
}

#[test]
fn housekeeping_enforces_session_cap_oldest_first() {
    let config = NodeConfig {
        max_sessions: 2,
        ..NodeConfig::default()
    };
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &config, &nvs);
    let oldest = connect(&mut svc, &mut nvs, &mut log, 1);
    let _w2 = connect(&mut svc, &mut nvs, &mut log, 2);
    let _w3 = connect(&mut svc, &mut nvs, &mut log, 3);

    assert_eq!(svc.housekeeping(&mut log), 1);
    assert!(oldest.lock().unwrap().closed_by_server);
    assert!(!svc.sessions().contains(1));
    assert!(svc.sessions().contains(3));
}

// ── Dropped frames ────────────────────────────────────────────

#[test]
fn malformed_frame_is_reported_as_dropped_event_only() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    let wire = connect(&mut svc, &mut nvs, &mut log, 1);

    send(&mut svc, &mut nvs, &mut log, 1, "not json");
    svc.tick(&mut log);

    assert!(log.events.contains(&NodeEvent::CommandDropped {
        session: 1,
        reason: DropReason::Malformed
    }));
    // Nothing but the snapshot goes back to the client.
    let sent = wire.lock().unwrap().sent.clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(parse(&sent[0])["A"].as_f64(), Some(0.0));
}

#[test]
fn rapid_valid_commands_are_all_applied_in_order() {
    let mut nvs = MockNvs::new();
    let mut log = EventLog::new();
    let mut svc = NodeService::new(board(), &NodeConfig::default(), &nvs);
    let _w = connect(&mut svc, &mut nvs, &mut log, 1);

    for i in 0..12 {
        let on = i % 2 == 1;
        send(&mut svc, &mut nvs, &mut log, 1, &format!(r#"{{"A": {}}}"#, on));
    }

    let applied = log
        .events
        .iter()
        .filter(|e| matches!(e, NodeEvent::CommandApplied { .. }))
        .count();
    assert_eq!(applied, 12);
    assert!(!log
        .events
        .iter()
        .any(|e| matches!(e, NodeEvent::CommandDropped { .. })));
    assert_eq!(svc.snapshot().get("A"), Some(100.0));
}
