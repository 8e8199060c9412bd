//! Connection manager — live client sessions and the persisted client
//! counter.
//!
//! ```text
//!   connect ──▶ Session{sink} ──▶ counter += 1 ──▶ NVS "clients"
//!   disconnect ──▶ drop session            (counter untouched)
//!   cleanup ──▶ drop closed sessions, then close the oldest above the cap
//! ```
//!
//! The counter counts connections ever accepted: it is rewritten to
//! storage on every connect and is never decremented, so after a reboot it
//! resumes from the last connect.

use log::{debug, info, warn};

use crate::app::ports::{SessionSink, StorageError, StoragePort};
use crate::config::NodeConfig;
use crate::error::DropReason;

/// Transport-assigned session identifier (socket descriptor on device).
pub type SessionId = u32;

/// NVS namespace shared by the config record and the counter.
pub const STORAGE_NAMESPACE: &str = "sensornode";
/// Key of the little-endian `u32` client counter.
pub const CLIENT_COUNT_KEY: &str = "clients";

/// Capacity of the remote-address label.
pub const REMOTE_MAX_LEN: usize = 48;

// ── Counter persistence ───────────────────────────────────────

/// Read the persisted counter.  Missing or unreadable records count as 0.
pub fn load_client_count(storage: &impl StoragePort) -> u32 {
    let mut buf = [0u8; 4];
    match storage.read(STORAGE_NAMESPACE, CLIENT_COUNT_KEY, &mut buf) {
        Ok(4) => u32::from_le_bytes(buf),
        Ok(n) => {
            warn!("client counter record has {} bytes, resetting", n);
            0
        }
        Err(StorageError::NotFound) => 0,
        Err(e) => {
            warn!("client counter read failed ({}), resetting", e);
            0
        }
    }
}

pub fn store_client_count(storage: &mut impl StoragePort, count: u32) -> Result<(), StorageError> {
    storage.write(STORAGE_NAMESPACE, CLIENT_COUNT_KEY, &count.to_le_bytes())
}

// ── Session ───────────────────────────────────────────────────

/// One live real-time connection.
pub struct Session {
    id: SessionId,
    remote: heapless::String<REMOTE_MAX_LEN>,
    sink: Box<dyn SessionSink>,
}

impl Session {
    fn new(id: SessionId, remote: &str, sink: Box<dyn SessionSink>) -> Self {
        Self {
            id,
            remote: truncated(remote),
            sink,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }
}

fn truncated(remote: &str) -> heapless::String<REMOTE_MAX_LEN> {
    let mut out = heapless::String::new();
    for ch in remote.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ── ConnectionManager ─────────────────────────────────────────

pub struct ConnectionManager {
    /// Oldest first.
    sessions: Vec<Session>,
    client_count: u32,
    max_sessions: usize,
}

impl ConnectionManager {
    /// `initial_count` is the counter loaded from storage at boot.
    pub fn new(config: &NodeConfig, initial_count: u32) -> Self {
        Self {
            sessions: Vec::new(),
            client_count: initial_count,
            max_sessions: usize::from(config.max_sessions.max(1)),
        }
    }

    /// Register a new session, bump the counter and persist it.
    ///
    /// Returns the new counter value.  A storage failure is logged; the
    /// session is accepted regardless.
    pub fn on_connect(
        &mut self,
        id: SessionId,
        remote: &str,
        sink: Box<dyn SessionSink>,
        storage: &mut impl StoragePort,
    ) -> u32 {
        if let Some(pos) = self.position(id) {
            // Descriptor reused before its close was observed.
            let mut stale = self.sessions.remove(pos);
            stale.sink.close();
        }
        self.sessions.push(Session::new(id, remote, sink));

        self.client_count = self.client_count.wrapping_add(1);
        if let Err(e) = store_client_count(storage, self.client_count) {
            warn!("CONN | client counter not persisted: {}", e);
        }
        info!("CONN | client #{} connected from {}", self.client_count, remote);
        self.client_count
    }

    /// Forget a session.  The counter is neither decremented nor persisted.
    pub fn on_disconnect(&mut self, id: SessionId) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.sessions.remove(pos);
                info!("CONN | client #{} disconnected (session {})", self.client_count, id);
                true
            }
            None => false,
        }
    }

    /// Reclaim sessions whose transport has closed, then close the oldest
    /// sessions above the cap.  Returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.sink.is_open());

        let excess = self.sessions.len().saturating_sub(self.max_sessions);
        for mut session in self.sessions.drain(..excess) {
            debug!("CONN | closing session {} (over cap)", session.id);
            session.sink.close();
        }

        before - self.sessions.len()
    }

    /// Send `text` to every open session.  Best effort; returns the
    /// number of sessions that accepted the frame.
    pub fn broadcast(&mut self, text: &str) -> usize {
        let mut delivered = 0;
        for session in self.sessions.iter_mut() {
            if !session.sink.is_open() {
                continue;
            }
            match session.sink.send_text(text) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("CONN | send to session {} failed: {}", session.id, e),
            }
        }
        delivered
    }

    /// Inbound frames are only accepted from a live session.
    pub fn check_session(&self, id: SessionId) -> Result<(), DropReason> {
        self.position(id).map(|_| ()).ok_or(DropReason::UnknownSession)
    }

    pub fn client_count(&self) -> u32 {
        self.client_count
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.position(id).is_some()
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    fn position(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::adapters::nvs::NvsAdapter;
    use crate::error::TransportError;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Wire {
        open: bool,
        sent: Vec<String>,
        closed_by_us: bool,
    }

    struct TestSink(Arc<Mutex<Wire>>);

    impl SessionSink for TestSink {
        fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
            let mut w = self.0.lock().unwrap();
            if !w.open {
                return Err(TransportError::Closed);
            }
            w.sent.push(text.to_owned());
            Ok(())
        }
        fn is_open(&self) -> bool {
            self.0.lock().unwrap().open
        }
        fn close(&mut self) {
            let mut w = self.0.lock().unwrap();
            w.open = false;
            w.closed_by_us = true;
        }
    }

    fn sink() -> (Box<dyn SessionSink>, Arc<Mutex<Wire>>) {
        let wire = Arc::new(Mutex::new(Wire {
            open: true,
            ..Default::default()
        }));
        (Box::new(TestSink(wire.clone())), wire)
    }

    fn manager(max_sessions: u8) -> ConnectionManager {
        let cfg = NodeConfig {
            max_sessions,
            ..NodeConfig::default()
        };
        ConnectionManager::new(&cfg, 0)
    }

    #[test]
    fn connect_persists_counter_disconnect_does_not() {
        let mut nvs = NvsAdapter::new().unwrap();
        let mut mgr = manager(8);

        let (s1, _) = sink();
        let (s2, _) = sink();
        assert_eq!(mgr.on_connect(1, "10.0.0.2", s1, &mut nvs), 1);
        assert_eq!(mgr.on_connect(2, "10.0.0.3", s2, &mut nvs), 2);
        assert_eq!(load_client_count(&nvs), 2);

        assert!(mgr.on_disconnect(1));
        assert_eq!(mgr.client_count(), 2);
        assert_eq!(mgr.session_count(), 1);
        assert_eq!(load_client_count(&nvs), 2);
        assert!(!mgr.on_disconnect(1));
    }

    #[test]
    fn counter_resumes_from_storage() {
        let mut nvs = NvsAdapter::new().unwrap();
        store_client_count(&mut nvs, 41).unwrap();

        let mut mgr = ConnectionManager::new(&NodeConfig::default(), load_client_count(&nvs));
        let (s, _) = sink();
        assert_eq!(mgr.on_connect(7, "10.0.0.9", s, &mut nvs), 42);
    }

    #[test]
    fn missing_counter_loads_as_zero() {
        let nvs = NvsAdapter::new().unwrap();
        assert_eq!(load_client_count(&nvs), 0);
    }

    #[test]
    fn broadcast_skips_closed_sessions() {
        let mut nvs = NvsAdapter::new().unwrap();
        let mut mgr = manager(8);
        let (a, wa) = sink();
        let (b, wb) = sink();
        mgr.on_connect(1, "a", a, &mut nvs);
        mgr.on_connect(2, "b", b, &mut nvs);

        wb.lock().unwrap().open = false;
        assert_eq!(mgr.broadcast("{}"), 1);
        assert_eq!(wa.lock().unwrap().sent, vec!["{}".to_owned()]);
        assert!(wb.lock().unwrap().sent.is_empty());
    }

    #[test]
    fn cleanup_reclaims_closed_then_oldest_over_cap() {
        let mut nvs = NvsAdapter::new().unwrap();
        let mut mgr = manager(2);
        let (a, wa) = sink();
        let (b, wb) = sink();
        let (c, _) = sink();
        let (d, _) = sink();
        mgr.on_connect(1, "a", a, &mut nvs);
        mgr.on_connect(2, "b", b, &mut nvs);
        mgr.on_connect(3, "c", c, &mut nvs);
        mgr.on_connect(4, "d", d, &mut nvs);

        wa.lock().unwrap().open = false;
        assert_eq!(mgr.cleanup(), 2);
        assert!(!mgr.contains(1));
        assert!(!mgr.contains(2));
        assert!(wb.lock().unwrap().closed_by_us);
        assert_eq!(mgr.session_count(), 2);
        assert_eq!(mgr.client_count(), 4);
    }

    #[test]
    fn reused_id_replaces_stale_session() {
        let mut nvs = NvsAdapter::new().unwrap();
        let mut mgr = manager(8);
        let (old, w_old) = sink();
        let (new, _) = sink();
        mgr.on_connect(5, "a", old, &mut nvs);
        mgr.on_connect(5, "b", new, &mut nvs);

        assert_eq!(mgr.session_count(), 1);
        assert!(w_old.lock().unwrap().closed_by_us);
        assert_eq!(mgr.sessions().next().map(Session::remote), Some("b"));
    }

    #[test]
    fn frames_from_unknown_sessions_are_refused() {
        let mut nvs = NvsAdapter::new().unwrap();
        let mut mgr = manager(8);
        let (a, _) = sink();
        mgr.on_connect(1, "a", a, &mut nvs);

        for _ in 0..50 {
            assert_eq!(mgr.check_session(1), Ok(()));
        }
        assert_eq!(mgr.check_session(99), Err(DropReason::UnknownSession));
        mgr.on_disconnect(1);
        assert_eq!(mgr.check_session(1), Err(DropReason::UnknownSession));
    }

    #[test]
    fn long_remote_is_truncated() {
        let s = truncated(&"x".repeat(100));
        assert_eq!(s.len(), REMOTE_MAX_LEN);
    }
}
