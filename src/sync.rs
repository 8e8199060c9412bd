//! Sync engine — periodic poll of every reportable element and a full
//! snapshot broadcast to every live session.
//!
//! ```text
//!   tick ──▶ Registry (in order) ──▶ read_value() ──▶ Snapshot ──▶ JSON
//!                                                                   │
//!                         ConnectionManager.broadcast() ◀───────────┘
//! ```
//!
//! Every tick sends the complete snapshot; no per-session "last sent"
//! state exists, so a client that reconnects converges on the next tick.

use log::{debug, warn};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::registry::Registry;
use crate::sessions::ConnectionManager;

/// Ordered `name → value` mapping for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<(String, f32)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: f32) {
        self.entries.push((name.to_owned(), value));
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flat JSON object, keys in registry order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of one broadcast tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub tick: u64,
    pub elements: usize,
    pub delivered: usize,
}

#[derive(Debug, Default)]
pub struct SyncEngine {
    tick: u64,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Read every reportable element, in registry order.
    ///
    /// An element whose peripheral fails is logged and left out of this
    /// tick's snapshot; the others are still reported.
    pub fn collect(&self, registry: &mut Registry) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for element in registry.iter_mut() {
            if !element.capability().is_reportable() {
                continue;
            }
            match element.read_value() {
                Ok(value) => snapshot.push(element.name(), value),
                Err(e) => warn!("SYNC | '{}' read failed: {}", element.name(), e),
            }
        }
        snapshot
    }

    /// Collect, serialise and broadcast one snapshot.
    pub fn run_tick(&mut self, registry: &mut Registry, sessions: &mut ConnectionManager) -> SyncReport {
        self.tick += 1;
        let snapshot = self.collect(registry);

        let delivered = match snapshot.to_json() {
            Ok(text) => sessions.broadcast(&text),
            Err(e) => {
                warn!("SYNC | tick {} serialisation failed: {}", self.tick, e);
                0
            }
        };

        debug!(
            "SYNC | tick {} — {} elements → {} sessions",
            self.tick,
            snapshot.len(),
            delivered
        );

        SyncReport {
            tick: self.tick,
            elements: snapshot.len(),
            delivered,
        }
    }
}
