//! Mock elements, storage and transport for integration tests.
//!
//! Elements here take arbitrary names so scenarios can use short keys
//! (`"A"`, `"B"`) instead of the pin-derived names of the real variants.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sensornode::app::events::NodeEvent;
use sensornode::app::ports::{EventSink, SessionSink, StorageError, StoragePort};
use sensornode::element::analog::inverted_percent;
use sensornode::element::{markup, Capability, Element};
use sensornode::error::{ElementError, TransportError};

// ── Elements ──────────────────────────────────────────────────

/// Output line with a name of the test's choosing.
pub struct MockToggle {
    name: String,
    on: bool,
}

impl MockToggle {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            on: false,
        }
    }
}

impl Element for MockToggle {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::SensedActuated
    }

    fn read_value(&mut self) -> Result<f32, ElementError> {
        Ok(if self.on { 100.0 } else { 0.0 })
    }

    fn write_value(&mut self, on: bool) -> Result<(), ElementError> {
        self.on = on;
        Ok(())
    }

    fn render(&self) -> String {
        markup::card("Toggle", "State", &self.name, &markup::toggle_control(&self.name, "On"))
    }
}

/// Analog input whose raw sample the test controls through a shared cell.
pub struct MockAnalog {
    name: String,
    max: u16,
    raw: Arc<Mutex<u16>>,
}

impl MockAnalog {
    pub fn new(name: &str, max: u16, raw: u16) -> (Self, Arc<Mutex<u16>>) {
        let raw = Arc::new(Mutex::new(raw));
        let element = Self {
            name: name.to_owned(),
            max,
            raw: Arc::clone(&raw),
        };
        (element, raw)
    }
}

impl Element for MockAnalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::SensedOnly
    }

    fn read_value(&mut self) -> Result<f32, ElementError> {
        let raw = *self.raw.lock().unwrap();
        Ok(inverted_percent(raw, self.max))
    }

    fn write_value(&mut self, _on: bool) -> Result<(), ElementError> {
        Err(ElementError::unsupported_write())
    }

    fn render(&self) -> String {
        markup::card("Analog", "Level (%)", &self.name, "")
    }
}

/// Sensed element whose hardware always fails.
pub struct BrokenSensor {
    pub name: &'static str,
}

impl Element for BrokenSensor {
    fn name(&self) -> &str {
        self.name
    }

    fn capability(&self) -> Capability {
        Capability::SensedOnly
    }

    fn read_value(&mut self) -> Result<f32, ElementError> {
        Err(ElementError::Hardware("sensor offline"))
    }

    fn write_value(&mut self, _on: bool) -> Result<(), ElementError> {
        Err(ElementError::unsupported_write())
    }

    fn render(&self) -> String {
        markup::card("Broken", "n/a", self.name, "")
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    pub writes: usize,
    pub fail_writes: bool,
}

impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&Self::key(namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.store.insert(Self::key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&Self::key(namespace, key))
    }
}

// ── Session transport ─────────────────────────────────────────

#[derive(Default)]
pub struct Wire {
    pub sent: Vec<String>,
    pub open: bool,
    pub closed_by_server: bool,
}

/// Session sink backed by a shared [`Wire`] the test inspects.
pub struct TestSink(pub Arc<Mutex<Wire>>);

impl TestSink {
    pub fn open() -> (Box<dyn SessionSink>, Arc<Mutex<Wire>>) {
        let wire = Arc::new(Mutex::new(Wire {
            open: true,
            ..Wire::default()
        }));
        (Box::new(Self(Arc::clone(&wire))), wire)
    }
}

impl SessionSink for TestSink {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        let mut wire = self.0.lock().unwrap();
        if !wire.open {
            return Err(TransportError::Closed);
        }
        wire.sent.push(text.to_owned());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.0.lock().unwrap().open
    }

    fn close(&mut self) {
        let mut wire = self.0.lock().unwrap();
        wire.open = false;
        wire.closed_by_server = true;
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<NodeEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &NodeEvent) {
        self.events.push(event.clone());
    }
}
