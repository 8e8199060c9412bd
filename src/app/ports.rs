//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService / elements (domain)
//! ```
//!
//! Driven adapters (ADC, 1-Wire bus, WebSocket sessions, NVS, logging)
//! implement these traits.  Elements and the
//! [`NodeService`](super::service::NodeService) consume them via generics,
//! so the domain core never touches hardware directly.

use crate::config::NodeConfig;
use crate::error::{BusError, ElementError, TransportError};

// ───────────────────────────────────────────────────────────────
// Analog input port (hardware → element)
// ───────────────────────────────────────────────────────────────

/// One ADC channel.  Every call samples the input afresh.
pub trait AnalogInput {
    fn read_raw(&mut self) -> Result<u16, ElementError>;
}

// ───────────────────────────────────────────────────────────────
// Temperature bus port (1-Wire sensor bus → element)
// ───────────────────────────────────────────────────────────────

/// A multi-drop temperature bus shared by several probes.
pub trait TemperatureBus {
    /// Start a conversion on every device and wait for it to finish.
    fn request_conversion(&mut self) -> Result<(), BusError>;

    /// Result of the last conversion for the device at `index`.
    fn read_celsius(&mut self, index: u8) -> Result<f32, BusError>;
}

/// Byte-level 1-Wire master.  The electrical protocol lives in the adapter.
pub trait OneWire {
    /// Issue a reset pulse.  `Ok(true)` when at least one device answered.
    fn reset(&mut self) -> Result<bool, BusError>;

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), BusError>;

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), BusError>;

    /// ROM codes of every device on the bus, in search order.
    fn search(&mut self) -> Result<heapless::Vec<u64, 8>, BusError>;
}

// ───────────────────────────────────────────────────────────────
// Session port (domain → live WebSocket client)
// ───────────────────────────────────────────────────────────────

/// Opaque send handle for one live client connection.
///
/// Implementations are created on the transport's thread and handed to the
/// control loop, hence `Send`.
pub trait SessionSink: Send {
    /// Queue a text frame.  Best effort: failures are never retried.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Whether the underlying transport is still open.
    fn is_open(&self) -> bool;

    /// Ask the transport to close the connection.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`NodeEvent`](super::events::NodeEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::NodeEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the node configuration record.
///
/// Implementations MUST validate config values before persisting and
/// reject invalid ranges with [`ConfigError::ValidationFailed`].
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`NodeConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &NodeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic — no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from event system)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
///
/// The main loop implements this by forwarding to
/// [`push_event`](crate::events::push_event); the scheduler itself knows
/// nothing about events or queues.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    /// A recurring periodic schedule fired.
    Periodic,
    /// A one-shot schedule fired (auto-disables after).
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for StorageError {}
