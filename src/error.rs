//! Unified error types for the SensorNode firmware.
//!
//! Every element, bus and transport failure funnels into one of the enums
//! below.  Apart from [`RegistryError`] (which carries the offending name)
//! all variants are `Copy` so they can be passed through the sync and
//! dispatch paths without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Element errors
// ---------------------------------------------------------------------------

/// Which half of the element contract was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Failure of a single element read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementError {
    /// The element's capability set does not include this operation.
    Unsupported { operation: Operation },
    /// The underlying peripheral refused the access.
    Hardware(&'static str),
}

impl ElementError {
    pub const fn unsupported_read() -> Self {
        Self::Unsupported {
            operation: Operation::Read,
        }
    }

    pub const fn unsupported_write() -> Self {
        Self::Unsupported {
            operation: Operation::Write,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { operation } => write!(f, "{operation} not supported"),
            Self::Hardware(msg) => write!(f, "hardware: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Startup misconfiguration of the element registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two elements were registered under the same name.
    DuplicateName(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "duplicate element name '{name}'"),
        }
    }
}

impl core::error::Error for RegistryError {}

// ---------------------------------------------------------------------------
// Sensor bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// No device answered the reset pulse.
    NoPresence,
    /// No device is enumerated at the requested index.
    NoDevice(u8),
    /// Scratchpad CRC did not match.
    CrcMismatch,
    /// The bus driver reported an I/O failure.
    Io,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresence => write!(f, "no presence pulse"),
            Self::NoDevice(idx) => write!(f, "no device at index {idx}"),
            Self::CrcMismatch => write!(f, "scratchpad CRC mismatch"),
            Self::Io => write!(f, "bus I/O failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The peer has gone away.
    Closed,
    /// The send could not be queued.
    SendFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "session closed"),
            Self::SendFailed => write!(f, "send failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound command drops
// ---------------------------------------------------------------------------

/// Why an inbound frame was discarded without effect.
///
/// None of these are reported back to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Part of a fragmented message (or a continuation frame).
    Fragmented,
    /// Binary or control frame.
    NotText,
    /// Payload exceeded the inbound frame buffer.
    TooLarge,
    /// Payload is not a flat object of booleans.
    Malformed,
    /// The frame came from a session that is not registered.
    UnknownSession,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fragmented => write!(f, "fragmented frame"),
            Self::NotText => write!(f, "non-text frame"),
            Self::TooLarge => write!(f, "frame too large"),
            Self::Malformed => write!(f, "malformed payload"),
            Self::UnknownSession => write!(f, "unknown session"),
        }
    }
}
