//! Command dispatcher — inbound client messages to element writes.
//!
//! A message is accepted only when it arrives as one complete, unfragmented
//! text frame whose payload is a flat JSON object of `name → bool`:
//!
//! ```text
//!   {"led_32": true, "led_33": false}
//! ```
//!
//! Anything else is dropped with a [`DropReason`] and no element is
//! touched.  A value that is not a boolean invalidates the whole message.
//! Keys that name no registered element, or an element that cannot be
//! actuated, are ignored.  Accepted writes are applied in registry order.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::DropReason;
use crate::registry::Registry;

/// Largest inbound payload kept, in bytes.
pub const MAX_FRAME_LEN: usize = 512;

/// WebSocket opcode class of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
    Continuation,
    Ping,
    Pong,
    Close,
}

/// One inbound frame as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub kind: FrameKind,
    /// Final fragment of its message.
    pub fin: bool,
    pub payload: heapless::Vec<u8, MAX_FRAME_LEN>,
}

impl InboundFrame {
    /// Copy `data` into a bounded frame.
    pub fn from_parts(kind: FrameKind, fin: bool, data: &[u8]) -> Result<Self, DropReason> {
        let payload = heapless::Vec::from_slice(data).map_err(|()| DropReason::TooLarge)?;
        Ok(Self { kind, fin, payload })
    }

    /// Complete text frame.
    pub fn text(text: &str) -> Result<Self, DropReason> {
        Self::from_parts(FrameKind::Text, true, text.as_bytes())
    }
}

/// Parse a payload into the requested output levels.
pub fn parse_command(payload: &[u8]) -> Result<BTreeMap<String, bool>, DropReason> {
    serde_json::from_slice(payload).map_err(|_| DropReason::Malformed)
}

/// What one accepted message did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Elements written, in registry order.
    pub applied: Vec<(String, bool)>,
    /// Keys that matched no actuatable element.
    pub ignored: usize,
}

#[derive(Debug, Default)]
pub struct CommandDispatcher {
    accepted: u32,
    dropped: u32,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `frame` and apply its writes to `registry`.
    ///
    /// `Err` means the frame was dropped and the registry is untouched.
    pub fn dispatch(
        &mut self,
        frame: &InboundFrame,
        registry: &mut Registry,
    ) -> Result<DispatchOutcome, DropReason> {
        let intents = match Self::validate(frame) {
            Ok(intents) => intents,
            Err(reason) => {
                self.dropped = self.dropped.wrapping_add(1);
                debug!("CMD | frame dropped: {}", reason);
                return Err(reason);
            }
        };
        self.accepted = self.accepted.wrapping_add(1);

        let mut outcome = DispatchOutcome::default();
        for element in registry.iter_mut() {
            let Some(&on) = intents.get(element.name()) else {
                continue;
            };
            if !element.capability().is_actuated() {
                continue;
            }
            match element.write_value(on) {
                Ok(()) => outcome.applied.push((element.name().to_owned(), on)),
                Err(e) => warn!("CMD | '{}' write failed: {}", element.name(), e),
            }
        }
        outcome.ignored = intents.len() - outcome.applied.len();
        Ok(outcome)
    }

    fn validate(frame: &InboundFrame) -> Result<BTreeMap<String, bool>, DropReason> {
        if !frame.fin || frame.kind == FrameKind::Continuation {
            return Err(DropReason::Fragmented);
        }
        if frame.kind != FrameKind::Text {
            return Err(DropReason::NotText);
        }
        parse_command(&frame.payload)
    }

    /// Messages accepted so far.
    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    /// Frames dropped so far.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
