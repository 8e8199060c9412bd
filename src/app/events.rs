//! Outbound node events.
//!
//! The [`NodeService`](super::service::NodeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (log to serial, count in tests, ...).

use crate::error::DropReason;
use crate::sessions::SessionId;

/// Structured events emitted by the node core.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// The service has started.
    Started { elements: usize, client_count: u32 },

    /// A client connected; `count` is the persisted counter after the bump.
    ClientConnected {
        session: SessionId,
        count: u32,
        remote: String,
    },

    /// A client went away; `count` is unchanged by the disconnect.
    ClientDisconnected { session: SessionId, count: u32 },

    /// An inbound command drove an element.
    CommandApplied { element: String, on: bool },

    /// An inbound frame was discarded without effect.
    CommandDropped { session: SessionId, reason: DropReason },

    /// One sync tick completed.
    SnapshotBroadcast {
        tick: u64,
        elements: usize,
        delivered: usize,
    },

    /// The cleanup sweep removed sessions.
    SessionsReclaimed(usize),
}
