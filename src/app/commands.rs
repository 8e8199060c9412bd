//! Inbound transport events to the node service.
//!
//! The HTTP/WebSocket adapter translates server callbacks into these and
//! hands them to the control loop, which feeds them to
//! [`NodeService::handle`](super::service::NodeService::handle).

use core::fmt;

use crate::app::ports::SessionSink;
use crate::dispatch::InboundFrame;
use crate::sessions::{SessionId, REMOTE_MAX_LEN};

/// Network events that drive the node core.
pub enum TransportEvent {
    /// A WebSocket handshake completed.
    Connected {
        session: SessionId,
        remote: heapless::String<REMOTE_MAX_LEN>,
        sink: Box<dyn SessionSink>,
    },

    /// The peer closed, or the transport noticed the socket is gone.
    Disconnected { session: SessionId },

    /// One inbound frame.
    Frame {
        session: SessionId,
        frame: InboundFrame,
    },
}

impl TransportEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::Connected { session, .. }
            | Self::Disconnected { session }
            | Self::Frame { session, .. } => *session,
        }
    }
}

impl fmt::Debug for TransportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { session, remote, .. } => f
                .debug_struct("Connected")
                .field("session", session)
                .field("remote", remote)
                .finish_non_exhaustive(),
            Self::Disconnected { session } => f
                .debug_struct("Disconnected")
                .field("session", session)
                .finish(),
            Self::Frame { session, frame } => f
                .debug_struct("Frame")
                .field("session", session)
                .field("kind", &frame.kind)
                .field("fin", &frame.fin)
                .field("len", &frame.payload.len())
                .finish(),
        }
    }
}
