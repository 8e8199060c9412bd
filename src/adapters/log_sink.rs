//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured node events to the
//! ESP-IDF logger (UART in production).  Per-tick broadcasts are logged at
//! `debug` so the 10 Hz loop does not flood the console.

use log::{debug, info};

use crate::app::events::NodeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`NodeEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &NodeEvent) {
        match event {
            NodeEvent::Started { elements, client_count } => {
                info!("START | elements={} | clients_ever={}", elements, client_count);
            }
            NodeEvent::ClientConnected { session, count, remote } => {
                info!("CONN | WebSocket client #{} connected from {} (session {})", count, remote, session);
            }
            NodeEvent::ClientDisconnected { session, count } => {
                info!("CONN | WebSocket client #{} disconnected (session {})", count, session);
            }
            NodeEvent::CommandApplied { element, on } => {
                info!("CMD | {} <- {}", element, if *on { "on" } else { "off" });
            }
            NodeEvent::CommandDropped { session, reason } => {
                debug!("CMD | dropped frame from session {}: {}", session, reason);
            }
            NodeEvent::SnapshotBroadcast { tick, elements, delivered } => {
                debug!("SYNC | tick={} | elements={} | delivered={}", tick, elements, delivered);
            }
            NodeEvent::SessionsReclaimed(n) => {
                info!("CONN | cleanup reclaimed {} session(s)", n);
            }
        }
    }
}
