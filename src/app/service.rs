//! Node service — the hexagonal core.
//!
//! [`NodeService`] is the explicit context object of the node: it owns the
//! element registry, the sync engine, the command dispatcher and the
//! connection manager for the lifetime of the process.  All I/O flows
//! through port traits injected at call sites, so the whole service runs
//! against mock adapters in tests.
//!
//! ```text
//!  TransportEvent ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                     │         NodeService          │
//!      sync tick ───▶ │ Registry · Sync · Dispatch   │ ──▶ SessionSink(s)
//!                     │ ConnectionManager            │
//!  StoragePort ◀───── └──────────────────────────────┘
//! ```

use log::info;

use crate::config::NodeConfig;
use crate::dispatch::CommandDispatcher;
use crate::registry::Registry;
use crate::sessions::{load_client_count, ConnectionManager};
use crate::sync::{Snapshot, SyncEngine, SyncReport};

use super::commands::TransportEvent;
use super::events::NodeEvent;
use super::ports::{EventSink, StoragePort};

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

pub struct NodeService {
    registry: Registry,
    sync: SyncEngine,
    dispatcher: CommandDispatcher,
    sessions: ConnectionManager,
}

impl NodeService {
    /// Take ownership of a fully built registry.  The client counter is
    /// resumed from `storage`.
    pub fn new(registry: Registry, config: &NodeConfig, storage: &impl StoragePort) -> Self {
        let count = load_client_count(storage);
        Self {
            registry,
            sync: SyncEngine::new(),
            dispatcher: CommandDispatcher::new(),
            sessions: ConnectionManager::new(config, count),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "NodeService started: {} elements, client counter {}",
            self.registry.len(),
            self.sessions.client_count()
        );
        sink.emit(&NodeEvent::Started {
            elements: self.registry.len(),
            client_count: self.sessions.client_count(),
        });
    }

    // ── Transport events ──────────────────────────────────────

    /// Process one connect / disconnect / inbound frame.
    pub fn handle(
        &mut self,
        event: TransportEvent,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match event {
            TransportEvent::Connected {
                session,
                remote,
                sink: session_sink,
            } => {
                let count = self.sessions.on_connect(session, &remote, session_sink, storage);
                sink.emit(&NodeEvent::ClientConnected {
                    session,
                    count,
                    remote: remote.as_str().to_owned(),
                });
            }

            TransportEvent::Disconnected { session } => {
                if self.sessions.on_disconnect(session) {
                    sink.emit(&NodeEvent::ClientDisconnected {
                        session,
                        count: self.sessions.client_count(),
                    });
                }
            }

            TransportEvent::Frame { session, frame } => {
                let result = self
                    .sessions
                    .check_session(session)
                    .and_then(|()| self.dispatcher.dispatch(&frame, &mut self.registry));
                match result {
                    Ok(outcome) => {
                        for (element, on) in outcome.applied {
                            sink.emit(&NodeEvent::CommandApplied { element, on });
                        }
                    }
                    Err(reason) => sink.emit(&NodeEvent::CommandDropped { session, reason }),
                }
            }
        }
    }

    // ── Periodic work ─────────────────────────────────────────

    /// Poll every reportable element and broadcast the snapshot.
    pub fn tick(&mut self, sink: &mut impl EventSink) -> SyncReport {
        let report = self.sync.run_tick(&mut self.registry, &mut self.sessions);
        sink.emit(&NodeEvent::SnapshotBroadcast {
            tick: report.tick,
            elements: report.elements,
            delivered: report.delivered,
        });
        report
    }

    /// Session sweep; run once per loop iteration.
    pub fn housekeeping(&mut self, sink: &mut impl EventSink) -> usize {
        let reclaimed = self.sessions.cleanup();
        if reclaimed > 0 {
            sink.emit(&NodeEvent::SessionsReclaimed(reclaimed));
        }
        reclaimed
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current readings without broadcasting them.
    pub fn snapshot(&mut self) -> Snapshot {
        self.sync.collect(&mut self.registry)
    }

    /// Full page: every element's markup in registry order.
    pub fn render_page(&self) -> String {
        self.registry.render_page()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn sessions(&self) -> &ConnectionManager {
        &self.sessions
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn ticks(&self) -> u64 {
        self.sync.ticks()
    }
}
