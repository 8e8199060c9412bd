//! HTTP page + WebSocket transport.
//!
//! ```text
//!   httpd task                          control loop
//!   ──────────                          ────────────
//!   GET /      → pre-rendered page
//!   /ws new    ─┐
//!   /ws frame  ─┼─▶ TRANSPORT_CHANNEL ─▶ drain_transport_events()
//!   /ws closed ─┘      (embassy-sync)          │
//!                                              ▼
//!                                     NodeService::handle()
//! ```
//!
//! The server callbacks never touch the registry.  They translate each
//! callback into a [`TransportEvent`] and queue it; the control loop is
//! the only consumer.  Outbound snapshots go the other way through a
//! [`WsSessionSink`] wrapping the connection's detached sender.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::TransportEvent;
use crate::app::ports::SessionSink;
use crate::sessions::{SessionId, REMOTE_MAX_LEN};

/// Pending transport events before callbacks start dropping.
pub const TRANSPORT_QUEUE_DEPTH: usize = 16;

pub const PAGE_URI: &str = "/";
pub const WS_URI: &str = "/ws";

static TRANSPORT_CHANNEL: Channel<CriticalSectionRawMutex, TransportEvent, TRANSPORT_QUEUE_DEPTH> =
    Channel::new();

/// Queue an event for the control loop.  Returns `false` when the queue
/// is full and the event was dropped.
pub fn push_transport_event(event: TransportEvent) -> bool {
    match TRANSPORT_CHANNEL.try_send(event) {
        Ok(()) => true,
        Err(embassy_sync::channel::TrySendError::Full(dropped)) => {
            warn!("transport queue full, dropping {:?}", dropped);
            false
        }
    }
}

/// Queue a new session for the control loop.  If the queue is full the
/// sink is closed on the spot so the client reconnects instead of
/// holding a socket nobody broadcasts to.
pub fn admit_session(
    session: SessionId,
    remote: heapless::String<REMOTE_MAX_LEN>,
    sink: Box<dyn SessionSink>,
) -> bool {
    let event = TransportEvent::Connected {
        session,
        remote,
        sink,
    };
    match TRANSPORT_CHANNEL.try_send(event) {
        Ok(()) => true,
        Err(embassy_sync::channel::TrySendError::Full(TransportEvent::Connected {
            mut sink, ..
        })) => {
            warn!("transport queue full, closing new session {}", session);
            sink.close();
            false
        }
        Err(embassy_sync::channel::TrySendError::Full(_)) => false,
    }
}

/// Hand every queued event to `handler`, in arrival order.
pub fn drain_transport_events(mut handler: impl FnMut(TransportEvent)) -> usize {
    let mut n = 0;
    while let Ok(event) = TRANSPORT_CHANNEL.try_receive() {
        handler(event);
        n += 1;
    }
    n
}

// ── ESP-IDF server ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::{start_server, WsSessionSink};

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::http::server::ws::{EspHttpWsConnection, EspHttpWsDetachedSender};
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::http::Method;
    use esp_idf_svc::io::Write;
    use esp_idf_svc::sys::{EspError, ESP_FAIL};
    use esp_idf_svc::ws::FrameType;
    use log::{debug, info};

    use super::{admit_session, push_transport_event, PAGE_URI, WS_URI};
    use crate::app::commands::TransportEvent;
    use crate::app::ports::SessionSink;
    use crate::dispatch::{FrameKind, InboundFrame, MAX_FRAME_LEN};
    use crate::error::{DropReason, TransportError};
    use crate::sessions::REMOTE_MAX_LEN;

    /// Outbound half of one WebSocket connection.
    pub struct WsSessionSink {
        sender: EspHttpWsDetachedSender,
        closed: bool,
    }

    impl SessionSink for WsSessionSink {
        fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
            if !self.is_open() {
                return Err(TransportError::Closed);
            }
            self.sender
                .send(FrameType::Text(false), text.as_bytes())
                .map_err(|_| TransportError::SendFailed)
        }

        fn is_open(&self) -> bool {
            !self.closed && !self.sender.is_closed()
        }

        fn close(&mut self) {
            if self.is_open() {
                let _ = self.sender.send(FrameType::Close, &[]);
            }
            self.closed = true;
        }
    }

    /// Start the server.  `page` is rendered once from the registry.
    pub fn start_server(
        page: String,
        port: u16,
        max_sessions: u8,
    ) -> Result<EspHttpServer<'static>, EspError> {
        let config = Configuration {
            http_port: port,
            // One spare socket for the page request.
            max_open_sockets: (usize::from(max_sessions) + 1).min(7),
            stack_size: 10 * 1024,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&config)?;

        server.fn_handler(PAGE_URI, Method::Get, move |req| {
            let mut resp = req.into_response(200, None, &[("Content-Type", "text/html")])?;
            resp.write_all(page.as_bytes())
        })?;

        server.ws_handler(WS_URI, move |ws: &mut EspHttpWsConnection| -> Result<(), EspError> {
            let session = ws.session() as u32;

            if ws.is_new() {
                let sink = WsSessionSink {
                    sender: ws.create_detached_sender()?,
                    closed: false,
                };
                if !admit_session(session, peer_label(ws.session()), Box::new(sink)) {
                    return Err(EspError::from_infallible::<ESP_FAIL>());
                }
                return Ok(());
            }

            if ws.is_closed() {
                push_transport_event(TransportEvent::Disconnected { session });
                return Ok(());
            }

            let mut buf = [0u8; MAX_FRAME_LEN];
            let (frame_type, len) = ws.recv(&mut [])?;
            if len > MAX_FRAME_LEN {
                debug!("CMD | dropped frame from session {}: {}", session, DropReason::TooLarge);
                return Ok(());
            }
            ws.recv(&mut buf[..len])?;

            let (kind, fin) = match frame_type {
                FrameType::Text(fragmented) => (FrameKind::Text, !fragmented),
                FrameType::Binary(fragmented) => (FrameKind::Binary, !fragmented),
                FrameType::Continue(is_final) => (FrameKind::Continuation, is_final),
                FrameType::Ping => (FrameKind::Ping, true),
                FrameType::Pong => (FrameKind::Pong, true),
                FrameType::Close | FrameType::SocketClose => {
                    push_transport_event(TransportEvent::Disconnected { session });
                    return Ok(());
                }
            };

            match InboundFrame::from_parts(kind, fin, &buf[..len]) {
                Ok(frame) => {
                    push_transport_event(TransportEvent::Frame { session, frame });
                }
                Err(reason) => debug!("CMD | dropped frame from session {}: {}", session, reason),
            }
            Ok(())
        })?;

        info!("HTTP: serving {} and {} on port {}", PAGE_URI, WS_URI, port);
        Ok(server)
    }

    /// Printable peer address of socket `fd`, or `fd<n>` if unavailable.
    fn peer_label(fd: i32) -> heapless::String<REMOTE_MAX_LEN> {
        use core::fmt::Write as _;
        use esp_idf_svc::sys::{lwip_getpeername, sockaddr, sockaddr_in6, socklen_t};

        let mut label = heapless::String::new();
        // SAFETY: sockaddr_in6 is plain data; getpeername writes at most
        // `len` bytes into it.
        let mut addr: sockaddr_in6 = unsafe { core::mem::zeroed() };
        let mut len = core::mem::size_of::<sockaddr_in6>() as socklen_t;
        let ret = unsafe {
            lwip_getpeername(fd, (&raw mut addr).cast::<sockaddr>(), &mut len)
        };
        if ret != 0 {
            let _ = write!(label, "fd{}", fd);
            return label;
        }

        // SAFETY: u8_addr is the byte view of the address union.
        let bytes = unsafe { addr.sin6_addr.un.u8_addr };
        let _ = write!(label, "{}.{}.{}.{}", bytes[12], bytes[13], bytes[14], bytes[15]);
        label
    }
}
