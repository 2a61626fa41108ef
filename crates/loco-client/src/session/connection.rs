use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use bson::Document;
use dashmap::DashMap;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};

use loco_core::error::{LocoError, Result};
use loco_core::model::ChatRoom;
use loco_core::protocol::packet::{Packet, PacketIds};

use crate::config::SessionSection;
use crate::dispatch::{PushDispatcher, PushHandler};
use crate::obs::ClientMetrics;
use crate::transport::{read_packet, write_frame, BoxStream, Connector, Framing, TransportMode};

/// Upper bound on waiting for the writer during teardown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Connection lifecycle.
///
/// `Open` is assumed, not confirmed: in legacy mode the server never acknowledges the
/// handshake, so the session is considered open once the handshake blob is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl SessionState {
    fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closing | SessionState::Closed)
    }
}

/// Per-session knobs plus the shared dispatcher/metrics the session reports into.
#[derive(Clone)]
pub struct SessionOptions {
    pub request_timeout: Duration,
    pub max_frame_bytes: usize,
    pub pushes: Arc<PushDispatcher>,
    pub metrics: Arc<ClientMetrics>,
}

impl SessionOptions {
    pub fn from_config(cfg: &SessionSection) -> Self {
        let metrics = Arc::new(ClientMetrics::default());
        Self {
            request_timeout: cfg.request_timeout(),
            max_frame_bytes: cfg.max_frame_bytes,
            pushes: Arc::new(PushDispatcher::new(Arc::clone(&metrics))),
            metrics,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&SessionSection::default())
    }
}

/// One live LOCO connection. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    framing: Framing,
    /// Whole frames only: a frame is written and flushed while holding the lock.
    writer: tokio::sync::Mutex<WriteHalf<BoxStream>>,
    pending: DashMap<u32, oneshot::Sender<Packet>>,
    ids: PacketIds,
    pushes: Arc<PushDispatcher>,
    metrics: Arc<ClientMetrics>,
    state: watch::Sender<SessionState>,
    reader: Mutex<Option<JoinHandle<()>>>,
    request_timeout: Duration,
    max_frame_bytes: usize,
    user_id: AtomicI64,
    rooms: DashMap<i64, ChatRoom>,
}

impl SessionInner {
    fn mark_closed(&self) {
        let prev = self.state.send_replace(SessionState::Closed);
        if prev != SessionState::Closed {
            self.metrics
                .sessions_closed
                .inc(&[("mode", self.framing.mode().as_str())]);
            tracing::info!(mode = %self.framing.mode(), "session closed");
        }
    }

    fn abort_reader(&self) {
        if let Some(task) = self.reader.lock().ok().and_then(|mut slot| slot.take()) {
            task.abort();
        }
    }
}

/// The receive task only holds a `Weak`, so dropping the last `Session` lands here.
impl Drop for SessionInner {
    fn drop(&mut self) {
        self.abort_reader();
    }
}

/// Removes the pending slot when the waiting caller finishes, times out or is dropped.
struct SlotGuard<'a> {
    inner: &'a SessionInner,
    id: u32,
    method: &'a str,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending.remove(&self.id);
        self.inner
            .metrics
            .requests_in_flight
            .dec(&[("method", self.method)]);
    }
}

impl Session {
    /// Open the byte stream for `mode` and start the session on it.
    pub async fn connect(
        connector: &dyn Connector,
        host: &str,
        port: u16,
        mode: TransportMode,
        opts: SessionOptions,
    ) -> Result<Session> {
        tracing::info!(host, port, %mode, state = ?SessionState::Connecting, "session connecting");
        let stream = connector.connect(host, port, mode).await?;
        Self::open(stream, Framing::for_mode(mode), opts).await
    }

    /// Start a session on an already connected stream. Flushes the handshake in legacy mode.
    pub async fn open(mut stream: BoxStream, framing: Framing, opts: SessionOptions) -> Result<Session> {
        if let Some(handshake) = framing.handshake()? {
            write_frame(&mut stream, &handshake).await?;
        }

        let (reader, writer) = tokio::io::split(stream);
        let (state, _) = watch::channel(SessionState::Open);

        let inner = Arc::new(SessionInner {
            framing,
            writer: tokio::sync::Mutex::new(writer),
            pending: DashMap::new(),
            ids: PacketIds::new(),
            pushes: opts.pushes,
            metrics: opts.metrics,
            state,
            reader: Mutex::new(None),
            request_timeout: opts.request_timeout,
            max_frame_bytes: opts.max_frame_bytes,
            user_id: AtomicI64::new(0),
            rooms: DashMap::new(),
        });

        let task = tokio::spawn(receive_loop(
            Arc::downgrade(&inner),
            inner.framing.clone(),
            inner.max_frame_bytes,
            reader,
        ));
        if let Ok(mut slot) = inner.reader.lock() {
            *slot = Some(task);
        }

        tracing::info!(mode = %inner.framing.mode(), "session open");
        Ok(Session { inner })
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn mode(&self) -> TransportMode {
        self.inner.framing.mode()
    }

    pub fn metrics(&self) -> Arc<ClientMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    /// Register a handler for unsolicited packets of `method`.
    pub fn on_push(&self, method: impl Into<String>, handler: Arc<dyn PushHandler>) {
        self.inner.pushes.register(method, handler);
    }

    /// User id recorded by the last successful login (0 before that).
    pub fn user_id(&self) -> i64 {
        self.inner.user_id.load(Ordering::Relaxed)
    }

    /// Current room inventory, ordered by chat id.
    pub fn rooms(&self) -> Vec<ChatRoom> {
        let mut rooms: Vec<ChatRoom> = self.inner.rooms.iter().map(|r| r.value().clone()).collect();
        rooms.sort_by_key(|r| r.chat_id);
        rooms
    }

    pub(crate) fn record_user(&self, user_id: i64) {
        self.inner.user_id.store(user_id, Ordering::Relaxed);
    }

    pub(crate) fn record_rooms(&self, rooms: &[ChatRoom]) {
        for room in rooms {
            self.inner.rooms.insert(room.chat_id, room.clone());
        }
    }

    /// Send one request and wait for the reply carrying the same packet id.
    pub async fn send(&self, method: &str, body: Option<Document>) -> Result<Packet> {
        let inner = &*self.inner;
        let mut state = inner.state.subscribe();
        if state.borrow().is_terminal() {
            return Err(LocoError::Closed);
        }

        let id = inner.ids.next_id();
        let frame = inner.framing.seal(&Packet::request(id, method, body))?;

        // Register before flushing so a fast reply always finds its slot.
        let (tx, rx) = oneshot::channel();
        inner.pending.insert(id, tx);
        inner.metrics.requests_in_flight.inc(&[("method", method)]);
        let _slot = SlotGuard { inner, id, method };

        // Lock, write and reply wait share one deadline and one close signal.
        let started = Instant::now();
        let writing = AtomicBool::new(false);
        let exchange = async {
            {
                let mut writer = inner.writer.lock().await;
                writing.store(true, Ordering::Relaxed);
                write_frame(&mut *writer, &frame).await?;
                writing.store(false, Ordering::Relaxed);
            }
            inner.metrics.requests.inc(&[("method", method)]);
            tracing::debug!(id, method, "request sent");
            rx.await.map_err(|_| LocoError::Closed)
        };

        let result = tokio::select! {
            reply = timeout_at(started + inner.request_timeout, exchange) => match reply {
                Ok(Ok(packet)) => {
                    inner.metrics.request_duration.observe(&[("method", method)], started.elapsed());
                    Ok(packet)
                }
                Ok(Err(e)) => Err(e),
                Err(_) => {
                    inner.metrics.request_timeouts.inc(&[("method", method)]);
                    tracing::warn!(id, method, after = ?inner.request_timeout, "request timed out");
                    Err(LocoError::Timeout {
                        method: method.to_string(),
                        id,
                        after: inner.request_timeout,
                    })
                }
            },
            _ = state.wait_for(|s| s.is_terminal()) => Err(LocoError::Closed),
        };

        // A frame cut off mid-write leaves the stream unframeable for everyone else.
        if writing.load(Ordering::Relaxed) {
            tracing::warn!(id, method, "write abandoned mid-frame; closing session");
            self.disconnect().await;
        }
        result
    }

    /// Stop the receive task and close the transport. Idempotent.
    ///
    /// Pending requests are not resolved; their callers observe `Closed`.
    pub async fn disconnect(&self) {
        let inner = &*self.inner;
        let began = inner.state.send_if_modified(|s| {
            if s.is_terminal() {
                false
            } else {
                *s = SessionState::Closing;
                true
            }
        });
        if !began {
            return;
        }

        inner.abort_reader();

        // A send stuck on a full transport releases the writer once it sees `Closing`;
        // if it does not within the grace period, skip the shutdown.
        let shutdown = async {
            let mut writer = inner.writer.lock().await;
            let _ = writer.shutdown().await;
        };
        if timeout(SHUTDOWN_GRACE, shutdown).await.is_err() {
            tracing::debug!("writer busy at teardown; transport shutdown skipped");
        }
        inner.mark_closed();
    }
}

async fn receive_loop(
    session: Weak<SessionInner>,
    framing: Framing,
    max_frame_bytes: usize,
    mut reader: ReadHalf<BoxStream>,
) {
    loop {
        let read = read_packet(&mut reader, &framing, max_frame_bytes).await;
        let Some(inner) = session.upgrade() else {
            return;
        };

        let packet = match read {
            Ok(p) => p,
            Err(e) => {
                if inner.state.borrow().is_terminal() {
                    tracing::debug!(error = %e, "receive loop stopped");
                } else {
                    tracing::warn!(error = %e, "receive loop failed; closing session");
                }
                inner.mark_closed();
                return;
            }
        };

        tracing::debug!(id = packet.id, method = %packet.method, status = packet.status, "frame received");

        match inner.pending.remove(&packet.id) {
            Some((_, slot)) => {
                let _ = slot.send(packet);
            }
            None => inner.pushes.dispatch(&packet).await,
        }
    }
}
