// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state machine.
//!
//! [`ConnectionManager`] runs one supervisor task per `start()`. The
//! supervisor opens a transport (connect plus `connection_init`
//! handshake), runs the session loop while the connection lives, and on
//! any failure backs off and tries again. States are published on a
//! `watch` channel; decoded session events go out on an `mpsc` channel
//! that outlives `stop()`/`start()` cycles.
//!
//! Every opened connection gets a new [`ConnectionId`]. Superseded
//! supervisors are fenced by a generation number and connection handles
//! by their id, so a slow-closing old connection cannot overwrite the
//! state of a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use inl_core::id::MessageIdGenerator;
use inl_core::protocol::{ClientMessage, RpcCall, RpcError, ServerBody, ServerMessage};
use inl_core::Update;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::backoff::reconnect_delay;
use super::transport::{Transport, TransportError, TransportFactory, TransportResult};

/// Identity of one opened connection; also the queue's epoch.
pub type ConnectionId = u64;

/// Transport-internal connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not started, or stopped.
    Idle,
    /// Opening, or waiting to retry after `attempt` consecutive failures.
    Connecting { attempt: u32 },
    /// Handshake done; `connection` is live.
    Connected { connection: ConnectionId },
}

/// Configuration for the connection manager.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// URL to connect to.
    pub url: String,
    /// Auth token sent in `connection_init`.
    pub token: String,
    /// Deadline for connect plus handshake.
    pub connect_timeout: Duration,
    /// Ping interval. Zero disables the heartbeat.
    pub heartbeat_interval: Duration,
    /// How long to wait for any frame after a ping.
    pub heartbeat_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/realtime".to_string(),
            token: String::new(),
            connect_timeout: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(10),
        }
    }
}

/// A decoded server frame relevant to the transaction layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The server received request `msg_id`.
    Ack { msg_id: u64 },
    /// Request `req_msg_id` succeeded.
    RpcResult {
        req_msg_id: u64,
        result: serde_json::Value,
    },
    /// Request failed on the server.
    RpcError(RpcError),
    /// Pushed change batch.
    Updates(Vec<Update>),
}

/// A session event tagged with the connection it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFrame {
    pub connection: ConnectionId,
    pub event: SessionEvent,
}

struct Outbound {
    call: RpcCall,
    reply: oneshot::Sender<TransportResult<u64>>,
}

struct LiveConnection {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Outbound>,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    cancel: Option<CancellationToken>,
    live: Option<LiveConnection>,
}

struct Shared {
    config: ConnectionConfig,
    factory: Arc<dyn TransportFactory>,
    state_tx: watch::Sender<ConnectionStatus>,
    events_tx: mpsc::UnboundedSender<SessionFrame>,
    next_connection: AtomicU64,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publishes `status` if `generation` is still current.
    fn publish(&self, generation: u64, status: ConnectionStatus) -> bool {
        let inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        set_status(&self.state_tx, status);
        true
    }

    /// Installs a live connection if `generation` is still current.
    fn go_live(&self, generation: u64, live: LiveConnection) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        let connection = live.id;
        inner.live = Some(live);
        set_status(&self.state_tx, ConnectionStatus::Connected { connection });
        true
    }

    /// Clears the live connection only if it is still `connection`.
    fn clear_live(&self, connection: ConnectionId) {
        let mut inner = self.lock();
        if inner.live.as_ref().map(|l| l.id) == Some(connection) {
            inner.live = None;
        }
    }
}

fn set_status(tx: &watch::Sender<ConnectionStatus>, status: ConnectionStatus) {
    tx.send_if_modified(|current| {
        if *current == status {
            false
        } else {
            *current = status;
            true
        }
    });
}

/// Manages the connection lifecycle and reconnection.
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    ///
    /// Returns the manager and the receiver for session events.
    pub fn new(
        config: ConnectionConfig,
        factory: Arc<dyn TransportFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionFrame>) {
        let (state_tx, _) = watch::channel(ConnectionStatus::Idle);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            config,
            factory,
            state_tx,
            events_tx,
            next_connection: AtomicU64::new(0),
            inner: Mutex::new(Inner::default()),
        });
        (ConnectionManager { shared }, events_rx)
    }

    /// Starts connecting. No-op unless idle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut inner = self.shared.lock();
        if inner.cancel.is_some() {
            return;
        }
        inner.generation += 1;
        let generation = inner.generation;
        let cancel = CancellationToken::new();
        inner.cancel = Some(cancel.clone());
        set_status(
            &self.shared.state_tx,
            ConnectionStatus::Connecting { attempt: 0 },
        );
        drop(inner);

        tracing::info!(url = %self.shared.config.url, "starting connection");
        let shared = Arc::clone(&self.shared);
        tokio::spawn(supervise(shared, generation, cancel));
    }

    /// Tears down the live connection and returns to idle.
    ///
    /// The session event channel stays open.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        let Some(cancel) = inner.cancel.take() else {
            return;
        };
        cancel.cancel();
        inner.generation += 1;
        inner.live = None;
        set_status(&self.shared.state_tx, ConnectionStatus::Idle);
        tracing::info!("connection stopped");
    }

    /// Current state.
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.state_tx.borrow()
    }

    /// Subscribes to de-duplicated state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.state_tx.subscribe()
    }

    /// Id of the live connection, if any.
    pub fn live_connection(&self) -> Option<ConnectionId> {
        self.shared.lock().live.as_ref().map(|l| l.id)
    }

    /// Writes an RPC call on connection `epoch` and returns its message id.
    ///
    /// Fails with `NotConnected` if `epoch` is not the live connection.
    /// Never queues.
    pub async fn send_rpc(&self, epoch: ConnectionId, call: RpcCall) -> TransportResult<u64> {
        let outbound = {
            let inner = self.shared.lock();
            match &inner.live {
                Some(live) if live.id == epoch => live.outbound.clone(),
                _ => return Err(TransportError::NotConnected),
            }
        };
        let (reply, rx) = oneshot::channel();
        outbound
            .send(Outbound { call, reply })
            .map_err(|_| TransportError::NotConnected)?;
        rx.await.map_err(|_| TransportError::NotConnected)?
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(cancel) = self.shared.lock().cancel.take() {
            cancel.cancel();
        }
    }
}

/// Supervisor: open, run the session, back off, repeat.
async fn supervise(shared: Arc<Shared>, generation: u64, cancel: CancellationToken) {
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() || !shared.publish(generation, ConnectionStatus::Connecting { attempt }) {
            return;
        }

        let mut transport = shared.factory.create();
        let mut ids = MessageIdGenerator::new();
        let mut seq = 0u32;

        let opened = tokio::select! {
            _ = cancel.cancelled() => return,
            r = tokio::time::timeout(
                shared.config.connect_timeout,
                open(transport.as_mut(), &shared.config, &mut ids, &mut seq),
            ) => r.unwrap_or_else(|_| Err(TransportError::Timeout("connection did not open".into()))),
        };

        let failure = match opened {
            Ok(()) => {
                attempt = 0;
                let connection = shared.next_connection.fetch_add(1, Ordering::Relaxed) + 1;
                let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                let live = LiveConnection {
                    id: connection,
                    outbound: outbound_tx,
                };
                if !shared.go_live(generation, live) {
                    let _ = transport.disconnect().await;
                    return;
                }
                tracing::info!(connection, "connected");

                let ended = run_session(
                    &shared,
                    connection,
                    transport.as_mut(),
                    outbound_rx,
                    ids,
                    seq,
                    &cancel,
                )
                .await;
                shared.clear_live(connection);
                let _ = transport.disconnect().await;
                match ended {
                    Ok(()) => return,
                    Err(e) => {
                        tracing::warn!(connection, error = %e, "connection lost");
                        e
                    }
                }
            }
            Err(e) => {
                let _ = transport.disconnect().await;
                tracing::debug!(attempt, error = %e, "connection attempt failed");
                e
            }
        };

        let delay = reconnect_delay(attempt);
        attempt = attempt.saturating_add(1);
        if !shared.publish(generation, ConnectionStatus::Connecting { attempt }) {
            return;
        }
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, reason = %failure, "reconnecting");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Connects and completes the `connection_init` handshake.
async fn open(
    transport: &mut dyn Transport,
    config: &ConnectionConfig,
    ids: &mut MessageIdGenerator,
    seq: &mut u32,
) -> TransportResult<()> {
    transport.connect(&config.url).await?;
    *seq += 1;
    transport
        .send(ClientMessage::connection_init(
            ids.next_id(),
            *seq,
            config.token.clone(),
        ))
        .await?;

    loop {
        match transport.recv().await? {
            Some(ServerMessage {
                body: ServerBody::ConnectionOpen,
                ..
            }) => return Ok(()),
            Some(ServerMessage {
                body: ServerBody::ConnectionError { reason },
                ..
            }) => return Err(TransportError::Handshake(reason)),
            Some(other) => {
                tracing::debug!(?other, "ignoring frame before connection_open");
            }
            None => return Err(TransportError::ConnectionClosed),
        }
    }
}

/// Runs one open connection until it fails (`Err`) or is cancelled (`Ok`).
async fn run_session(
    shared: &Shared,
    connection: ConnectionId,
    transport: &mut dyn Transport,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    mut ids: MessageIdGenerator,
    mut seq: u32,
    cancel: &CancellationToken,
) -> TransportResult<()> {
    let heartbeat_interval = shared.config.heartbeat_interval;
    let heartbeat_enabled = !heartbeat_interval.is_zero();
    let period = if heartbeat_enabled {
        heartbeat_interval
    } else {
        Duration::from_secs(3600)
    };
    // Ticks regardless of outbound traffic; only a reply clears a ping.
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ping_sent: Option<Instant> = None;

    loop {
        let pong_deadline = ping_sent
            .map(|sent| sent + shared.config.heartbeat_timeout)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),

            Some(out) = outbound.recv() => {
                let msg_id = ids.next_id();
                seq = seq.wrapping_add(1);
                let method = out.call.method;
                match transport.send(ClientMessage::rpc_call(msg_id, seq, out.call)).await {
                    Ok(()) => {
                        tracing::debug!(connection, msg_id, %method, "rpc sent");
                        let _ = out.reply.send(Ok(msg_id));
                    }
                    Err(e) => {
                        let _ = out.reply.send(Err(e.clone()));
                        return Err(e);
                    }
                }
            }

            frame = transport.recv() => {
                match frame? {
                    Some(msg) => {
                        // Any frame proves the connection is alive.
                        ping_sent = None;
                        dispatch_frame(shared, connection, msg);
                    }
                    None => return Err(TransportError::ConnectionClosed),
                }
            }

            _ = heartbeat.tick(), if heartbeat_enabled && ping_sent.is_none() => {
                let nonce = ids.next_id();
                seq = seq.wrapping_add(1);
                transport.send(ClientMessage::ping(nonce, seq, nonce)).await?;
                ping_sent = Some(Instant::now());
            }

            _ = tokio::time::sleep_until(pong_deadline), if ping_sent.is_some() => {
                return Err(TransportError::Timeout("no response to ping".into()));
            }
        }
    }
}

fn dispatch_frame(shared: &Shared, connection: ConnectionId, msg: ServerMessage) {
    let event = match msg.body {
        ServerBody::Ack { msg_id } => SessionEvent::Ack { msg_id },
        ServerBody::RpcResult { req_msg_id, result } => {
            SessionEvent::RpcResult { req_msg_id, result }
        }
        ServerBody::RpcError(err) => SessionEvent::RpcError(err),
        ServerBody::Updates { updates } => SessionEvent::Updates(updates),
        ServerBody::Pong { .. } => return,
        ServerBody::ConnectionOpen | ServerBody::ConnectionError { .. } => {
            tracing::debug!(connection, "ignoring handshake frame on open connection");
            return;
        }
    };
    let _ = shared.events_tx.send(SessionFrame { connection, event });
}
