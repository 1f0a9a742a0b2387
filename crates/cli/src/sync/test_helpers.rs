// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.
//!
//! [`MockServer`] scripts the remote side: every connect through a
//! [`MockFactory`] opens a new in-memory link, handshakes and pings are
//! answered automatically, and tests push frames or drop the link.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use inl_core::protocol::{ClientBody, ClientMessage, RpcCall, ServerMessage};
use inl_core::{Database, LocalStore};
use tokio::sync::mpsc;

use super::transaction::{TransactionId, TransactionRecord};
use super::transport::{Transport, TransportError, TransportFactory, TransportFuture};
use crate::ops::{Operation, SendMessage};

#[derive(Default)]
struct ServerState {
    fail_connects: u32,
    fail_sends: u32,
    reject_handshake: bool,
    silent: bool,
    mute_pongs: bool,
    links: Vec<Option<mpsc::UnboundedSender<ServerMessage>>>,
    sent: Vec<(usize, ClientMessage)>,
}

/// Scriptable remote side shared by all transports of one factory.
#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<ServerState>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> Arc<MockFactory> {
        Arc::new(MockFactory(self.clone()))
    }

    /// Makes the next `n` connects fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.state.lock().unwrap().fail_connects = n;
    }

    /// Makes the next `n` RPC sends fail.
    pub fn fail_next_sends(&self, n: u32) {
        self.state.lock().unwrap().fail_sends = n;
    }

    pub fn reject_handshakes(&self, reject: bool) {
        self.state.lock().unwrap().reject_handshake = reject;
    }

    /// Stops answering handshakes, so opening never completes.
    pub fn go_silent(&self, silent: bool) {
        self.state.lock().unwrap().silent = silent;
    }

    pub fn mute_pongs(&self, mute: bool) {
        self.state.lock().unwrap().mute_pongs = mute;
    }

    /// Number of links opened so far.
    pub fn connection_count(&self) -> usize {
        self.state.lock().unwrap().links.len()
    }

    /// Pushes a frame on the newest link.
    pub fn push(&self, msg: ServerMessage) {
        let state = self.state.lock().unwrap();
        if let Some(Some(tx)) = state.links.last() {
            let _ = tx.send(msg);
        }
    }

    /// Closes the newest link from the server side.
    pub fn drop_connection(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(link) = state.links.last_mut() {
            link.take();
        }
    }

    /// Every frame the client sent, with the index of its link.
    pub fn sent(&self) -> Vec<(usize, ClientMessage)> {
        self.state.lock().unwrap().sent.clone()
    }

    /// RPC calls as `(link, msg_id, call)`.
    pub fn rpc_calls(&self) -> Vec<(usize, u64, RpcCall)> {
        self.sent()
            .into_iter()
            .filter_map(|(link, msg)| match msg.body {
                ClientBody::RpcCall(call) => Some((link, msg.id, call)),
                _ => None,
            })
            .collect()
    }

    pub fn pings(&self) -> usize {
        self.sent()
            .iter()
            .filter(|(_, msg)| matches!(msg.body, ClientBody::Ping { .. }))
            .count()
    }

    /// Waits until at least `n` RPC calls were sent.
    pub async fn wait_for_rpc_calls(&self, n: usize) -> Vec<(usize, u64, RpcCall)> {
        wait_until(|| self.rpc_calls().len() >= n).await;
        self.rpc_calls()
    }

    /// Waits until at least `n` links were opened.
    pub async fn wait_for_connections(&self, n: usize) {
        wait_until(|| self.connection_count() >= n).await;
    }
}

/// Factory handing out transports bound to a [`MockServer`].
pub struct MockFactory(MockServer);

impl TransportFactory for MockFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(MockTransport::new(self.0.clone()))
    }
}

/// Mock transport for testing without real sockets.
pub struct MockTransport {
    server: MockServer,
    link: Option<(usize, mpsc::UnboundedReceiver<ServerMessage>)>,
}

impl MockTransport {
    pub fn new(server: MockServer) -> Self {
        MockTransport { server, link: None }
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.server.state.lock().unwrap();
            if state.fail_connects > 0 {
                state.fail_connects -= 1;
                return Err(TransportError::ConnectionFailed("mock failure".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            state.links.push(Some(tx));
            self.link = Some((state.links.len() - 1, rx));
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.link = None;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let index = match &self.link {
                Some((index, _)) => *index,
                None => return Err(TransportError::NotConnected),
            };
            let mut state = self.server.state.lock().unwrap();
            let Some(Some(tx)) = state.links.get(index).cloned() else {
                return Err(TransportError::ConnectionClosed);
            };
            match &msg.body {
                ClientBody::RpcCall(_) if state.fail_sends > 0 => {
                    state.fail_sends -= 1;
                    return Err(TransportError::SendFailed("mock failure".into()));
                }
                ClientBody::ConnectionInit { .. } if state.reject_handshake => {
                    let _ = tx.send(ServerMessage::connection_error("invalid token"));
                }
                ClientBody::ConnectionInit { .. } if !state.silent => {
                    let _ = tx.send(ServerMessage::connection_open());
                }
                ClientBody::Ping { nonce } if !state.mute_pongs => {
                    let _ = tx.send(ServerMessage::pong(*nonce));
                }
                _ => {}
            }
            state.sent.push((index, msg));
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            let Some((_, rx)) = self.link.as_mut() else {
                return Err(TransportError::NotConnected);
            };
            match rx.recv().await {
                Some(msg) => Ok(Some(msg)),
                None => {
                    self.link = None;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }
}

/// Polls `cond` until it holds, failing the test after five seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    if waited.is_err() {
        panic!("condition not reached within 5s");
    }
}

/// Awaits `fut`, failing the test after five seconds.
pub async fn within<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(Duration::from_secs(5), fut).await {
        Ok(out) => out,
        Err(_) => panic!("future did not complete within 5s"),
    }
}

pub fn memory_store() -> Arc<Database> {
    Arc::new(Database::open_in_memory().unwrap())
}

/// A send-message operation with a fixed random id.
pub fn send_op(chat_id: i64, text: &str, random_id: i64) -> Operation {
    Operation::SendMessage(SendMessage::with_random_id(chat_id, text, random_id))
}

pub fn record_at(operation: Operation, created_at: DateTime<Utc>) -> TransactionRecord {
    TransactionRecord {
        id: TransactionId::new(),
        created_at,
        operation,
    }
}

pub fn record(operation: Operation) -> TransactionRecord {
    record_at(operation, Utc::now())
}

/// Reads the optimistic row created for a send with this random id.
pub fn sent_row(store: &dyn LocalStore, chat_id: i64, random_id: i64) -> Option<inl_core::Message> {
    store.find_message_by_random_id(chat_id, random_id).unwrap()
}
