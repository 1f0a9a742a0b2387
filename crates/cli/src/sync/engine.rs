// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine: the single coordination point.
//!
//! [`SyncEngine`] owns the connection manager, the transaction queue and
//! the local store handle, and runs three loops:
//!
//! - connection snapshots: starts a new queue epoch on every new
//!   connection and publishes the public [`ConnectionState`];
//! - session events: routes acks, results and errors to the queue and
//!   applies pushed update batches in arrival order, re-broadcasting each
//!   applied batch to [`SyncEngine::subscribe_updates`] listeners;
//! - dispatcher: drains the queue while the live connection matches the
//!   queue's epoch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use inl_core::{LocalStore, Update};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use super::connection::{
    ConnectionConfig, ConnectionManager, ConnectionStatus, SessionEvent, SessionFrame,
};
use super::persist::{PersistError, Persister, TransactionStore};
use super::queue::{Outcome, QueueCounts, TransactionQueue};
use super::transaction::{Transaction, TransactionError, TransactionId, TransactionRecord};
use super::transport::TransportFactory;
use crate::ops::Operation;

/// Connection state exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Stopping,
}

impl From<ConnectionStatus> for ConnectionState {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Idle => ConnectionState::Stopping,
            ConnectionStatus::Connecting { .. } => ConnectionState::Connecting,
            ConnectionStatus::Connected { .. } => ConnectionState::Connected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Stopping => "stopping",
        };
        write!(f, "{}", s)
    }
}

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub connection: ConnectionConfig,
    /// Persisted transactions older than this fail at startup.
    pub transaction_expiry: chrono::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            connection: ConnectionConfig::default(),
            transaction_expiry: chrono::Duration::minutes(10),
        }
    }
}

struct Inner {
    store: Arc<dyn LocalStore>,
    queue: TransactionQueue,
    connection: ConnectionManager,
    waiters: Mutex<HashMap<TransactionId, oneshot::Sender<Outcome>>>,
    state_tx: watch::Sender<ConnectionState>,
    updates_tx: broadcast::Sender<Vec<Update>>,
    cancel: CancellationToken,
}

const UPDATES_CAPACITY: usize = 256;

impl Inner {
    fn waiters(&self) -> MutexGuard<'_, HashMap<TransactionId, oneshot::Sender<Outcome>>> {
        self.waiters.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn resolve(&self, id: TransactionId, outcome: Outcome) {
        if let Some(waiter) = self.waiters().remove(&id) {
            let _ = waiter.send(outcome);
        }
    }

    fn run_failed_hook(&self, record: &TransactionRecord, error: &TransactionError) {
        if let Err(e) = record.operation.on_failed(self.store.as_ref(), error) {
            tracing::error!(id = %record.id, error = %e, "failed to roll back transaction");
        }
    }

    /// Terminal failure: rollback hook, then the waiter.
    fn fail(&self, record: TransactionRecord, error: TransactionError) {
        tracing::warn!(
            id = %record.id,
            method = %record.operation.method(),
            error = %error,
            "transaction failed"
        );
        self.run_failed_hook(&record, &error);
        self.resolve(record.id, Err(error));
    }

    /// Applies a retired transaction's outcome and resumes its submitter.
    fn settle(&self, record: TransactionRecord, outcome: Outcome) {
        match outcome {
            Ok(result) => match record.operation.apply_result(self.store.as_ref(), &result) {
                Ok(()) => {
                    tracing::debug!(id = %record.id, method = %record.operation.method(), "transaction applied");
                    self.resolve(record.id, Ok(result));
                }
                Err(e) => {
                    tracing::error!(id = %record.id, error = %e, "failed to apply result");
                    self.fail(record, TransactionError::ApplyFailed(e.to_string()));
                }
            },
            Err(error) => self.fail(record, error),
        }
    }

    fn publish(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    fn handle_frame(&self, frame: SessionFrame) {
        let SessionFrame { connection, event } = frame;
        match event {
            SessionEvent::Updates(updates) => match self.store.apply_updates(&updates) {
                Ok(applied) => {
                    tracing::debug!(connection, applied, "applied updates");
                    // No listeners is fine.
                    let _ = self.updates_tx.send(updates);
                }
                Err(e) => tracing::error!(connection, error = %e, "failed to apply updates"),
            },
            _ if self.queue.epoch() != Some(connection) => {
                tracing::debug!(connection, "dropping event from a superseded connection");
            }
            SessionEvent::Ack { msg_id } => self.queue.ack(msg_id),
            SessionEvent::RpcResult { req_msg_id, result } => {
                self.complete(req_msg_id, Ok(result));
            }
            SessionEvent::RpcError(err) => {
                let msg_id = err.req_msg_id;
                self.complete(msg_id, Err(err.into()));
            }
        }
    }

    fn complete(&self, msg_id: u64, outcome: Outcome) {
        match self.queue.complete(msg_id) {
            Some(record) => self.settle(record, outcome),
            None => self.queue.defer_outcome(msg_id, outcome),
        }
    }

    /// Dispatches queued work. Returns true if a write failed.
    async fn drain(&self) -> bool {
        loop {
            let Some(epoch) = self.queue.epoch() else {
                return false;
            };
            if self.connection.live_connection() != Some(epoch) {
                return false;
            }
            let Some(record) = self.queue.dequeue_next() else {
                return false;
            };

            let id = record.id;
            match self.connection.send_rpc(epoch, record.operation.request()).await {
                Ok(msg_id) => {
                    tracing::debug!(%id, msg_id, method = %record.operation.method(), "transaction dispatched");
                    if let Some((record, outcome)) = self.queue.mark_dispatched(id, epoch, msg_id) {
                        self.settle(record, outcome);
                    }
                }
                Err(e) => {
                    tracing::warn!(%id, error = %e, "dispatch failed, requeueing");
                    self.queue.requeue(id);
                    return true;
                }
            }
        }
    }
}

/// Offline-first transaction engine.
pub struct SyncEngine {
    inner: Arc<Inner>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<SessionFrame>>>,
}

impl SyncEngine {
    /// Creates the engine and loads persisted transactions.
    ///
    /// Records older than the expiry window are failed with
    /// [`TransactionError::Timeout`] before any loop runs.
    pub fn open(
        config: EngineConfig,
        factory: Arc<dyn TransportFactory>,
        store: Arc<dyn LocalStore>,
        persistence: Box<dyn TransactionStore>,
    ) -> Result<Self, PersistError> {
        let records = persistence.load_all()?;
        let queue = TransactionQueue::new(Persister::spawn(persistence));
        let expired = queue.restore(records, Utc::now(), config.transaction_expiry);

        let (connection, events_rx) = ConnectionManager::new(config.connection, factory);
        let (state_tx, _) = watch::channel(ConnectionState::Stopping);
        let (updates_tx, _) = broadcast::channel(UPDATES_CAPACITY);
        let inner = Arc::new(Inner {
            store,
            queue,
            connection,
            waiters: Mutex::new(HashMap::new()),
            state_tx,
            updates_tx,
            cancel: CancellationToken::new(),
        });

        for record in expired {
            inner.fail(record, TransactionError::Timeout);
        }

        Ok(SyncEngine {
            inner,
            events_rx: Mutex::new(Some(events_rx)),
        })
    }

    /// Spawns the loops (first call only) and starts connecting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let events_rx = self
            .events_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(events_rx) = events_rx {
            let status_rx = self.inner.connection.subscribe();
            tokio::spawn(watch_connection(
                Arc::clone(&self.inner),
                status_rx.clone(),
            ));
            tokio::spawn(route_events(Arc::clone(&self.inner), events_rx));
            tokio::spawn(dispatch(Arc::clone(&self.inner), status_rx));
        }
        self.inner.connection.start();
    }

    /// Stops the connection. Queued work is kept for the next `start`.
    pub fn stop(&self) {
        self.inner.connection.stop();
    }

    /// Stops everything, resolves waiters with `Shutdown`, and flushes
    /// pending persistence writes.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.connection.stop();
        self.inner.publish(ConnectionState::Stopping);
        let waiters: Vec<_> = self.inner.waiters().drain().collect();
        for (_, waiter) in waiters {
            let _ = waiter.send(Err(TransactionError::Shutdown));
        }
        self.inner.queue.flush().await;
        tracing::info!("sync engine shut down");
    }

    /// Submits an operation and waits for its terminal outcome.
    ///
    /// The optimistic change is visible in the store before this first
    /// yields.
    pub async fn submit(&self, operation: impl Into<Operation>) -> Outcome {
        let (record, rx) = self.prepare(operation.into(), true);
        self.inner.queue.submit(record);
        match rx {
            Some(rx) => rx.await.unwrap_or(Err(TransactionError::Shutdown)),
            None => Err(TransactionError::Shutdown),
        }
    }

    /// Submits an operation without waiting; the outcome is only logged.
    pub fn submit_detached(&self, operation: impl Into<Operation>) -> TransactionId {
        let (record, _) = self.prepare(operation.into(), false);
        self.inner.queue.submit(record)
    }

    fn prepare(
        &self,
        mut operation: Operation,
        wait: bool,
    ) -> (TransactionRecord, Option<oneshot::Receiver<Outcome>>) {
        if let Err(e) = operation.apply_optimistic(self.inner.store.as_ref()) {
            tracing::error!(method = %operation.method(), error = %e, "optimistic update failed");
        }
        let record = TransactionRecord::new(operation);
        if !wait || self.inner.cancel.is_cancelled() {
            return (record, None);
        }
        let (tx, rx) = oneshot::channel();
        self.inner.waiters().insert(record.id, tx);
        (record, Some(rx))
    }

    /// Cancels queued operations matching `predicate`.
    ///
    /// Dispatched operations are not affected. Returns how many were
    /// cancelled.
    pub fn cancel<F>(&self, predicate: F) -> usize
    where
        F: Fn(&TransactionRecord) -> bool,
    {
        let cancelled = self.inner.queue.cancel(predicate);
        for record in &cancelled {
            tracing::debug!(id = %record.id, "transaction cancelled");
            if let Err(e) = record.operation.on_cancelled(self.inner.store.as_ref()) {
                tracing::error!(id = %record.id, error = %e, "failed to revert cancelled transaction");
            }
            self.inner.resolve(record.id, Err(TransactionError::Cancelled));
        }
        cancelled.len()
    }

    /// Subscribes to de-duplicated connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribes to pushed update batches after they were applied.
    ///
    /// A slow listener may observe `RecvError::Lagged`.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<Vec<Update>> {
        self.inner.updates_tx.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    pub fn queue_counts(&self) -> QueueCounts {
        self.inner.queue.counts()
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.inner.store
    }

    #[cfg(test)]
    pub(crate) fn queue(&self) -> &TransactionQueue {
        &self.inner.queue
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

/// Starts a queue epoch per new connection, then publishes the state.
async fn watch_connection(inner: Arc<Inner>, mut status_rx: watch::Receiver<ConnectionStatus>) {
    let mut epoch = None;
    loop {
        let status = *status_rx.borrow_and_update();
        if let ConnectionStatus::Connected { connection } = status {
            if epoch != Some(connection) {
                epoch = Some(connection);
                for record in inner.queue.requeue_all(connection) {
                    inner.fail(record, TransactionError::AmbiguousOutcome);
                }
            }
        }
        inner.publish(status.into());

        tokio::select! {
            _ = inner.cancel.cancelled() => return,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// Handles session events in arrival order.
async fn route_events(inner: Arc<Inner>, mut events_rx: mpsc::UnboundedReceiver<SessionFrame>) {
    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => return,
            frame = events_rx.recv() => match frame {
                Some(frame) => inner.handle_frame(frame),
                None => return,
            },
        }
    }
}

/// Drains the queue whenever work or a connection change arrives.
async fn dispatch(inner: Arc<Inner>, mut status_rx: watch::Receiver<ConnectionStatus>) {
    loop {
        let stalled = inner.drain().await;
        if stalled {
            // The connection is going down; retry once the state moves.
            tokio::select! {
                _ = inner.cancel.cancelled() => return,
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
            continue;
        }
        tokio::select! {
            _ = inner.cancel.cancelled() => return,
            _ = inner.queue.notified() => {}
            changed = status_rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}
