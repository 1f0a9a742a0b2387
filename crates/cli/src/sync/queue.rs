// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction queue.
//!
//! Holds every unfinished transaction and tracks it through
//! `Queued -> InFlight -> Acknowledged -> retired`. All state sits behind
//! one mutex that is never held across an await; disk writes go to the
//! [`Persister`] thread.
//!
//! Request message ids are scoped to one connection (the epoch). Each
//! `requeue_all(epoch)` starts a new epoch and forgets every correlation,
//! pending ack and parked outcome of the previous one.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

use super::connection::ConnectionId;
use super::persist::Persister;
use super::transaction::{Transaction, TransactionError, TransactionId, TransactionKind, TransactionRecord};

/// Cap on each set of uncorrelated msg ids kept per epoch. Msg ids grow
/// over a connection, so the lowest ids are evicted first.
const MAX_TRACKED_MSG_IDS: usize = 1024;

/// What a resolved request produced.
pub type Outcome = Result<serde_json::Value, TransactionError>;

/// Lifecycle position of a live transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Queued,
    InFlight,
    Acknowledged,
}

/// Number of transactions in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub queued: usize,
    pub in_flight: usize,
    pub acknowledged: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.queued + self.in_flight + self.acknowledged
    }
}

struct Entry {
    /// Submission order; restored entries sort below live submissions.
    seq: i64,
    kind: TransactionKind,
    record: TransactionRecord,
}

#[derive(Default)]
struct QueueState {
    next_seq: i64,
    restored_floor: i64,
    queued: BTreeMap<i64, Entry>,
    in_flight: HashMap<TransactionId, Entry>,
    acknowledged: HashMap<TransactionId, Entry>,
    /// msg id -> transaction, for the current epoch.
    by_msg_id: HashMap<u64, TransactionId>,
    /// Reverse of `by_msg_id`.
    dispatched: HashMap<TransactionId, u64>,
    /// Acks that arrived before `mark_dispatched`.
    pending_acks: BTreeSet<u64>,
    /// Results that arrived before `mark_dispatched`.
    early_outcomes: BTreeMap<u64, Outcome>,
    /// Recently completed msg ids in this epoch.
    settled: BTreeSet<u64>,
    epoch: Option<ConnectionId>,
}

impl QueueState {
    /// Moves `id` from in-flight to acknowledged.
    fn acknowledge(&mut self, id: TransactionId, persister: &Persister) {
        if let Some(entry) = self.in_flight.remove(&id) {
            if entry.kind.is_durable() {
                persister.delete(id);
            }
            tracing::debug!(%id, "transaction acknowledged");
            self.acknowledged.insert(id, entry);
        }
    }

    /// Removes the transaction behind `msg_id` from in-flight/acknowledged.
    fn retire(&mut self, msg_id: u64, persister: &Persister) -> Option<TransactionRecord> {
        let id = self.by_msg_id.remove(&msg_id)?;
        self.dispatched.remove(&id);
        self.pending_acks.remove(&msg_id);
        self.settled.insert(msg_id);
        trim_oldest(&mut self.settled);
        if let Some(entry) = self.in_flight.remove(&id) {
            if entry.kind.is_durable() {
                persister.delete(id);
            }
            return Some(entry.record);
        }
        self.acknowledged.remove(&id).map(|entry| entry.record)
    }
}

fn trim_oldest(ids: &mut BTreeSet<u64>) {
    while ids.len() > MAX_TRACKED_MSG_IDS {
        ids.pop_first();
    }
}

/// The operation queue shared by the engine's loops.
pub struct TransactionQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    persister: Persister,
}

impl TransactionQueue {
    pub fn new(persister: Persister) -> Self {
        TransactionQueue {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            persister,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolves when work may be available.
    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    /// Enqueues a record, persisting it first if durable.
    pub fn submit(&self, record: TransactionRecord) -> TransactionId {
        let id = record.id;
        let kind = record.operation.kind();
        if kind.is_durable() {
            self.persister.save(&record);
        }
        {
            let mut state = self.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.queued.insert(seq, Entry { seq, kind, record });
        }
        tracing::debug!(%id, "transaction queued");
        self.notify.notify_one();
        id
    }

    /// Pops the oldest queued record and marks it in flight.
    pub fn dequeue_next(&self) -> Option<TransactionRecord> {
        let mut state = self.lock();
        let (_, entry) = state.queued.pop_first()?;
        let record = entry.record.clone();
        state.in_flight.insert(record.id, entry);
        Some(record)
    }

    /// Records that `id` was written as `msg_id` on connection `epoch`.
    ///
    /// Settles an ack or result that arrived first. Returns the record
    /// and its outcome when a parked result retires it right away.
    pub fn mark_dispatched(
        &self,
        id: TransactionId,
        epoch: ConnectionId,
        msg_id: u64,
    ) -> Option<(TransactionRecord, Outcome)> {
        let mut state = self.lock();
        if state.epoch != Some(epoch) {
            tracing::debug!(%id, epoch, "ignoring dispatch from a superseded connection");
            return None;
        }
        if !state.in_flight.contains_key(&id) || state.dispatched.contains_key(&id) {
            return None;
        }
        state.by_msg_id.insert(msg_id, id);
        state.dispatched.insert(id, msg_id);

        if let Some(outcome) = state.early_outcomes.remove(&msg_id) {
            let record = state.retire(msg_id, &self.persister)?;
            return Some((record, outcome));
        }
        if state.pending_acks.remove(&msg_id) {
            state.acknowledge(id, &self.persister);
        }
        None
    }

    /// Handles a transport acknowledgement for `msg_id`.
    pub fn ack(&self, msg_id: u64) {
        let mut state = self.lock();
        match state.by_msg_id.get(&msg_id).copied() {
            Some(id) => state.acknowledge(id, &self.persister),
            None if state.settled.contains(&msg_id) => {}
            None => {
                state.pending_acks.insert(msg_id);
                trim_oldest(&mut state.pending_acks);
            }
        }
    }

    /// Retires the transaction behind `msg_id` and returns it.
    ///
    /// Returns `None` for unknown or already-completed ids.
    pub fn complete(&self, msg_id: u64) -> Option<TransactionRecord> {
        self.lock().retire(msg_id, &self.persister)
    }

    /// Parks the outcome of a request whose dispatch is not recorded yet.
    pub fn defer_outcome(&self, msg_id: u64, outcome: Outcome) {
        let mut state = self.lock();
        if state.settled.contains(&msg_id) || state.by_msg_id.contains_key(&msg_id) {
            return;
        }
        state.early_outcomes.insert(msg_id, outcome);
        while state.early_outcomes.len() > MAX_TRACKED_MSG_IDS {
            if let Some((dropped, _)) = state.early_outcomes.pop_first() {
                tracing::debug!(msg_id = dropped, "dropping unmatched early outcome");
            }
        }
    }

    /// Moves one in-flight transaction back to the queue.
    pub fn requeue(&self, id: TransactionId) {
        {
            let mut state = self.lock();
            let Some(entry) = state.in_flight.remove(&id) else {
                return;
            };
            if let Some(msg_id) = state.dispatched.remove(&id) {
                state.by_msg_id.remove(&msg_id);
            }
            state.queued.insert(entry.seq, entry);
        }
        tracing::debug!(%id, "transaction requeued");
        self.notify.notify_one();
    }

    /// Starts epoch `epoch` after a (re)connect.
    ///
    /// In-flight transactions go back to the queue. Acknowledged ones go
    /// back only if their kind allows a retry after ack; the rest are
    /// returned so the caller can fail them as ambiguous.
    pub fn requeue_all(&self, epoch: ConnectionId) -> Vec<TransactionRecord> {
        let mut dropped = Vec::new();
        let requeued = {
            let mut state = self.lock();
            state.epoch = Some(epoch);

            let in_flight: Vec<_> = state.in_flight.drain().map(|(_, e)| e).collect();
            let acknowledged: Vec<_> = state.acknowledged.drain().map(|(_, e)| e).collect();
            let mut requeued = in_flight.len();
            for entry in in_flight {
                state.queued.insert(entry.seq, entry);
            }
            for entry in acknowledged {
                if entry.kind.retry_after_ack() {
                    requeued += 1;
                    state.queued.insert(entry.seq, entry);
                } else {
                    dropped.push(entry.record);
                }
            }

            state.by_msg_id.clear();
            state.dispatched.clear();
            state.pending_acks.clear();
            state.early_outcomes.clear();
            state.settled.clear();
            requeued
        };

        tracing::info!(epoch, requeued, dropped = dropped.len(), "queue reset for new connection");
        self.notify.notify_one();
        dropped
    }

    /// Removes queued transactions matching `predicate` and returns them.
    ///
    /// In-flight and acknowledged transactions are never cancelled.
    pub fn cancel<F>(&self, predicate: F) -> Vec<TransactionRecord>
    where
        F: Fn(&TransactionRecord) -> bool,
    {
        let mut state = self.lock();
        let seqs: Vec<i64> = state
            .queued
            .values()
            .filter(|e| predicate(&e.record))
            .map(|e| e.seq)
            .collect();
        let mut cancelled = Vec::with_capacity(seqs.len());
        for seq in seqs {
            if let Some(entry) = state.queued.remove(&seq) {
                if entry.kind.is_durable() {
                    self.persister.delete(entry.record.id);
                }
                cancelled.push(entry.record);
            }
        }
        cancelled
    }

    /// Seeds the queue with records loaded at startup.
    ///
    /// Records older than `expiry` are deleted and returned; the rest are
    /// queued in creation order ahead of every live submission.
    pub fn restore(
        &self,
        records: Vec<TransactionRecord>,
        now: DateTime<Utc>,
        expiry: chrono::Duration,
    ) -> Vec<TransactionRecord> {
        let (mut fresh, expired): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| now.signed_duration_since(r.created_at) < expiry);
        fresh.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        for record in &expired {
            self.persister.delete(record.id);
        }

        let restored = fresh.len();
        {
            let mut state = self.lock();
            let base = state.restored_floor - fresh.len() as i64;
            state.restored_floor = base;
            for (offset, record) in fresh.into_iter().enumerate() {
                let kind = record.operation.kind();
                if !kind.is_durable() {
                    continue;
                }
                let seq = base + offset as i64;
                state.queued.insert(seq, Entry { seq, kind, record });
            }
        }

        if restored > 0 {
            tracing::info!(restored, expired = expired.len(), "restored persisted transactions");
            self.notify.notify_one();
        }
        expired
    }

    /// Epoch set by the last `requeue_all`.
    pub fn epoch(&self) -> Option<ConnectionId> {
        self.lock().epoch
    }

    pub fn counts(&self) -> QueueCounts {
        let state = self.lock();
        QueueCounts {
            queued: state.queued.len(),
            in_flight: state.in_flight.len(),
            acknowledged: state.acknowledged.len(),
        }
    }

    pub fn state_of(&self, id: TransactionId) -> Option<TransactionState> {
        let state = self.lock();
        if state.in_flight.contains_key(&id) {
            Some(TransactionState::InFlight)
        } else if state.acknowledged.contains_key(&id) {
            Some(TransactionState::Acknowledged)
        } else if state.queued.values().any(|e| e.record.id == id) {
            Some(TransactionState::Queued)
        } else {
            None
        }
    }

    /// Msg ids held for acks, results and completions not tied to a live transaction.
    #[cfg(test)]
    pub(crate) fn tracked_msg_ids(&self) -> usize {
        let state = self.lock();
        state.pending_acks.len() + state.early_outcomes.len() + state.settled.len()
    }

    /// Waits until every persistence command issued so far was applied.
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    pub fn flush_blocking(&self) {
        self.persister.flush_blocking();
    }
}
