// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for queued transactions.
//!
//! [`JournalStore`] appends `save`/`delete` entries to a JSONL journal.
//! [`Persister`] runs one writer thread so the queue never waits on disk
//! and commands for the same id apply in the order they were issued.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::transaction::{TransactionId, TransactionRecord};

/// Error type for persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("journal error: {0}")]
    Journal(#[from] inl_core::Error),
}

/// Storage backend for durable transactions.
pub trait TransactionStore: Send + 'static {
    fn save(&self, record: &TransactionRecord) -> Result<(), PersistError>;

    /// Deleting an unknown id succeeds.
    fn delete(&self, id: TransactionId) -> Result<(), PersistError>;

    fn load_all(&self) -> Result<Vec<TransactionRecord>, PersistError>;
}

/// Persists nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

impl TransactionStore for NoopStore {
    fn save(&self, _record: &TransactionRecord) -> Result<(), PersistError> {
        Ok(())
    }

    fn delete(&self, _id: TransactionId) -> Result<(), PersistError> {
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<TransactionRecord>, PersistError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalEntry {
    Save { record: TransactionRecord },
    Delete { id: TransactionId },
}

/// JSONL journal of saves and deletes.
#[derive(Debug, Clone)]
pub struct JournalStore {
    path: PathBuf,
}

impl JournalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JournalStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replays the journal without compacting it.
    ///
    /// A deleted id is never resurrected by a later save. Records come
    /// back in creation order.
    pub fn replay(&self) -> Result<Vec<TransactionRecord>, PersistError> {
        let (entries, skipped) = inl_core::jsonl::read_all_lossy::<JournalEntry>(&self.path)?;
        if skipped > 0 {
            tracing::warn!(path = %self.path.display(), skipped, "journal had malformed lines");
        }

        let mut deleted = HashSet::new();
        let mut saved: HashMap<TransactionId, TransactionRecord> = HashMap::new();
        for entry in entries {
            match entry {
                JournalEntry::Save { record } => {
                    saved.insert(record.id, record);
                }
                JournalEntry::Delete { id } => {
                    deleted.insert(id);
                }
            }
        }

        let mut records: Vec<_> = saved
            .into_values()
            .filter(|r| !deleted.contains(&r.id))
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }
}

impl TransactionStore for JournalStore {
    fn save(&self, record: &TransactionRecord) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        inl_core::jsonl::append(
            &self.path,
            &JournalEntry::Save {
                record: record.clone(),
            },
        )?;
        Ok(())
    }

    fn delete(&self, id: TransactionId) -> Result<(), PersistError> {
        if !self.path.exists() {
            return Ok(());
        }
        inl_core::jsonl::append(&self.path, &JournalEntry::Delete { id })?;
        Ok(())
    }

    /// Replays the journal and compacts it to the surviving saves.
    fn load_all(&self) -> Result<Vec<TransactionRecord>, PersistError> {
        let records = self.replay()?;
        if self.path.exists() {
            let entries: Vec<_> = records
                .iter()
                .cloned()
                .map(|record| JournalEntry::Save { record })
                .collect();
            inl_core::jsonl::write_all(&self.path, &entries)?;
        }
        Ok(records)
    }
}

enum Command {
    Save(Box<TransactionRecord>),
    Delete(TransactionId),
    Flush(oneshot::Sender<()>),
}

/// Background writer for a [`TransactionStore`].
pub struct Persister {
    tx: Option<mpsc::Sender<Command>>,
    handle: Option<JoinHandle<()>>,
}

impl Persister {
    /// Spawns the writer thread.
    pub fn spawn(store: Box<dyn TransactionStore>) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("inl-persist".into())
            .spawn(move || run_writer(store, rx));
        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn persistence thread");
                None
            }
        };
        Persister {
            tx: Some(tx),
            handle,
        }
    }

    /// Queues a save. Never blocks.
    pub fn save(&self, record: &TransactionRecord) {
        self.send(Command::Save(Box::new(record.clone())));
    }

    /// Queues a delete. Never blocks.
    pub fn delete(&self, id: TransactionId) {
        self.send(Command::Delete(id));
    }

    /// Resolves once every earlier command was applied.
    pub async fn flush(&self) {
        let (done, rx) = oneshot::channel();
        self.send(Command::Flush(done));
        let _ = rx.await;
    }

    /// Blocking variant of [`flush`](Self::flush) for non-async callers.
    pub fn flush_blocking(&self) {
        let (done, rx) = oneshot::channel();
        self.send(Command::Flush(done));
        let _ = rx.blocking_recv();
    }

    fn send(&self, cmd: Command) {
        let sent = self.tx.as_ref().map(|tx| tx.send(cmd).is_ok());
        if sent != Some(true) {
            tracing::error!("persistence thread is gone; dropping command");
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_writer(store: Box<dyn TransactionStore>, rx: mpsc::Receiver<Command>) {
    while let Ok(cmd) = rx.recv() {
        match cmd {
            Command::Save(record) => {
                if let Err(e) = store.save(&record) {
                    tracing::warn!(id = %record.id, error = %e, "failed to persist transaction");
                }
            }
            Command::Delete(id) => {
                if let Err(e) = store.delete(id) {
                    tracing::warn!(%id, error = %e, "failed to delete persisted transaction");
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}
