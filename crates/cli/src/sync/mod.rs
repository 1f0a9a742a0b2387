// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  SyncEngine │────►│ Connection  │────►│  Transport  │────► server
//! │  (engine)   │◄────│  Manager    │◄────│   (trait)   │◄────
//! └─────────────┘     └─────────────┘     └─────────────┘
//!    │       │
//!    ▼       ▼
//! ┌───────┐ ┌──────────────────┐
//! │ Queue │ │ LocalStore       │
//! │       │ │ (optimistic rows,│
//! └───────┘ │  pushed updates) │
//!    │      └──────────────────┘
//!    ▼
//! ┌─────────────┐
//! │  Persister  │  (JSONL journal of durable transactions)
//! └─────────────┘
//! ```
//!
//! # Features
//!
//! - Optimistic local application before dispatch
//! - At most one dispatch per transaction per connection
//! - Requeue on reconnect, per-operation retry-after-ack policy
//! - Durable mutations survive restarts, with a staleness window
//! - Reconnect with backoff and heartbeat
//! - Injectable transport trait for testing

mod backoff;
mod connection;
mod engine;
mod persist;
mod queue;
mod transaction;
mod transport;

pub use backoff::reconnect_delay;
pub use connection::{
    ConnectionConfig, ConnectionId, ConnectionManager, ConnectionStatus, SessionEvent,
    SessionFrame,
};
pub use engine::{ConnectionState, EngineConfig, SyncEngine};
pub use persist::{JournalStore, NoopStore, PersistError, Persister, TransactionStore};
pub use queue::{Outcome, QueueCounts, TransactionQueue, TransactionState};
pub use transaction::{
    ApplyError, Transaction, TransactionError, TransactionId, TransactionKind, TransactionRecord,
};
pub use transport::{
    Transport, TransportError, TransportFactory, TransportFuture, TransportResult,
    WebSocketFactory, WebSocketTransport,
};

#[cfg(test)]
pub(crate) mod test_helpers;




#[cfg(test)]
mod integration_tests;



#[cfg(test)]
mod transaction_tests;
