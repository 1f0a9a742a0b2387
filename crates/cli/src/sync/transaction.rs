// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction records and the behavior contract of an operation.

use std::fmt;

use chrono::{DateTime, Utc};
use inl_core::protocol::{format_rpc_error, Method, RpcCall, RpcError};
use inl_core::LocalStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ops::Operation;

/// Identifier minted at submission, stable across retries and restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query or mutation, with the mutation's replay flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Query,
    Mutation {
        /// Persisted until resolved or expired.
        durable: bool,
        /// May be resent after an ack whose result was lost with the connection.
        retry_after_ack: bool,
    },
}

impl TransactionKind {
    pub fn is_durable(&self) -> bool {
        matches!(self, TransactionKind::Mutation { durable: true, .. })
    }

    pub fn retry_after_ack(&self) -> bool {
        matches!(
            self,
            TransactionKind::Mutation {
                retry_after_ack: true,
                ..
            }
        )
    }
}

/// The unit stored in the queue and on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub created_at: DateTime<Utc>,
    pub operation: Operation,
}

impl TransactionRecord {
    pub fn new(operation: Operation) -> Self {
        TransactionRecord {
            id: TransactionId::new(),
            created_at: Utc::now(),
            operation,
        }
    }
}

/// Terminal failure of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("not connected")]
    NotConnected,

    #[error("timed out before it could be sent")]
    Timeout,

    #[error("{}", format_rpc_error(*error_code, message, *code))]
    RemoteRejected {
        code: i32,
        error_code: i32,
        message: String,
    },

    #[error("outcome unknown: connection lost after the server received it")]
    AmbiguousOutcome,

    #[error("failed to apply result: {0}")]
    ApplyFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("sync engine shut down")]
    Shutdown,
}

impl From<RpcError> for TransactionError {
    fn from(err: RpcError) -> Self {
        TransactionError::RemoteRejected {
            code: err.code,
            error_code: err.error_code,
            message: err.message,
        }
    }
}

/// Failure while applying a result to the local store.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("unexpected result payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] inl_core::Error),
}

/// Behavior of an operation.
///
/// Hooks receive the store explicitly. `apply_optimistic` runs exactly
/// once, before the transaction is queued, and may record what it needs
/// for a later rollback.
pub trait Transaction {
    fn method(&self) -> Method;

    fn kind(&self) -> TransactionKind;

    /// Request parameters.
    fn input(&self) -> serde_json::Value;

    fn request(&self) -> RpcCall {
        RpcCall::new(self.method(), self.input())
    }

    fn apply_optimistic(&mut self, _store: &dyn LocalStore) -> inl_core::Result<()> {
        Ok(())
    }

    fn apply_result(
        &self,
        store: &dyn LocalStore,
        result: &serde_json::Value,
    ) -> Result<(), ApplyError>;

    fn on_failed(&self, _store: &dyn LocalStore, _error: &TransactionError) -> inl_core::Result<()> {
        Ok(())
    }

    fn on_cancelled(&self, _store: &dyn LocalStore) -> inl_core::Result<()> {
        Ok(())
    }
}
