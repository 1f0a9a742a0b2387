// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{PersistError, TransactionError, TransportError};

/// All errors surfaced by the `inl` commands.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Store(#[from] inl_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Transaction(#[from] TransactionError),

    #[error("transaction journal error: {0}")]
    Persist(#[from] PersistError),

    #[error("no outcome after {0}s\n  hint: the operation stays queued if it is durable; run 'inl pending' to see it")]
    Timeout(u64),
}

/// A specialized Result type for inlrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
