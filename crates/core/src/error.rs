// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for inl-core operations.

use thiserror::Error;

/// All possible errors that can occur in inl-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("chat not found: {0}")]
    ChatNotFound(i64),

    #[error("message not found: {message_id} in chat {chat_id}")]
    MessageNotFound { chat_id: i64, message_id: i64 },

    #[error("invalid message status: '{0}'\n  hint: valid statuses are: sending, sent, failed")]
    InvalidMessageStatus(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for inl-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
