// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Domain types materialized in the local store.
//!
//! These are the rows the UI layer reads: chats, per-chat dialog state,
//! messages, and reactions. Server ids are `i64`; optimistic messages use
//! negative temporary ids until the server assigns a real one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A chat (direct or group thread).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    /// Id of the newest message known for this chat.
    #[serde(default)]
    pub last_msg_id: Option<i64>,
}

impl Chat {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Chat {
            id,
            title: title.into(),
            last_msg_id: None,
        }
    }
}

/// Per-user state of a chat (unread counters, pin).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub chat_id: i64,
    #[serde(default)]
    pub unread_count: i64,
    /// Explicit "mark as unread" flag set by the user.
    #[serde(default)]
    pub unread_mark: bool,
    #[serde(default)]
    pub pinned: bool,
}

impl Dialog {
    pub fn new(chat_id: i64) -> Self {
        Dialog {
            chat_id,
            ..Default::default()
        }
    }
}

/// Delivery status of a message as seen by this client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Written locally, not yet confirmed by the server.
    Sending,
    /// Confirmed by the server.
    #[default]
    Sent,
    /// The send failed terminally.
    Failed,
}

impl MessageStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sending => "sending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sending" => Ok(MessageStatus::Sending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            _ => Err(Error::InvalidMessageStatus(s.to_string())),
        }
    }
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub chat_id: i64,
    /// Server id, or a negative temporary id for optimistic rows.
    pub message_id: i64,
    /// Client-generated id used to match the server copy to the optimistic row.
    #[serde(default)]
    pub random_id: Option<i64>,
    pub from_id: i64,
    #[serde(default)]
    pub text: Option<String>,
    /// Unix seconds.
    pub date: i64,
    #[serde(default)]
    pub edit_date: Option<i64>,
    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    /// Returns true if this row still carries a temporary (client-side) id.
    pub fn is_temporary(&self) -> bool {
        self.message_id < 0
    }
}

/// An emoji reaction on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub chat_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub emoji: String,
    /// Unix seconds.
    pub date: i64,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
