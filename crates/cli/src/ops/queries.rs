// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only fetches. Results are upserted into the store.

use inl_core::protocol::Method;
use inl_core::{Chat, Dialog, LocalStore, Message, Update};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::sync::{ApplyError, Transaction, TransactionKind};

/// Fetches every chat and its dialog state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetChats {}

#[derive(Debug, Default, Deserialize)]
struct ChatsResult {
    #[serde(default)]
    chats: Vec<Chat>,
    #[serde(default)]
    dialogs: Vec<Dialog>,
}

impl Transaction for GetChats {
    fn method(&self) -> Method {
        Method::GetChats
    }

    fn kind(&self) -> TransactionKind {
        TransactionKind::Query
    }

    fn input(&self) -> serde_json::Value {
        json!({})
    }

    fn apply_result(
        &self,
        store: &dyn LocalStore,
        result: &serde_json::Value,
    ) -> Result<(), ApplyError> {
        let parsed: ChatsResult = serde_json::from_value(result.clone())?;
        for chat in &parsed.chats {
            store.upsert_chat(chat)?;
        }
        for dialog in &parsed.dialogs {
            store.upsert_dialog(dialog)?;
        }
        Ok(())
    }
}

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

fn default_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

/// Fetches the newest messages of a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetChatHistory {
    pub chat_id: i64,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl GetChatHistory {
    pub fn new(chat_id: i64, limit: u32) -> Self {
        GetChatHistory { chat_id, limit }
    }
}

#[derive(Debug, Default, Deserialize)]
struct HistoryResult {
    #[serde(default)]
    messages: Vec<Message>,
}

impl Transaction for GetChatHistory {
    fn method(&self) -> Method {
        Method::GetChatHistory
    }

    fn kind(&self) -> TransactionKind {
        TransactionKind::Query
    }

    fn input(&self) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "limit": self.limit,
        })
    }

    fn apply_result(
        &self,
        store: &dyn LocalStore,
        result: &serde_json::Value,
    ) -> Result<(), ApplyError> {
        let parsed: HistoryResult = serde_json::from_value(result.clone())?;
        // Same path as a pushed message, so it replaces any optimistic row.
        for message in parsed.messages {
            store.apply_update(&Update::NewMessage { message })?;
        }
        Ok(())
    }
}
