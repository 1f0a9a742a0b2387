// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete operations, one per remote method.
//!
//! Each operation is plain serializable context data plus its
//! [`Transaction`] behavior, so persisted records replay without closures.

mod dialogs;
mod messages;
mod queries;
mod reactions;

pub use dialogs::MarkAsUnread;
pub use messages::{DeleteMessages, EditMessage, SendMessage};
pub use queries::{GetChatHistory, GetChats, DEFAULT_HISTORY_LIMIT};
pub use reactions::{AddReaction, DeleteReaction};

use inl_core::protocol::Method;
use inl_core::{LocalStore, Update};
use serde::{Deserialize, Serialize};

use crate::sync::{ApplyError, Transaction, TransactionError, TransactionKind};

/// Every operation the engine can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Operation {
    SendMessage(SendMessage),
    EditMessage(EditMessage),
    DeleteMessages(DeleteMessages),
    AddReaction(AddReaction),
    DeleteReaction(DeleteReaction),
    MarkAsUnread(MarkAsUnread),
    GetChats(GetChats),
    GetChatHistory(GetChatHistory),
}

impl Operation {
    fn inner(&self) -> &dyn Transaction {
        match self {
            Operation::SendMessage(op) => op,
            Operation::EditMessage(op) => op,
            Operation::DeleteMessages(op) => op,
            Operation::AddReaction(op) => op,
            Operation::DeleteReaction(op) => op,
            Operation::MarkAsUnread(op) => op,
            Operation::GetChats(op) => op,
            Operation::GetChatHistory(op) => op,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Transaction {
        match self {
            Operation::SendMessage(op) => op,
            Operation::EditMessage(op) => op,
            Operation::DeleteMessages(op) => op,
            Operation::AddReaction(op) => op,
            Operation::DeleteReaction(op) => op,
            Operation::MarkAsUnread(op) => op,
            Operation::GetChats(op) => op,
            Operation::GetChatHistory(op) => op,
        }
    }

    /// The chat this operation targets, if any.
    pub fn chat_id(&self) -> Option<i64> {
        match self {
            Operation::SendMessage(op) => Some(op.chat_id),
            Operation::EditMessage(op) => Some(op.chat_id),
            Operation::DeleteMessages(op) => Some(op.chat_id),
            Operation::AddReaction(op) => Some(op.chat_id),
            Operation::DeleteReaction(op) => Some(op.chat_id),
            Operation::MarkAsUnread(op) => Some(op.chat_id),
            Operation::GetChats(_) => None,
            Operation::GetChatHistory(op) => Some(op.chat_id),
        }
    }

    /// One-line description for listings.
    pub fn summary(&self) -> String {
        match self {
            Operation::SendMessage(op) => format!("send to chat {}: {}", op.chat_id, op.text),
            Operation::EditMessage(op) => {
                format!("edit message {} in chat {}: {}", op.message_id, op.chat_id, op.text)
            }
            Operation::DeleteMessages(op) => format!(
                "delete {} message(s) in chat {}",
                op.message_ids.len(),
                op.chat_id
            ),
            Operation::AddReaction(op) => format!(
                "react {} to message {} in chat {}",
                op.emoji, op.message_id, op.chat_id
            ),
            Operation::DeleteReaction(op) => format!(
                "remove {} from message {} in chat {}",
                op.emoji, op.message_id, op.chat_id
            ),
            Operation::MarkAsUnread(op) => format!("mark chat {} as unread", op.chat_id),
            Operation::GetChats(_) => "fetch chats".to_string(),
            Operation::GetChatHistory(op) => format!("fetch history of chat {}", op.chat_id),
        }
    }
}

impl Transaction for Operation {
    fn method(&self) -> Method {
        self.inner().method()
    }

    fn kind(&self) -> TransactionKind {
        self.inner().kind()
    }

    fn input(&self) -> serde_json::Value {
        self.inner().input()
    }

    fn apply_optimistic(&mut self, store: &dyn LocalStore) -> inl_core::Result<()> {
        self.inner_mut().apply_optimistic(store)
    }

    fn apply_result(
        &self,
        store: &dyn LocalStore,
        result: &serde_json::Value,
    ) -> Result<(), ApplyError> {
        self.inner().apply_result(store, result)
    }

    fn on_failed(&self, store: &dyn LocalStore, error: &TransactionError) -> inl_core::Result<()> {
        self.inner().on_failed(store, error)
    }

    fn on_cancelled(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        self.inner().on_cancelled(store)
    }
}

macro_rules! impl_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Operation {
                fn from(op: $variant) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

impl_from!(
    SendMessage,
    EditMessage,
    DeleteMessages,
    AddReaction,
    DeleteReaction,
    MarkAsUnread,
    GetChats,
    GetChatHistory,
);

#[derive(Debug, Default, Deserialize)]
struct MutationResult {
    #[serde(default)]
    updates: Vec<Update>,
}

/// Applies the `updates` carried by a mutation result.
pub(crate) fn apply_mutation_result(
    store: &dyn LocalStore,
    result: &serde_json::Value,
) -> Result<Vec<Update>, ApplyError> {
    if result.is_null() {
        return Ok(Vec::new());
    }
    let parsed: MutationResult = serde_json::from_value(result.clone())?;
    store.apply_updates(&parsed.updates)?;
    Ok(parsed.updates)
}

pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
