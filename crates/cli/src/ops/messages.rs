// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message mutations: send, edit, delete.

use inl_core::protocol::Method;
use inl_core::{random_id, temporary_message_id, LocalStore, Message, MessageStatus, Update};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{apply_mutation_result, now_secs};
use crate::sync::{ApplyError, Transaction, TransactionError, TransactionKind};

/// Sends a new text message.
///
/// The optimistic row lives at a negative id derived from `random_id`
/// until the server's `new_message` update replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    pub random_id: i64,
    #[serde(default)]
    pub from_id: i64,
    pub date: i64,
}

impl SendMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self::with_random_id(chat_id, text, random_id())
    }

    pub fn with_random_id(chat_id: i64, text: impl Into<String>, random_id: i64) -> Self {
        SendMessage {
            chat_id,
            text: text.into(),
            random_id,
            from_id: 0,
            date: now_secs(),
        }
    }

    /// Sets the author of the optimistic row.
    pub fn from_user(mut self, user_id: i64) -> Self {
        self.from_id = user_id;
        self
    }

    /// Id of the optimistic row.
    pub fn temporary_id(&self) -> i64 {
        temporary_message_id(self.random_id)
    }
}

impl Transaction for SendMessage {
    fn method(&self) -> Method {
        Method::SendMessage
    }

    fn kind(&self) -> TransactionKind {
        TransactionKind::Mutation {
            durable: true,
            retry_after_ack: true,
        }
    }

    fn input(&self) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "text": self.text,
            "random_id": self.random_id,
        })
    }

    fn apply_optimistic(&mut self, store: &dyn LocalStore) -> inl_core::Result<()> {
        store.upsert_message(&Message {
            chat_id: self.chat_id,
            message_id: self.temporary_id(),
            random_id: Some(self.random_id),
            from_id: self.from_id,
            text: Some(self.text.clone()),
            date: self.date,
            edit_date: None,
            status: MessageStatus::Sending,
        })
    }

    fn apply_result(
        &self,
        store: &dyn LocalStore,
        result: &serde_json::Value,
    ) -> Result<(), ApplyError> {
        let updates = apply_mutation_result(store, result)?;
        let confirmed = updates
            .iter()
            .any(|u| matches!(u, Update::NewMessage { message } if message.random_id == Some(self.random_id)));
        if !confirmed {
            // Confirmation comes later over the update stream.
            store.set_message_status(self.chat_id, self.temporary_id(), MessageStatus::Sent)?;
        }
        Ok(())
    }

    fn on_failed(&self, store: &dyn LocalStore, _error: &TransactionError) -> inl_core::Result<()> {
        store.set_message_status(self.chat_id, self.temporary_id(), MessageStatus::Failed)?;
        Ok(())
    }

    fn on_cancelled(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        store.delete_message(self.chat_id, self.temporary_id())?;
        Ok(())
    }
}

/// Text and edit date captured before an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousText {
    pub text: Option<String>,
    pub edit_date: Option<i64>,
}

/// Replaces the text of an existing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    #[serde(default)]
    pub previous: Option<PreviousText>,
}

impl EditMessage {
    pub fn new(chat_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        EditMessage {
            chat_id,
            message_id,
            text: text.into(),
            previous: None,
        }
    }

    fn restore(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        if let Some(previous) = &self.previous {
            store.set_message_text(
                self.chat_id,
                self.message_id,
                previous.text.as_deref(),
                previous.edit_date,
            )?;
        }
        Ok(())
    }
}

impl Transaction for EditMessage {
    fn method(&self) -> Method {
        Method::EditMessage
    }

    fn kind(&self) -> TransactionKind {
        TransactionKind::Mutation {
            durable: true,
            retry_after_ack: true,
        }
    }

    fn input(&self) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "message_id": self.message_id,
            "text": self.text,
        })
    }

    fn apply_optimistic(&mut self, store: &dyn LocalStore) -> inl_core::Result<()> {
        let current = match store.get_message(self.chat_id, self.message_id) {
            Ok(message) => message,
            Err(inl_core::Error::MessageNotFound { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };
        self.previous = Some(PreviousText {
            text: current.text,
            edit_date: current.edit_date,
        });
        store.set_message_text(self.chat_id, self.message_id, Some(&self.text), Some(now_secs()))?;
        Ok(())
    }

    fn apply_result(
        &self,
        store: &dyn LocalStore,
        result: &serde_json::Value,
    ) -> Result<(), ApplyError> {
        apply_mutation_result(store, result)?;
        Ok(())
    }

    fn on_failed(&self, store: &dyn LocalStore, _error: &TransactionError) -> inl_core::Result<()> {
        self.restore(store)
    }

    fn on_cancelled(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        self.restore(store)
    }
}

/// Deletes messages from a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteMessages {
    pub chat_id: i64,
    pub message_ids: Vec<i64>,
    /// Rows removed optimistically, restored on failure.
    #[serde(default)]
    pub removed: Vec<Message>,
}

impl DeleteMessages {
    pub fn new(chat_id: i64, message_ids: Vec<i64>) -> Self {
        DeleteMessages {
            chat_id,
            message_ids,
            removed: Vec::new(),
        }
    }

    fn restore(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        for message in &self.removed {
            store.upsert_message(message)?;
        }
        Ok(())
    }
}

impl Transaction for DeleteMessages {
    fn method(&self) -> Method {
        Method::DeleteMessages
    }

    fn kind(&self) -> TransactionKind {
        TransactionKind::Mutation {
            durable: true,
            retry_after_ack: true,
        }
    }

    fn input(&self) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "message_ids": self.message_ids,
        })
    }

    fn apply_optimistic(&mut self, store: &dyn LocalStore) -> inl_core::Result<()> {
        for &message_id in &self.message_ids {
            match store.get_message(self.chat_id, message_id) {
                Ok(message) => {
                    store.delete_message(self.chat_id, message_id)?;
                    self.removed.push(message);
                }
                Err(inl_core::Error::MessageNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn apply_result(
        &self,
        store: &dyn LocalStore,
        result: &serde_json::Value,
    ) -> Result<(), ApplyError> {
        apply_mutation_result(store, result)?;
        Ok(())
    }

    fn on_failed(&self, store: &dyn LocalStore, _error: &TransactionError) -> inl_core::Result<()> {
        self.restore(store)
    }

    fn on_cancelled(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        self.restore(store)
    }
}
