// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use inl_core::protocol::Method;
use inl_core::{LocalStore, Reaction};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{apply_mutation_result, now_secs};
use crate::sync::{ApplyError, Transaction, TransactionError, TransactionKind};

/// Adds an emoji reaction to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddReaction {
    pub chat_id: i64,
    pub message_id: i64,
    pub emoji: String,
    #[serde(default)]
    pub user_id: i64,
    pub date: i64,
}

impl AddReaction {
    pub fn new(chat_id: i64, message_id: i64, user_id: i64, emoji: impl Into<String>) -> Self {
        AddReaction {
            chat_id,
            message_id,
            emoji: emoji.into(),
            user_id,
            date: now_secs(),
        }
    }
}

impl Transaction for AddReaction {
    fn method(&self) -> Method {
        Method::AddReaction
    }

    fn kind(&self) -> TransactionKind {
        TransactionKind::Mutation {
            durable: true,
            retry_after_ack: false,
        }
    }

    fn input(&self) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "message_id": self.message_id,
            "emoji": self.emoji,
        })
    }

    fn apply_optimistic(&mut self, store: &dyn LocalStore) -> inl_core::Result<()> {
        store.upsert_reaction(&Reaction {
            chat_id: self.chat_id,
            message_id: self.message_id,
            user_id: self.user_id,
            emoji: self.emoji.clone(),
            date: self.date,
        })
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
        self.on_cancelled(store)
    }

    fn on_cancelled(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        store.delete_reaction(self.chat_id, self.message_id, self.user_id, &self.emoji)?;
        Ok(())
    }
}

/// Removes the user's emoji reaction from a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteReaction {
    pub chat_id: i64,
    pub message_id: i64,
    pub emoji: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub removed: Option<Reaction>,
}

impl DeleteReaction {
    pub fn new(chat_id: i64, message_id: i64, user_id: i64, emoji: impl Into<String>) -> Self {
        DeleteReaction {
            chat_id,
            message_id,
            emoji: emoji.into(),
            user_id,
            removed: None,
        }
    }
}

impl Transaction for DeleteReaction {
    fn method(&self) -> Method {
        Method::DeleteReaction
    }

    fn kind(&self) -> TransactionKind {
        TransactionKind::Mutation {
            durable: true,
            retry_after_ack: false,
        }
    }

    fn input(&self) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "message_id": self.message_id,
            "emoji": self.emoji,
        })
    }

    fn apply_optimistic(&mut self, store: &dyn LocalStore) -> inl_core::Result<()> {
        self.removed = store
            .list_reactions(self.chat_id, self.message_id)?
            .into_iter()
            .find(|r| r.user_id == self.user_id && r.emoji == self.emoji);
        if self.removed.is_some() {
            store.delete_reaction(self.chat_id, self.message_id, self.user_id, &self.emoji)?;
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
        self.on_cancelled(store)
    }

    fn on_cancelled(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        match &self.removed {
            Some(reaction) => store.upsert_reaction(reaction),
            None => Ok(()),
        }
    }
}
