// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use inl_core::protocol::Method;
use inl_core::LocalStore;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::apply_mutation_result;
use crate::sync::{ApplyError, Transaction, TransactionError, TransactionKind};

fn default_true() -> bool {
    true
}

/// Sets or clears the manual unread mark of a chat.
///
/// Not worth replaying after a restart, but safe to resend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkAsUnread {
    pub chat_id: i64,
    #[serde(default = "default_true")]
    pub unread_mark: bool,
    #[serde(default)]
    pub previous: Option<bool>,
}

impl MarkAsUnread {
    pub fn new(chat_id: i64) -> Self {
        MarkAsUnread {
            chat_id,
            unread_mark: true,
            previous: None,
        }
    }

    pub fn clear(chat_id: i64) -> Self {
        MarkAsUnread {
            unread_mark: false,
            ..Self::new(chat_id)
        }
    }

    /// Puts the previous mark back. A dialog created by the optimistic
    /// write stays behind with the default (cleared) mark, the same row a
    /// `NewChat` update would insert.
    fn restore(&self, store: &dyn LocalStore) -> inl_core::Result<()> {
        store.set_unread_mark(self.chat_id, self.previous.unwrap_or(false))
    }
}

impl Transaction for MarkAsUnread {
    fn method(&self) -> Method {
        Method::MarkAsUnread
    }

    fn kind(&self) -> TransactionKind {
        TransactionKind::Mutation {
            durable: false,
            retry_after_ack: true,
        }
    }

    fn input(&self) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "unread_mark": self.unread_mark,
        })
    }

    fn apply_optimistic(&mut self, store: &dyn LocalStore) -> inl_core::Result<()> {
        self.previous = store.get_dialog(self.chat_id)?.map(|d| d.unread_mark);
        store.set_unread_mark(self.chat_id, self.unread_mark)
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
