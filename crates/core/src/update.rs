// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server-pushed changes to the local store.
//!
//! Updates arrive in batches, either pushed by the server or carried in a
//! mutation's result. Each update is idempotent: applying it twice leaves
//! the store as applying it once.

use serde::{Deserialize, Serialize};

use crate::model::{Chat, Message, Reaction};

/// A single change to apply to the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    /// A message was created. Replaces the optimistic row with the same random id.
    NewMessage { message: Message },

    /// A message's content changed.
    EditMessage { message: Message },

    /// Messages were deleted.
    DeleteMessages { chat_id: i64, message_ids: Vec<i64> },

    /// A reaction was added (or re-added).
    UpdateReaction { reaction: Reaction },

    /// A reaction was removed.
    DeleteReaction {
        chat_id: i64,
        message_id: i64,
        user_id: i64,
        emoji: String,
    },

    /// The user's unread mark on a chat changed.
    MarkAsUnread { chat_id: i64, unread_mark: bool },

    /// A chat became visible to this user.
    NewChat { chat: Chat },

    /// A chat was deleted or left.
    DeleteChat { chat_id: i64 },
}

impl Update {
    /// Returns the chat this update touches.
    pub fn chat_id(&self) -> i64 {
        match self {
            Update::NewMessage { message } | Update::EditMessage { message } => message.chat_id,
            Update::DeleteMessages { chat_id, .. } => *chat_id,
            Update::UpdateReaction { reaction } => reaction.chat_id,
            Update::DeleteReaction { chat_id, .. } => *chat_id,
            Update::MarkAsUnread { chat_id, .. } => *chat_id,
            Update::NewChat { chat } => chat.id,
            Update::DeleteChat { chat_id } => *chat_id,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Update::NewMessage { .. } => "new_message",
            Update::EditMessage { .. } => "edit_message",
            Update::DeleteMessages { .. } => "delete_messages",
            Update::UpdateReaction { .. } => "update_reaction",
            Update::DeleteReaction { .. } => "delete_reaction",
            Update::MarkAsUnread { .. } => "mark_as_unread",
            Update::NewChat { .. } => "new_chat",
            Update::DeleteChat { .. } => "delete_chat",
        }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
