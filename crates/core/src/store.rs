// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local store contract.
//!
//! [`LocalStore`] is what the sync engine writes to: optimistic changes
//! from operations, confirmed rows from results, and pushed update
//! batches. The UI reads the same store.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{
    chat_from_row, dialog_from_row, message_from_row, reaction_from_row, Database, CHAT_COLUMNS,
    DIALOG_COLUMNS, MESSAGE_COLUMNS, REACTION_COLUMNS,
};
use crate::error::{Error, Result};
use crate::model::{Chat, Dialog, Message, MessageStatus, Reaction};
use crate::update::Update;

/// Point mutations and reads on the materialized view, plus update batches.
pub trait LocalStore: Send + Sync {
    fn upsert_chat(&self, chat: &Chat) -> Result<()>;
    fn get_chat(&self, id: i64) -> Result<Chat>;
    fn list_chats(&self) -> Result<Vec<Chat>>;
    /// Deletes a chat with its dialog, messages and reactions.
    fn delete_chat(&self, id: i64) -> Result<bool>;

    fn upsert_dialog(&self, dialog: &Dialog) -> Result<()>;
    fn get_dialog(&self, chat_id: i64) -> Result<Option<Dialog>>;
    fn list_dialogs(&self) -> Result<Vec<Dialog>>;
    fn set_unread_mark(&self, chat_id: i64, unread_mark: bool) -> Result<()>;

    fn upsert_message(&self, message: &Message) -> Result<()>;
    fn get_message(&self, chat_id: i64, message_id: i64) -> Result<Message>;
    /// Finds the row created for a client-generated random id.
    fn find_message_by_random_id(&self, chat_id: i64, random_id: i64) -> Result<Option<Message>>;
    /// Returns the newest `limit` messages of a chat, oldest first.
    fn list_messages(&self, chat_id: i64, limit: usize) -> Result<Vec<Message>>;
    /// Sets a message's text; returns false if the message is missing.
    fn set_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: Option<&str>,
        edit_date: Option<i64>,
    ) -> Result<bool>;
    fn set_message_status(&self, chat_id: i64, message_id: i64, status: MessageStatus)
        -> Result<bool>;
    fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<bool>;

    fn upsert_reaction(&self, reaction: &Reaction) -> Result<()>;
    fn delete_reaction(&self, chat_id: i64, message_id: i64, user_id: i64, emoji: &str)
        -> Result<bool>;
    fn list_reactions(&self, chat_id: i64, message_id: i64) -> Result<Vec<Reaction>>;

    /// Applies one pushed update. Applying the same update twice is a no-op.
    fn apply_update(&self, update: &Update) -> Result<()>;

    /// Applies a batch in slice order and returns how many updates applied.
    ///
    /// A failing update is logged and skipped; later updates still apply.
    fn apply_updates(&self, updates: &[Update]) -> Result<usize> {
        let mut applied = 0;
        for update in updates {
            match self.apply_update(update) {
                Ok(()) => applied += 1,
                Err(e) => {
                    tracing::error!(kind = update.kind(), chat_id = update.chat_id(), error = %e, "failed to apply update");
                }
            }
        }
        Ok(applied)
    }
}

fn upsert_chat(conn: &Connection, chat: &Chat) -> Result<()> {
    conn.execute(
        "INSERT INTO chats (id, title, last_msg_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            last_msg_id = COALESCE(excluded.last_msg_id, chats.last_msg_id)",
        params![chat.id, chat.title, chat.last_msg_id],
    )?;
    Ok(())
}

fn upsert_message(conn: &Connection, message: &Message) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO messages
            (chat_id, message_id, random_id, from_id, text, date, edit_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            message.chat_id,
            message.message_id,
            message.random_id,
            message.from_id,
            message.text,
            message.date,
            message.edit_date,
            message.status.as_str(),
        ],
    )?;
    Ok(())
}

fn delete_messages(conn: &Connection, chat_id: i64, message_ids: &[i64]) -> Result<usize> {
    let mut deleted = 0;
    for message_id in message_ids {
        deleted += conn.execute(
            "DELETE FROM messages WHERE chat_id = ?1 AND message_id = ?2",
            params![chat_id, message_id],
        )?;
        conn.execute(
            "DELETE FROM reactions WHERE chat_id = ?1 AND message_id = ?2",
            params![chat_id, message_id],
        )?;
    }
    Ok(deleted)
}

fn bump_last_msg_id(conn: &Connection, chat_id: i64, message_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE chats SET last_msg_id = MAX(COALESCE(last_msg_id, 0), ?2) WHERE id = ?1",
        params![chat_id, message_id],
    )?;
    Ok(())
}

/// Inserts a confirmed message, replacing the optimistic row carrying the
/// same random id.
fn confirm_message(conn: &Connection, message: &Message) -> Result<()> {
    if let Some(random_id) = message.random_id {
        let mut stmt = conn.prepare(
            "SELECT message_id FROM messages
             WHERE chat_id = ?1 AND random_id = ?2 AND message_id != ?3",
        )?;
        let stale = stmt
            .query_map(params![message.chat_id, random_id, message.message_id], |row| {
                row.get::<_, i64>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for temp_id in stale {
            // Reactions added to the optimistic row follow it to the real id.
            conn.execute(
                "UPDATE OR REPLACE reactions SET message_id = ?3 WHERE chat_id = ?1 AND message_id = ?2",
                params![message.chat_id, temp_id, message.message_id],
            )?;
            conn.execute(
                "DELETE FROM messages WHERE chat_id = ?1 AND message_id = ?2",
                params![message.chat_id, temp_id],
            )?;
        }
    }
    upsert_message(conn, message)?;
    if message.message_id > 0 {
        bump_last_msg_id(conn, message.chat_id, message.message_id)?;
    }
    Ok(())
}

fn apply_update(conn: &Connection, update: &Update) -> Result<()> {
    match update {
        Update::NewMessage { message } => confirm_message(conn, message),
        Update::EditMessage { message } => upsert_message(conn, message),
        Update::DeleteMessages {
            chat_id,
            message_ids,
        } => delete_messages(conn, *chat_id, message_ids).map(|_| ()),
        Update::UpdateReaction { reaction } => {
            conn.execute(
                "INSERT OR REPLACE INTO reactions (chat_id, message_id, user_id, emoji, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    reaction.chat_id,
                    reaction.message_id,
                    reaction.user_id,
                    reaction.emoji,
                    reaction.date
                ],
            )?;
            Ok(())
        }
        Update::DeleteReaction {
            chat_id,
            message_id,
            user_id,
            emoji,
        } => {
            conn.execute(
                "DELETE FROM reactions
                 WHERE chat_id = ?1 AND message_id = ?2 AND user_id = ?3 AND emoji = ?4",
                params![chat_id, message_id, user_id, emoji],
            )?;
            Ok(())
        }
        Update::MarkAsUnread {
            chat_id,
            unread_mark,
        } => {
            conn.execute(
                "INSERT INTO dialogs (chat_id, unread_mark) VALUES (?1, ?2)
                 ON CONFLICT(chat_id) DO UPDATE SET unread_mark = excluded.unread_mark",
                params![chat_id, unread_mark],
            )?;
            Ok(())
        }
        Update::NewChat { chat } => {
            upsert_chat(conn, chat)?;
            conn.execute(
                "INSERT OR IGNORE INTO dialogs (chat_id) VALUES (?1)",
                params![chat.id],
            )?;
            Ok(())
        }
        Update::DeleteChat { chat_id } => delete_chat(conn, *chat_id).map(|_| ()),
    }
}

fn delete_chat(conn: &Connection, chat_id: i64) -> Result<bool> {
    conn.execute("DELETE FROM reactions WHERE chat_id = ?1", params![chat_id])?;
    conn.execute("DELETE FROM messages WHERE chat_id = ?1", params![chat_id])?;
    conn.execute("DELETE FROM dialogs WHERE chat_id = ?1", params![chat_id])?;
    let affected = conn.execute("DELETE FROM chats WHERE id = ?1", params![chat_id])?;
    Ok(affected > 0)
}

impl LocalStore for Database {
    fn upsert_chat(&self, chat: &Chat) -> Result<()> {
        upsert_chat(&self.conn(), chat)
    }

    fn get_chat(&self, id: i64) -> Result<Chat> {
        let chat = self
            .conn()
            .query_row(
                &format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1"),
                params![id],
                chat_from_row,
            )
            .optional()?;
        chat.ok_or(Error::ChatNotFound(id))
    }

    fn list_chats(&self) -> Result<Vec<Chat>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats ORDER BY COALESCE(last_msg_id, 0) DESC, id"
        ))?;
        let chats = stmt
            .query_map([], chat_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(chats)
    }

    fn delete_chat(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let deleted = delete_chat(&tx, id)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn upsert_dialog(&self, dialog: &Dialog) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO dialogs (chat_id, unread_count, unread_mark, pinned)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                dialog.chat_id,
                dialog.unread_count,
                dialog.unread_mark,
                dialog.pinned
            ],
        )?;
        Ok(())
    }

    fn get_dialog(&self, chat_id: i64) -> Result<Option<Dialog>> {
        let dialog = self
            .conn()
            .query_row(
                &format!("SELECT {DIALOG_COLUMNS} FROM dialogs WHERE chat_id = ?1"),
                params![chat_id],
                dialog_from_row,
            )
            .optional()?;
        Ok(dialog)
    }

    fn list_dialogs(&self) -> Result<Vec<Dialog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DIALOG_COLUMNS} FROM dialogs ORDER BY pinned DESC, chat_id"
        ))?;
        let dialogs = stmt
            .query_map([], dialog_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(dialogs)
    }

    fn set_unread_mark(&self, chat_id: i64, unread_mark: bool) -> Result<()> {
        apply_update(
            &self.conn(),
            &Update::MarkAsUnread {
                chat_id,
                unread_mark,
            },
        )
    }

    fn upsert_message(&self, message: &Message) -> Result<()> {
        upsert_message(&self.conn(), message)
    }

    fn get_message(&self, chat_id: i64, message_id: i64) -> Result<Message> {
        let message = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1 AND message_id = ?2"
                ),
                params![chat_id, message_id],
                message_from_row,
            )
            .optional()?;
        message.ok_or(Error::MessageNotFound {
            chat_id,
            message_id,
        })
    }

    fn find_message_by_random_id(&self, chat_id: i64, random_id: i64) -> Result<Option<Message>> {
        let message = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE chat_id = ?1 AND random_id = ?2
                     ORDER BY message_id DESC LIMIT 1"
                ),
                params![chat_id, random_id],
                message_from_row,
            )
            .optional()?;
        Ok(message)
    }

    fn list_messages(&self, chat_id: i64, limit: usize) -> Result<Vec<Message>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1
             ORDER BY date DESC, message_id DESC LIMIT ?2"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut messages = stmt
            .query_map(params![chat_id, limit], message_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    fn set_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: Option<&str>,
        edit_date: Option<i64>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE messages SET text = ?3, edit_date = ?4 WHERE chat_id = ?1 AND message_id = ?2",
            params![chat_id, message_id, text, edit_date],
        )?;
        Ok(affected > 0)
    }

    fn set_message_status(
        &self,
        chat_id: i64,
        message_id: i64,
        status: MessageStatus,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE messages SET status = ?3 WHERE chat_id = ?1 AND message_id = ?2",
            params![chat_id, message_id, status.as_str()],
        )?;
        Ok(affected > 0)
    }

    fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let deleted = delete_messages(&tx, chat_id, &[message_id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn upsert_reaction(&self, reaction: &Reaction) -> Result<()> {
        apply_update(
            &self.conn(),
            &Update::UpdateReaction {
                reaction: reaction.clone(),
            },
        )
    }

    fn delete_reaction(
        &self,
        chat_id: i64,
        message_id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM reactions
             WHERE chat_id = ?1 AND message_id = ?2 AND user_id = ?3 AND emoji = ?4",
            params![chat_id, message_id, user_id, emoji],
        )?;
        Ok(affected > 0)
    }

    fn list_reactions(&self, chat_id: i64, message_id: i64) -> Result<Vec<Reaction>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions
             WHERE chat_id = ?1 AND message_id = ?2 ORDER BY date, user_id, emoji"
        ))?;
        let reactions = stmt
            .query_map(params![chat_id, message_id], reaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reactions)
    }

    fn apply_update(&self, update: &Update) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        apply_update(&tx, update)?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
