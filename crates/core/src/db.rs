// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed local store.
//!
//! The [`Database`] struct holds the client's materialized view: chats,
//! dialogs, messages, and reactions. Data access goes through the
//! [`LocalStore`](crate::store::LocalStore) trait implemented in `store.rs`.

use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::model::{Chat, Dialog, Message, Reaction};

/// SQL schema for the local store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    last_msg_id INTEGER
);

-- Per-user chat state
CREATE TABLE IF NOT EXISTS dialogs (
    chat_id INTEGER PRIMARY KEY,
    unread_count INTEGER NOT NULL DEFAULT 0,
    unread_mark INTEGER NOT NULL DEFAULT 0,
    pinned INTEGER NOT NULL DEFAULT 0
);

-- Negative message_id marks an optimistic row awaiting its server id
CREATE TABLE IF NOT EXISTS messages (
    chat_id INTEGER NOT NULL,
    message_id INTEGER NOT NULL,
    random_id INTEGER,
    from_id INTEGER NOT NULL,
    text TEXT,
    date INTEGER NOT NULL,
    edit_date INTEGER,
    status TEXT NOT NULL DEFAULT 'sent',
    PRIMARY KEY (chat_id, message_id)
);

CREATE TABLE IF NOT EXISTS reactions (
    chat_id INTEGER NOT NULL,
    message_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    emoji TEXT NOT NULL,
    date INTEGER NOT NULL,
    PRIMARY KEY (chat_id, message_id, user_id, emoji)
);

CREATE INDEX IF NOT EXISTS idx_messages_date ON messages(chat_id, date);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
pub(crate) fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Run schema creation and all migrations on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_random_id(conn)?;
    Ok(())
}

/// Migration: Add the random_id column used to match optimistic rows.
fn migrate_add_random_id(conn: &Connection) -> Result<()> {
    let has_random_id: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('messages') WHERE name = 'random_id'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !has_random_id {
        conn.execute("ALTER TABLE messages ADD COLUMN random_id INTEGER", [])?;
    }
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_random_id ON messages(chat_id, random_id)",
        [],
    )?;
    Ok(())
}

/// SQLite database holding the local store.
///
/// The connection sits behind a mutex so one `Database` can be shared
/// between the sync engine (writer) and readers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        run_migrations(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// Locks the connection. A poisoned lock is recovered; SQLite keeps
    /// its own consistency.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub(crate) const CHAT_COLUMNS: &str = "id, title, last_msg_id";
pub(crate) const DIALOG_COLUMNS: &str = "chat_id, unread_count, unread_mark, pinned";
pub(crate) const MESSAGE_COLUMNS: &str =
    "chat_id, message_id, random_id, from_id, text, date, edit_date, status";
pub(crate) const REACTION_COLUMNS: &str = "chat_id, message_id, user_id, emoji, date";

pub(crate) fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        id: row.get(0)?,
        title: row.get(1)?,
        last_msg_id: row.get(2)?,
    })
}

pub(crate) fn dialog_from_row(row: &Row<'_>) -> rusqlite::Result<Dialog> {
    Ok(Dialog {
        chat_id: row.get(0)?,
        unread_count: row.get(1)?,
        unread_mark: row.get(2)?,
        pinned: row.get(3)?,
    })
}

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let status_str: String = row.get(7)?;
    Ok(Message {
        chat_id: row.get(0)?,
        message_id: row.get(1)?,
        random_id: row.get(2)?,
        from_id: row.get(3)?,
        text: row.get(4)?,
        date: row.get(5)?,
        edit_date: row.get(6)?,
        status: parse_db(&status_str, "status")?,
    })
}

pub(crate) fn reaction_from_row(row: &Row<'_>) -> rusqlite::Result<Reaction> {
    Ok(Reaction {
        chat_id: row.get(0)?,
        message_id: row.get(1)?,
        user_id: row.get(2)?,
        emoji: row.get(3)?,
        date: row.get(4)?,
    })
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
