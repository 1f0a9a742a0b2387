// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;

fn table_names(db: &Database) -> Vec<String> {
    let conn = db.conn();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<std::result::Result<Vec<String>, _>>()
        .unwrap();
    names
}

#[test]
fn open_in_memory_creates_schema() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(
        table_names(&db),
        vec!["chats", "dialogs", "messages", "reactions"]
    );
}

#[test]
fn open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("store.db");

    Database::open(&path).unwrap();

    assert!(path.exists());
}

#[test]
fn migrations_are_idempotent() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.conn();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
}

#[test]
fn migration_adds_random_id_to_old_schema() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE messages (
            chat_id INTEGER NOT NULL,
            message_id INTEGER NOT NULL,
            from_id INTEGER NOT NULL,
            text TEXT,
            date INTEGER NOT NULL,
            edit_date INTEGER,
            status TEXT NOT NULL DEFAULT 'sent',
            PRIMARY KEY (chat_id, message_id)
        );",
    )
    .unwrap();

    run_migrations(&conn).unwrap();

    let has_column: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('messages') WHERE name = 'random_id'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(has_column);
}

#[test]
fn reopen_keeps_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    {
        let db = Database::open(&path).unwrap();
        db.conn()
            .execute("INSERT INTO chats (id, title) VALUES (1, 'general')", [])
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let title: String = db
        .conn()
        .query_row("SELECT title FROM chats WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(title, "general");
}

#[test]
fn corrupted_status_is_reported() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.conn();
    conn.execute(
        "INSERT INTO messages (chat_id, message_id, from_id, date, status) VALUES (1, 1, 1, 0, 'bogus')",
        [],
    )
    .unwrap();

    let result = conn.query_row(
        &format!("SELECT {MESSAGE_COLUMNS} FROM messages"),
        [],
        message_from_row,
    );
    assert!(result.is_err());
}
