// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the sync module.
//!
//! These tests run the whole engine against on-disk state:
//! - Durable work surviving a restart
//! - Rollbacks across several operation types
//! - Heartbeat keeping an idle connection alive

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use inl_core::protocol::{Method, ServerMessage};
use inl_core::{Database, LocalStore, Message, MessageStatus};
use serde_json::json;
use tempfile::{tempdir, TempDir};

use super::connection::ConnectionConfig;
use super::engine::{ConnectionState, EngineConfig, SyncEngine};
use super::persist::JournalStore;
use super::test_helpers::{sent_row, wait_until, within, MockServer};
use super::transaction::TransactionError;
use crate::ops::{DeleteMessages, EditMessage, MarkAsUnread, Operation, SendMessage};

fn config(heartbeat_interval: Duration) -> EngineConfig {
    EngineConfig {
        connection: ConnectionConfig {
            url: "ws://mock".to_string(),
            token: "secret".to_string(),
            connect_timeout: Duration::from_secs(1),
            heartbeat_interval,
            heartbeat_timeout: Duration::from_millis(200),
        },
        ..EngineConfig::default()
    }
}

struct Client {
    store: Arc<Database>,
    journal: JournalStore,
    engine: Arc<SyncEngine>,
}

fn client(dir: &TempDir, server: &MockServer) -> Client {
    let store = Arc::new(Database::open(&dir.path().join("store.db")).unwrap());
    let journal = JournalStore::new(dir.path().join("transactions.jsonl"));
    let engine = SyncEngine::open(
        config(Duration::ZERO),
        server.factory(),
        store.clone(),
        Box::new(journal.clone()),
    )
    .unwrap();
    Client {
        store,
        journal,
        engine: Arc::new(engine),
    }
}

fn seed_message(store: &Database, message_id: i64, text: &str) {
    store
        .upsert_message(&Message {
            chat_id: 1,
            message_id,
            random_id: None,
            from_id: 2,
            text: Some(text.to_string()),
            date: 1_700_000_000,
            edit_date: None,
            status: MessageStatus::Sent,
        })
        .unwrap();
}

/// Queue work offline, restart, and deliver it on the next run.
#[tokio::test]
async fn test_queue_persistence_across_restarts() {
    let dir = tempdir().unwrap();
    let server = MockServer::new();

    {
        let first = client(&dir, &server);
        first.engine.submit_detached(SendMessage::with_random_id(1, "one", 1));
        first.engine.submit_detached(SendMessage::with_random_id(1, "two", 2));
        first.engine.submit_detached(MarkAsUnread::new(1));
        first.engine.shutdown().await;
        assert_eq!(first.journal.replay().unwrap().len(), 2);
    }

    let second = client(&dir, &server);
    assert_eq!(second.engine.queue_counts().queued, 2);
    assert_eq!(
        sent_row(second.store.as_ref(), 1, 1).unwrap().status,
        MessageStatus::Sending
    );

    second.engine.start();
    let calls = server.wait_for_rpc_calls(2).await;
    let texts: Vec<_> = calls.iter().map(|(_, _, c)| c.input["text"].clone()).collect();
    assert_eq!(texts, vec![json!("one"), json!("two")]);

    for (_, msg_id, _) in &calls {
        server.push(ServerMessage::ack(*msg_id));
        server.push(ServerMessage::rpc_result(*msg_id, json!({})));
    }
    wait_until(|| second.engine.queue_counts().total() == 0).await;
    second.engine.shutdown().await;

    assert!(second.journal.replay().unwrap().is_empty());
    assert_eq!(
        sent_row(second.store.as_ref(), 1, 2).unwrap().status,
        MessageStatus::Sent
    );
}

/// An acknowledged send is off disk; a restart does not replay it.
#[tokio::test]
async fn test_acknowledged_work_not_replayed() {
    let dir = tempdir().unwrap();
    let server = MockServer::new();

    {
        let first = client(&dir, &server);
        first.engine.start();
        first.engine.submit_detached(SendMessage::with_random_id(1, "hi", 1));
        let calls = server.wait_for_rpc_calls(1).await;
        server.push(ServerMessage::ack(calls[0].1));
        wait_until(|| first.engine.queue_counts().acknowledged == 1).await;
        first.engine.shutdown().await;
    }

    let second = client(&dir, &server);
    assert_eq!(second.engine.queue_counts().total(), 0);
}

/// Rejected edits and deletes restore what the user saw before.
#[tokio::test]
async fn test_rejections_roll_back_store() {
    let dir = tempdir().unwrap();
    let server = MockServer::new();
    let c = client(&dir, &server);
    seed_message(&c.store, 10, "original");
    seed_message(&c.store, 11, "keep me");
    c.engine.start();

    let engine = Arc::clone(&c.engine);
    let edit = tokio::spawn(async move {
        engine
            .submit(Operation::from(EditMessage::new(1, 10, "edited")))
            .await
    });
    let engine = Arc::clone(&c.engine);
    let delete = tokio::spawn(async move {
        engine
            .submit(Operation::from(DeleteMessages::new(1, vec![11])))
            .await
    });

    let calls = server.wait_for_rpc_calls(2).await;
    assert_eq!(
        c.store.get_message(1, 10).unwrap().text.as_deref(),
        Some("edited")
    );
    assert!(c.store.get_message(1, 11).is_err());

    for (_, msg_id, call) in &calls {
        assert!(matches!(call.method, Method::EditMessage | Method::DeleteMessages));
        server.push(ServerMessage::rpc_error(*msg_id, 6, "Invalid message id", 400));
    }

    let edit = within(edit).await.unwrap().unwrap_err();
    let delete = within(delete).await.unwrap().unwrap_err();
    assert!(matches!(edit, TransactionError::RemoteRejected { error_code: 6, .. }));
    assert!(matches!(delete, TransactionError::RemoteRejected { error_code: 6, .. }));

    assert_eq!(
        c.store.get_message(1, 10).unwrap().text.as_deref(),
        Some("original")
    );
    assert_eq!(
        c.store.get_message(1, 11).unwrap().text.as_deref(),
        Some("keep me")
    );
}

/// Several reconnects still end in exactly one resolution.
#[tokio::test]
async fn test_flapping_connection_single_resolution() {
    let dir = tempdir().unwrap();
    let server = MockServer::new();
    let c = client(&dir, &server);
    c.engine.start();

    let engine = Arc::clone(&c.engine);
    let handle = tokio::spawn(async move {
        engine
            .submit(SendMessage::with_random_id(1, "persistent", 5))
            .await
    });

    for n in 1..=3 {
        server.wait_for_rpc_calls(n).await;
        server.drop_connection();
    }
    let calls = server.wait_for_rpc_calls(4).await;
    let (_, msg_id, _) = &calls[3];
    server.push(ServerMessage::ack(*msg_id));
    server.push(ServerMessage::rpc_result(*msg_id, json!({})));

    assert!(within(handle).await.unwrap().is_ok());
    assert_eq!(
        sent_row(c.store.as_ref(), 1, 5).unwrap().status,
        MessageStatus::Sent
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.rpc_calls().len(), 4);
}

/// Heartbeats keep an idle connection up.
#[tokio::test]
async fn test_ping_pong_health_check() {
    let server = MockServer::new();
    let store = Arc::new(Database::open_in_memory().unwrap());
    let engine = SyncEngine::open(
        config(Duration::from_millis(20)),
        server.factory(),
        store,
        Box::new(super::persist::NoopStore),
    )
    .unwrap();
    let mut state = engine.subscribe();
    engine.start();
    within(state.wait_for(|s| *s == ConnectionState::Connected))
        .await
        .unwrap();

    wait_until(|| server.pings() >= 5).await;
    assert_eq!(server.connection_count(), 1);
    assert_eq!(engine.state(), ConnectionState::Connected);
}
