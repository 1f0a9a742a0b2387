// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::model::MessageStatus;
use yare::parameterized;

fn message(chat_id: i64, message_id: i64) -> Message {
    Message {
        chat_id,
        message_id,
        random_id: None,
        from_id: 1,
        text: Some("hello".into()),
        date: 1000,
        edit_date: None,
        status: MessageStatus::Sent,
    }
}

#[parameterized(
    new_message = { Update::NewMessage { message: message(3, 1) }, 3, "new_message" },
    edit_message = { Update::EditMessage { message: message(4, 1) }, 4, "edit_message" },
    delete_messages = { Update::DeleteMessages { chat_id: 5, message_ids: vec![1, 2] }, 5, "delete_messages" },
    delete_reaction = { Update::DeleteReaction { chat_id: 6, message_id: 1, user_id: 2, emoji: "+1".into() }, 6, "delete_reaction" },
    mark_as_unread = { Update::MarkAsUnread { chat_id: 7, unread_mark: true }, 7, "mark_as_unread" },
    new_chat = { Update::NewChat { chat: Chat::new(8, "general") }, 8, "new_chat" },
    delete_chat = { Update::DeleteChat { chat_id: 9 }, 9, "delete_chat" },
)]
fn update_chat_id_and_kind(update: Update, chat_id: i64, kind: &str) {
    assert_eq!(update.chat_id(), chat_id);
    assert_eq!(update.kind(), kind);
}

#[test]
fn update_json_format() {
    let update = Update::MarkAsUnread {
        chat_id: 7,
        unread_mark: true,
    };
    let json = serde_json::to_string(&update).unwrap();
    assert!(json.contains("\"type\":\"mark_as_unread\""));
    assert!(json.contains("\"chat_id\":7"));
}

#[test]
fn update_parses_server_batch() {
    let json = r#"[
        {"type":"new_chat","chat":{"id":1,"title":"general"}},
        {"type":"delete_messages","chat_id":1,"message_ids":[4,5]}
    ]"#;
    let updates: Vec<Update> = serde_json::from_str(json).unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0], Update::NewChat { chat: Chat::new(1, "general") });
}
