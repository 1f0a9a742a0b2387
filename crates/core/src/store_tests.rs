// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn store() -> Database {
    Database::open_in_memory().unwrap()
}

fn message(chat_id: i64, message_id: i64, text: &str) -> Message {
    Message {
        chat_id,
        message_id,
        random_id: None,
        from_id: 1,
        text: Some(text.into()),
        date: 1000 + message_id,
        edit_date: None,
        status: MessageStatus::Sent,
    }
}

fn reaction(chat_id: i64, message_id: i64, emoji: &str) -> Reaction {
    Reaction {
        chat_id,
        message_id,
        user_id: 1,
        emoji: emoji.into(),
        date: 2000,
    }
}

#[test]
fn chat_upsert_and_get() {
    let db = store();
    db.upsert_chat(&Chat::new(1, "general")).unwrap();
    db.upsert_chat(&Chat::new(1, "renamed")).unwrap();

    assert_eq!(db.get_chat(1).unwrap().title, "renamed");
    assert_eq!(db.list_chats().unwrap().len(), 1);
}

#[test]
fn get_missing_chat_fails() {
    let db = store();
    assert!(matches!(db.get_chat(9), Err(Error::ChatNotFound(9))));
}

#[test]
fn get_missing_message_fails() {
    let db = store();
    assert!(matches!(
        db.get_message(1, 2),
        Err(Error::MessageNotFound {
            chat_id: 1,
            message_id: 2
        })
    ));
}

#[test]
fn upsert_chat_keeps_known_last_msg_id() {
    let db = store();
    let mut chat = Chat::new(1, "general");
    chat.last_msg_id = Some(10);
    db.upsert_chat(&chat).unwrap();
    db.upsert_chat(&Chat::new(1, "general")).unwrap();

    assert_eq!(db.get_chat(1).unwrap().last_msg_id, Some(10));
}

#[test]
fn list_messages_returns_newest_oldest_first() {
    let db = store();
    for id in 1..=5 {
        db.upsert_message(&message(1, id, "m")).unwrap();
    }
    db.upsert_message(&message(2, 6, "other chat")).unwrap();

    let ids: Vec<i64> = db
        .list_messages(1, 3)
        .unwrap()
        .iter()
        .map(|m| m.message_id)
        .collect();
    assert_eq!(ids, vec![3, 4, 5]);
}

#[test]
fn set_message_text_and_status() {
    let db = store();
    db.upsert_message(&message(1, 1, "before")).unwrap();

    assert!(db.set_message_text(1, 1, Some("after"), Some(5)).unwrap());
    assert!(db.set_message_status(1, 1, MessageStatus::Failed).unwrap());
    assert!(!db.set_message_status(1, 99, MessageStatus::Failed).unwrap());

    let stored = db.get_message(1, 1).unwrap();
    assert_eq!(stored.text.as_deref(), Some("after"));
    assert_eq!(stored.edit_date, Some(5));
    assert_eq!(stored.status, MessageStatus::Failed);
}

#[test]
fn delete_message_removes_reactions() {
    let db = store();
    db.upsert_message(&message(1, 1, "hi")).unwrap();
    db.upsert_reaction(&reaction(1, 1, "+1")).unwrap();

    assert!(db.delete_message(1, 1).unwrap());
    assert!(!db.delete_message(1, 1).unwrap());
    assert!(db.list_reactions(1, 1).unwrap().is_empty());
}

#[test]
fn dialog_unread_mark() {
    let db = store();
    assert!(db.get_dialog(1).unwrap().is_none());

    db.set_unread_mark(1, true).unwrap();
    assert!(db.get_dialog(1).unwrap().unwrap().unread_mark);

    db.set_unread_mark(1, false).unwrap();
    assert!(!db.get_dialog(1).unwrap().unwrap().unread_mark);
}

#[test]
fn upsert_dialog_replaces_state() {
    let db = store();
    let mut dialog = Dialog::new(1);
    dialog.unread_count = 4;
    dialog.pinned = true;
    db.upsert_dialog(&dialog).unwrap();

    assert_eq!(db.get_dialog(1).unwrap(), Some(dialog));
    assert_eq!(db.list_dialogs().unwrap().len(), 1);
}

#[test]
fn reactions_upsert_and_delete() {
    let db = store();
    db.upsert_reaction(&reaction(1, 1, "+1")).unwrap();
    db.upsert_reaction(&reaction(1, 1, "+1")).unwrap();
    db.upsert_reaction(&reaction(1, 1, "heart")).unwrap();

    assert_eq!(db.list_reactions(1, 1).unwrap().len(), 2);
    assert!(db.delete_reaction(1, 1, 1, "+1").unwrap());
    assert!(!db.delete_reaction(1, 1, 1, "+1").unwrap());
    assert_eq!(db.list_reactions(1, 1).unwrap().len(), 1);
}

#[test]
fn new_message_replaces_optimistic_row() {
    let db = store();
    db.upsert_chat(&Chat::new(1, "general")).unwrap();
    let mut optimistic = message(1, -77, "hi");
    optimistic.random_id = Some(77);
    optimistic.status = MessageStatus::Sending;
    db.upsert_message(&optimistic).unwrap();
    db.upsert_reaction(&reaction(1, -77, "+1")).unwrap();

    let mut confirmed = message(1, 12, "hi");
    confirmed.random_id = Some(77);
    db.apply_update(&Update::NewMessage { message: confirmed })
        .unwrap();

    assert!(db.get_message(1, -77).is_err());
    let stored = db.find_message_by_random_id(1, 77).unwrap().unwrap();
    assert_eq!(stored.message_id, 12);
    assert_eq!(stored.status, MessageStatus::Sent);
    assert_eq!(db.list_reactions(1, 12).unwrap().len(), 1);
    assert_eq!(db.get_chat(1).unwrap().last_msg_id, Some(12));
}

#[test]
fn updates_are_idempotent() {
    let db = store();
    let mut confirmed = message(1, 12, "hi");
    confirmed.random_id = Some(77);
    let batch = vec![
        Update::NewChat {
            chat: Chat::new(1, "general"),
        },
        Update::NewMessage { message: confirmed },
        Update::UpdateReaction {
            reaction: reaction(1, 12, "+1"),
        },
        Update::MarkAsUnread {
            chat_id: 1,
            unread_mark: true,
        },
    ];

    assert_eq!(db.apply_updates(&batch).unwrap(), 4);
    assert_eq!(db.apply_updates(&batch).unwrap(), 4);

    assert_eq!(db.list_chats().unwrap().len(), 1);
    assert_eq!(db.list_messages(1, 10).unwrap().len(), 1);
    assert_eq!(db.list_reactions(1, 12).unwrap().len(), 1);
    assert!(db.get_dialog(1).unwrap().unwrap().unread_mark);
}

#[test]
fn updates_apply_in_order() {
    let db = store();
    let batch = vec![
        Update::NewMessage {
            message: message(1, 1, "first"),
        },
        Update::EditMessage {
            message: message(1, 1, "edited"),
        },
        Update::DeleteMessages {
            chat_id: 1,
            message_ids: vec![1],
        },
        Update::NewMessage {
            message: message(1, 2, "second"),
        },
    ];

    db.apply_updates(&batch).unwrap();

    let texts: Vec<String> = db
        .list_messages(1, 10)
        .unwrap()
        .into_iter()
        .filter_map(|m| m.text)
        .collect();
    assert_eq!(texts, vec!["second"]);
}

#[test]
fn delete_chat_removes_everything() {
    let db = store();
    db.apply_update(&Update::NewChat {
        chat: Chat::new(1, "general"),
    })
    .unwrap();
    db.upsert_message(&message(1, 1, "hi")).unwrap();
    db.upsert_reaction(&reaction(1, 1, "+1")).unwrap();

    db.apply_update(&Update::DeleteChat { chat_id: 1 }).unwrap();

    assert!(db.list_chats().unwrap().is_empty());
    assert!(db.get_dialog(1).unwrap().is_none());
    assert!(db.list_messages(1, 10).unwrap().is_empty());
    assert!(db.list_reactions(1, 1).unwrap().is_empty());
    assert!(!db.delete_chat(1).unwrap());
}

#[test]
fn delete_reaction_update() {
    let db = store();
    db.upsert_reaction(&reaction(1, 1, "+1")).unwrap();

    db.apply_update(&Update::DeleteReaction {
        chat_id: 1,
        message_id: 1,
        user_id: 1,
        emoji: "+1".into(),
    })
    .unwrap();

    assert!(db.list_reactions(1, 1).unwrap().is_empty());
}
