// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::time::Duration;

use crate::display::{format_chat_line, format_message};
use crate::error::Result;
use crate::ops::{GetChatHistory, GetChats};
use crate::sync::SyncEngine;

use super::{submit_and_wait, with_engine, Context};

pub async fn list(ctx: &Context) -> Result<()> {
    with_engine!(ctx, |engine| list_impl(&engine, ctx.timeout))
}

/// Fetches chats, then prints them from the local store.
pub(crate) async fn list_impl(engine: &SyncEngine, timeout: Duration) -> Result<()> {
    submit_and_wait(engine, GetChats::default(), timeout).await?;

    let store = engine.store();
    let chats = store.list_chats()?;
    if chats.is_empty() {
        println!("No chats");
        return Ok(());
    }
    let dialogs: HashMap<i64, _> = store
        .list_dialogs()?
        .into_iter()
        .map(|d| (d.chat_id, d))
        .collect();
    for chat in &chats {
        println!("{}", format_chat_line(chat, dialogs.get(&chat.id)));
    }
    Ok(())
}

pub async fn history(ctx: &Context, chat: i64, limit: u32) -> Result<()> {
    with_engine!(ctx, |engine| history_impl(&engine, chat, limit, ctx.timeout))
}

/// Fetches recent history, then prints it oldest first.
pub(crate) async fn history_impl(
    engine: &SyncEngine,
    chat: i64,
    limit: u32,
    timeout: Duration,
) -> Result<()> {
    submit_and_wait(engine, GetChatHistory::new(chat, limit), timeout).await?;

    let store = engine.store();
    let chat_row = store.get_chat(chat).ok();
    let messages = store.list_messages(chat, limit as usize)?;
    match chat_row {
        Some(c) => println!("[{}] {}", c.id, c.title),
        None => println!("[{}]", chat),
    }
    if messages.is_empty() {
        println!("  No messages");
        return Ok(());
    }
    for message in messages.iter().rev() {
        for line in format_message(message) {
            println!("{}", line);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "chats_tests.rs"]
mod tests;
