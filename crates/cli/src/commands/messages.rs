// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use crate::error::Result;
use crate::ops::{DeleteMessages, EditMessage, SendMessage};
use crate::sync::SyncEngine;

use super::{submit_and_wait, with_engine, Context};

pub async fn send(ctx: &Context, chat: i64, text: String) -> Result<()> {
    let user_id = ctx.config.user_id;
    with_engine!(ctx, |engine| send_impl(&engine, user_id, chat, text, ctx.timeout))
}

/// Internal implementation that accepts an engine for testing.
pub(crate) async fn send_impl(
    engine: &SyncEngine,
    user_id: i64,
    chat: i64,
    text: String,
    timeout: Duration,
) -> Result<()> {
    let op = SendMessage::new(chat, text).from_user(user_id);
    let random_id = op.random_id;
    submit_and_wait(engine, op, timeout).await?;

    match engine.store().find_message_by_random_id(chat, random_id)? {
        Some(message) if !message.is_temporary() => {
            println!("Sent message {} to chat {}", message.message_id, chat);
        }
        _ => println!("Sent message to chat {}", chat),
    }
    Ok(())
}

pub async fn edit(ctx: &Context, chat: i64, message: i64, text: String) -> Result<()> {
    with_engine!(ctx, |engine| edit_impl(&engine, chat, message, text, ctx.timeout))
}

pub(crate) async fn edit_impl(
    engine: &SyncEngine,
    chat: i64,
    message: i64,
    text: String,
    timeout: Duration,
) -> Result<()> {
    submit_and_wait(engine, EditMessage::new(chat, message, text), timeout).await?;
    println!("Edited message {} in chat {}", message, chat);
    Ok(())
}

pub async fn delete(ctx: &Context, chat: i64, messages: Vec<i64>) -> Result<()> {
    with_engine!(ctx, |engine| delete_impl(&engine, chat, messages, ctx.timeout))
}

pub(crate) async fn delete_impl(
    engine: &SyncEngine,
    chat: i64,
    messages: Vec<i64>,
    timeout: Duration,
) -> Result<()> {
    let count = messages.len();
    submit_and_wait(engine, DeleteMessages::new(chat, messages), timeout).await?;
    println!("Deleted {} message(s) in chat {}", count, chat);
    Ok(())
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
