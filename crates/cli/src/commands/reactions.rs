// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use crate::error::Result;
use crate::ops::{AddReaction, DeleteReaction};
use crate::sync::SyncEngine;

use super::{submit_and_wait, with_engine, Context};

pub async fn react(ctx: &Context, chat: i64, message: i64, emoji: String) -> Result<()> {
    let user_id = ctx.config.user_id;
    with_engine!(ctx, |engine| react_impl(&engine, user_id, chat, message, emoji, ctx.timeout))
}

pub(crate) async fn react_impl(
    engine: &SyncEngine,
    user_id: i64,
    chat: i64,
    message: i64,
    emoji: String,
    timeout: Duration,
) -> Result<()> {
    let op = AddReaction::new(chat, message, user_id, emoji.clone());
    submit_and_wait(engine, op, timeout).await?;
    println!("Reacted {} to message {}", emoji, message);
    Ok(())
}

pub async fn unreact(ctx: &Context, chat: i64, message: i64, emoji: String) -> Result<()> {
    let user_id = ctx.config.user_id;
    with_engine!(ctx, |engine| unreact_impl(&engine, user_id, chat, message, emoji, ctx.timeout))
}

pub(crate) async fn unreact_impl(
    engine: &SyncEngine,
    user_id: i64,
    chat: i64,
    message: i64,
    emoji: String,
    timeout: Duration,
) -> Result<()> {
    let op = DeleteReaction::new(chat, message, user_id, emoji.clone());
    submit_and_wait(engine, op, timeout).await?;
    println!("Removed {} from message {}", emoji, message);
    Ok(())
}

#[cfg(test)]
#[path = "reactions_tests.rs"]
mod tests;
