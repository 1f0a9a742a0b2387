// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use crate::error::Result;
use crate::ops::MarkAsUnread;
use crate::sync::SyncEngine;

use super::{submit_and_wait, with_engine, Context};

pub async fn mark_unread(ctx: &Context, chat: i64, clear: bool) -> Result<()> {
    with_engine!(ctx, |engine| mark_unread_impl(&engine, chat, clear, ctx.timeout))
}

pub(crate) async fn mark_unread_impl(
    engine: &SyncEngine,
    chat: i64,
    clear: bool,
    timeout: Duration,
) -> Result<()> {
    let op = if clear {
        MarkAsUnread::clear(chat)
    } else {
        MarkAsUnread::new(chat)
    };
    submit_and_wait(engine, op, timeout).await?;
    if clear {
        println!("Cleared unread mark on chat {}", chat);
    } else {
        println!("Marked chat {} as unread", chat);
    }
    Ok(())
}

#[cfg(test)]
#[path = "dialogs_tests.rs"]
mod tests;
