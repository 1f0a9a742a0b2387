// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! inlrs - Offline-first chat client library.
//!
//! This crate provides the sync engine and the command handlers behind the
//! `inl` CLI. Operations are applied to a local SQLite store right away,
//! queued, and sent over a reconnecting WebSocket session; durable ones
//! survive restarts in a JSONL journal.
//!
//! # Main Components
//!
//! - [`SyncEngine`](sync::SyncEngine) - Queue, connection and store coordination
//! - [`ops`] - Typed operations ([`SendMessage`](ops::SendMessage), [`GetChats`](ops::GetChats), etc.)
//! - [`Config`] - Client configuration (`config.toml` plus environment)
//! - [`Error`] - Error types for all commands
//!
//! # Embedding
//!
//! ```rust,ignore
//! use inlrs::ops::SendMessage;
//! use inlrs::sync::{JournalStore, SyncEngine, WebSocketFactory};
//!
//! let engine = SyncEngine::open(config.engine(), Arc::new(WebSocketFactory), store, Box::new(journal))?;
//! engine.start();
//! engine.submit(SendMessage::new(4, "hello")).await?;
//! engine.shutdown().await;
//! ```

mod cli;
mod commands;
mod display;
pub mod env;

pub mod config;
pub mod error;
pub mod ops;
pub mod sync;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{Error, Result};

use commands::Context;

/// Runs a parsed command line to completion on a fresh tokio runtime.
pub fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.data_dir.as_deref(), cli.timeout)?;
    tracing::debug!(data_dir = %ctx.data_dir.display(), "loaded config");

    match cli.command {
        Command::Send { chat, text } => commands::messages::send(&ctx, chat, text).await,
        Command::Edit {
            chat,
            message,
            text,
        } => commands::messages::edit(&ctx, chat, message, text).await,
        Command::Delete { chat, messages } => {
            commands::messages::delete(&ctx, chat, messages).await
        }
        Command::React {
            chat,
            message,
            emoji,
        } => commands::reactions::react(&ctx, chat, message, emoji).await,
        Command::Unreact {
            chat,
            message,
            emoji,
        } => commands::reactions::unreact(&ctx, chat, message, emoji).await,
        Command::MarkUnread { chat, clear } => {
            commands::dialogs::mark_unread(&ctx, chat, clear).await
        }
        Command::Chats => commands::chats::list(&ctx).await,
        Command::History { chat, limit } => commands::chats::history(&ctx, chat, limit).await,
        Command::Watch => commands::watch::run(&ctx).await,
        Command::Pending => commands::pending::run(&ctx),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
