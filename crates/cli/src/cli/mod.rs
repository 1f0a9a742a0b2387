// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::ops::DEFAULT_HISTORY_LIMIT;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser)]
#[command(name = "inl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first command-line chat client")]
#[command(
    long_about = "Offline-first command-line chat client.\n\n\
    Changes are applied to the local store immediately and synced over the realtime \
    connection. Durable work that cannot be sent yet is kept and retried on the next run."
)]
pub struct Cli {
    /// Directory holding config.toml, store.db and the transaction journal
    #[arg(long, global = true, value_name = "path")]
    pub data_dir: Option<PathBuf>,

    /// Log debug output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "path")]
    pub log_file: Option<PathBuf>,

    /// Seconds to wait for the server's answer
    #[arg(long, global = true, default_value_t = 30, value_name = "secs")]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────
    /// Send a message to a chat
    #[command(after_help = "\
Examples:
  inl send 4 \"hello\"          Send a message to chat 4")]
    Send {
        /// Chat id
        chat: i64,

        /// Message text
        #[arg(value_parser = non_empty_string)]
        text: String,
    },

    /// Replace the text of a message
    Edit {
        /// Chat id
        chat: i64,

        /// Message id
        message: i64,

        /// New text
        #[arg(value_parser = non_empty_string)]
        text: String,
    },

    /// Delete message(s)
    #[command(arg_required_else_help = true)]
    Delete {
        /// Chat id
        chat: i64,

        /// Message id(s)
        #[arg(required = true)]
        messages: Vec<i64>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Reactions
    // ─────────────────────────────────────────────────────────────────────────
    /// Add a reaction to a message
    React {
        /// Chat id
        chat: i64,

        /// Message id
        message: i64,

        /// Emoji
        #[arg(value_parser = non_empty_string)]
        emoji: String,
    },

    /// Remove your reaction from a message
    Unreact {
        /// Chat id
        chat: i64,

        /// Message id
        message: i64,

        /// Emoji
        #[arg(value_parser = non_empty_string)]
        emoji: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Chats
    // ─────────────────────────────────────────────────────────────────────────
    /// Mark a chat as unread
    MarkUnread {
        /// Chat id
        chat: i64,

        /// Clear the mark instead of setting it
        #[arg(long)]
        clear: bool,
    },

    /// Fetch and list chats
    Chats,

    /// Fetch and show recent messages of a chat
    #[command(after_help = "\
Examples:
  inl history 4                Show the last 50 messages of chat 4
  inl history 4 -n 10          Show the last 10 messages")]
    History {
        /// Chat id
        chat: i64,

        /// Number of messages to fetch
        #[arg(long, short = 'n', default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────
    /// Stay connected and print connection changes and pushed updates
    Watch,

    /// List transactions waiting in the journal (works offline)
    Pending,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
