// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::DateTime;
use inl_core::{Chat, Dialog, Message, MessageStatus, Update};

use crate::sync::{ConnectionState, TransactionRecord};

/// Maximum line width for wrapped message text (excluding indent).
const WRAP_WIDTH: usize = 96;

/// Wrap text at word boundaries if it's a single line.
///
/// - If content contains newlines: return as-is (preserve user formatting)
/// - If content is single line >width: wrap at word boundaries
/// - If content is single line <=width: return as-is
pub fn wrap_text(content: &str, width: usize) -> String {
    if content.contains('\n') || content.len() <= width {
        return content.to_string();
    }

    let mut result = String::new();
    let mut current_line = String::new();

    for word in content.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&current_line);
    }

    result
}

/// Formats unix seconds as `YYYY-MM-DD HH:MM` (UTC).
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => secs.to_string(),
    }
}

/// Format a single chat line for list output.
///
/// ```text
/// - [4] General (3 unread, marked, pinned)
/// ```
pub fn format_chat_line(chat: &Chat, dialog: Option<&Dialog>) -> String {
    let mut flags = Vec::new();
    if let Some(dialog) = dialog {
        if dialog.unread_count > 0 {
            flags.push(format!("{} unread", dialog.unread_count));
        }
        if dialog.unread_mark {
            flags.push("marked".to_string());
        }
        if dialog.pinned {
            flags.push("pinned".to_string());
        }
    }
    if flags.is_empty() {
        format!("- [{}] {}", chat.id, chat.title)
    } else {
        format!("- [{}] {} ({})", chat.id, chat.title, flags.join(", "))
    }
}

/// Format a message with a metadata line and indented text.
///
/// ```text
///   #12 2026-10-16 10:30 from 7 (edited)
///     Text goes here, potentially
///     wrapped across multiple lines.
/// ```
pub fn format_message(message: &Message) -> Vec<String> {
    let mut header = format!(
        "  #{} {} from {}",
        message.message_id,
        format_timestamp(message.date),
        message.from_id
    );
    if message.edit_date.is_some() {
        header.push_str(" (edited)");
    }
    if message.status != MessageStatus::Sent {
        header.push_str(&format!(" [{}]", message.status));
    }

    let mut lines = vec![header];
    if let Some(text) = &message.text {
        for line in wrap_text(text, WRAP_WIDTH).lines() {
            lines.push(format!("    {}", line));
        }
    }
    lines
}

/// Format a persisted transaction for `inl pending`.
pub fn format_pending(record: &TransactionRecord) -> String {
    format!(
        "{} {} {}",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M:%S"),
        record.operation.summary()
    )
}

/// Format a connection state change.
pub fn format_state(state: ConnectionState) -> String {
    format!("* {}", state)
}

/// Format one pushed update.
pub fn format_update(update: &Update) -> String {
    let detail = match update {
        Update::NewMessage { message } | Update::EditMessage { message } => format!(
            "#{}: {}",
            message.message_id,
            message.text.as_deref().unwrap_or("")
        ),
        Update::DeleteMessages { message_ids, .. } => {
            let ids: Vec<String> = message_ids.iter().map(|id| format!("#{}", id)).collect();
            ids.join(" ")
        }
        Update::UpdateReaction { reaction } => {
            format!("#{} {} by {}", reaction.message_id, reaction.emoji, reaction.user_id)
        }
        Update::DeleteReaction {
            message_id,
            user_id,
            emoji,
            ..
        } => format!("#{} {} by {}", message_id, emoji, user_id),
        Update::MarkAsUnread { unread_mark, .. } => format!("unread_mark={}", unread_mark),
        Update::NewChat { chat } => chat.title.clone(),
        Update::DeleteChat { .. } => String::new(),
    };
    let line = format!("{} chat {}", update.kind(), update.chat_id());
    if detail.is_empty() {
        line
    } else {
        format!("{} {}", line, detail)
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
