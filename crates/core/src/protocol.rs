// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! Every frame is a JSON text message with an envelope (`id`, plus `seq`
//! on client frames) and a `body` tagged by `type`:
//! - Client opens with `connection_init`, then sends RPC calls and pings
//! - Server answers `connection_open`, acknowledges calls, resolves them
//!   with a result or error, and pushes update batches

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::update::Update;

/// Remote method tag of an RPC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    SendMessage,
    EditMessage,
    DeleteMessages,
    AddReaction,
    DeleteReaction,
    MarkAsUnread,
    GetChats,
    GetChatHistory,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::SendMessage => "send_message",
            Method::EditMessage => "edit_message",
            Method::DeleteMessages => "delete_messages",
            Method::AddReaction => "add_reaction",
            Method::DeleteReaction => "delete_reaction",
            Method::MarkAsUnread => "mark_as_unread",
            Method::GetChats => "get_chats",
            Method::GetChatHistory => "get_chat_history",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "send_message" => Ok(Method::SendMessage),
            "edit_message" => Ok(Method::EditMessage),
            "delete_messages" => Ok(Method::DeleteMessages),
            "add_reaction" => Ok(Method::AddReaction),
            "delete_reaction" => Ok(Method::DeleteReaction),
            "mark_as_unread" => Ok(Method::MarkAsUnread),
            "get_chats" => Ok(Method::GetChats),
            "get_chat_history" => Ok(Method::GetChatHistory),
            _ => Err(Error::InvalidInput(format!("unknown method: '{s}'"))),
        }
    }
}

/// A remote procedure call: method tag plus opaque input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCall {
    pub method: Method,
    #[serde(default)]
    pub input: serde_json::Value,
}

impl RpcCall {
    pub fn new(method: Method, input: serde_json::Value) -> Self {
        RpcCall { method, input }
    }
}

/// Body of a client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientBody {
    /// First frame on every connection.
    ConnectionInit {
        token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_version: Option<String>,
    },

    /// An RPC call, correlated by the envelope id.
    RpcCall(RpcCall),

    /// Keepalive; the server echoes the nonce in a pong.
    Ping { nonce: u64 },
}

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Message id, unique within one connection.
    pub id: u64,
    /// Per-connection frame counter.
    pub seq: u32,
    pub body: ClientBody,
}

/// Error payload of a rejected RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub req_msg_id: u64,
    pub error_code: i32,
    #[serde(default)]
    pub message: String,
    /// HTTP-like status code, 0 when absent.
    #[serde(default)]
    pub code: i32,
}

/// Body of a server frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerBody {
    /// Handshake accepted.
    ConnectionOpen,

    /// Handshake rejected.
    ConnectionError {
        #[serde(default)]
        reason: String,
    },

    /// The server received the client message with this id.
    Ack { msg_id: u64 },

    /// Successful result of an RPC call.
    RpcResult {
        req_msg_id: u64,
        #[serde(default)]
        result: serde_json::Value,
    },

    /// Failed RPC call.
    RpcError(RpcError),

    /// Pushed change batch, applied in order.
    Updates { updates: Vec<Update> },

    /// Reply to a client ping.
    Pong { nonce: u64 },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(default)]
    pub id: u64,
    pub body: ServerBody,
}

impl ClientMessage {
    /// Creates a ConnectionInit message.
    pub fn connection_init(id: u64, seq: u32, token: impl Into<String>) -> Self {
        ClientMessage {
            id,
            seq,
            body: ClientBody::ConnectionInit {
                token: token.into(),
                client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
        }
    }

    /// Creates an RpcCall message.
    pub fn rpc_call(id: u64, seq: u32, call: RpcCall) -> Self {
        ClientMessage {
            id,
            seq,
            body: ClientBody::RpcCall(call),
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64, seq: u32, nonce: u64) -> Self {
        ClientMessage {
            id,
            seq,
            body: ClientBody::Ping { nonce },
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    pub fn new(id: u64, body: ServerBody) -> Self {
        ServerMessage { id, body }
    }

    /// Creates a ConnectionOpen message.
    pub fn connection_open() -> Self {
        ServerMessage::new(0, ServerBody::ConnectionOpen)
    }

    /// Creates a ConnectionError message.
    pub fn connection_error(reason: impl Into<String>) -> Self {
        ServerMessage::new(
            0,
            ServerBody::ConnectionError {
                reason: reason.into(),
            },
        )
    }

    /// Creates an Ack message.
    pub fn ack(msg_id: u64) -> Self {
        ServerMessage::new(0, ServerBody::Ack { msg_id })
    }

    /// Creates an RpcResult message.
    pub fn rpc_result(req_msg_id: u64, result: serde_json::Value) -> Self {
        ServerMessage::new(0, ServerBody::RpcResult { req_msg_id, result })
    }

    /// Creates an RpcError message.
    pub fn rpc_error(req_msg_id: u64, error_code: i32, message: impl Into<String>, code: i32) -> Self {
        ServerMessage::new(
            0,
            ServerBody::RpcError(RpcError {
                req_msg_id,
                error_code,
                message: message.into(),
                code,
            }),
        )
    }

    /// Creates an Updates message.
    pub fn updates(updates: Vec<Update>) -> Self {
        ServerMessage::new(0, ServerBody::Updates { updates })
    }

    /// Creates a Pong message.
    pub fn pong(nonce: u64) -> Self {
        ServerMessage::new(0, ServerBody::Pong { nonce })
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl RpcError {
    /// Returns the human label for a server error code.
    pub fn label(error_code: i32) -> &'static str {
        match error_code {
            1 => "Bad request",
            2 => "Not authenticated",
            3 => "Rate limited",
            4 => "Internal server error",
            5 => "Invalid peer (chat/user id)",
            6 => "Invalid message id",
            7 => "Invalid user id",
            8 => "User already in chat/space",
            9 => "Invalid space id",
            10 => "Invalid chat id",
            11 => "Invalid email address",
            12 => "Invalid phone number",
            13 => "Space admin required",
            14 => "Space owner required",
            _ => "Unknown RPC error",
        }
    }

    /// Renders the error for display, e.g. `Invalid chat id: no such chat (HTTP 404)`.
    pub fn friendly(&self) -> String {
        format_rpc_error(self.error_code, &self.message, self.code)
    }
}

/// Formats a server error from its parts. See [`RpcError::friendly`].
pub fn format_rpc_error(error_code: i32, message: &str, code: i32) -> String {
    let label = RpcError::label(error_code);
    let mut out = label.to_string();
    let message = message.trim();
    if !message.is_empty() && !message.eq_ignore_ascii_case(label) {
        out.push_str(": ");
        out.push_str(message);
    }
    if code != 0 {
        out.push_str(&format!(" (HTTP {code})"));
    }
    out
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.friendly())
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
