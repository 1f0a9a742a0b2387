// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! inl-core: Shared library for the inl chat client
//!
//! This crate provides the wire protocol, domain model, pushed update
//! types, message id generation, and the SQLite local store used by the
//! inl sync engine and CLI.

pub mod db;
pub mod error;
pub mod id;
pub mod jsonl;
pub mod model;
pub mod protocol;
pub mod store;
pub mod update;

pub use db::Database;
pub use error::{Error, Result};
pub use id::{random_id, temporary_message_id, ClockSource, MessageIdGenerator, SystemClock};
pub use model::{Chat, Dialog, Message, MessageStatus, Reaction};
pub use protocol::{ClientBody, ClientMessage, Method, RpcCall, RpcError, ServerBody, ServerMessage};
pub use store::LocalStore;
pub use update::Update;
