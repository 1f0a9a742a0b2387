// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use crate::model::Chat;
use serde_json::json;
use yare::parameterized;

#[test]
fn rpc_call_json_format() {
    let msg = ClientMessage::rpc_call(
        42,
        3,
        RpcCall::new(Method::SendMessage, json!({"chat_id": 1, "text": "hi"})),
    );
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(value["id"], 42);
    assert_eq!(value["seq"], 3);
    assert_eq!(value["body"]["type"], "rpc_call");
    assert_eq!(value["body"]["method"], "send_message");
    assert_eq!(value["body"]["input"]["text"], "hi");
}

#[test]
fn connection_init_carries_version() {
    let msg = ClientMessage::connection_init(1, 1, "secret");
    let json = msg.to_json().unwrap();
    assert!(json.contains("\"type\":\"connection_init\""));
    assert!(json.contains("\"token\":\"secret\""));
    assert!(json.contains("client_version"));
}

#[test]
fn client_message_parses_back() {
    let msg = ClientMessage::ping(9, 2, 77);
    let parsed = ClientMessage::from_json(&msg.to_json().unwrap()).unwrap();
    assert_eq!(parsed.body, ClientBody::Ping { nonce: 77 });
    assert_eq!(parsed.id, 9);
}

#[parameterized(
    open = { r#"{"id":1,"body":{"type":"connection_open"}}"#, ServerBody::ConnectionOpen },
    ack = { r#"{"id":2,"body":{"type":"ack","msg_id":7}}"#, ServerBody::Ack { msg_id: 7 } },
    pong = { r#"{"id":3,"body":{"type":"pong","nonce":5}}"#, ServerBody::Pong { nonce: 5 } },
    conn_error = { r#"{"body":{"type":"connection_error","reason":"bad token"}}"#, ServerBody::ConnectionError { reason: "bad token".into() } },
)]
fn server_message_parse(json: &str, expected: ServerBody) {
    let msg = ServerMessage::from_json(json).unwrap();
    assert_eq!(msg.body, expected);
}

#[test]
fn server_rpc_error_parse() {
    let json = r#"{"id":4,"body":{"type":"rpc_error","req_msg_id":7,"error_code":10,"message":"no such chat","code":404}}"#;
    let msg = ServerMessage::from_json(json).unwrap();
    let ServerBody::RpcError(err) = msg.body else {
        panic!("expected rpc_error");
    };
    assert_eq!(err.req_msg_id, 7);
    assert_eq!(err.error_code, 10);
}

#[test]
fn server_updates_parse() {
    let msg = ServerMessage::updates(vec![Update::NewChat {
        chat: Chat::new(1, "general"),
    }]);
    let parsed = ServerMessage::from_json(&msg.to_json().unwrap()).unwrap();
    assert_eq!(parsed, msg);
}

#[test]
fn rpc_result_without_payload_defaults_to_null() {
    let msg = ServerMessage::from_json(r#"{"body":{"type":"rpc_result","req_msg_id":1}}"#).unwrap();
    assert_eq!(
        msg.body,
        ServerBody::RpcResult {
            req_msg_id: 1,
            result: serde_json::Value::Null
        }
    );
}

#[test]
fn unknown_server_type_is_rejected() {
    assert!(ServerMessage::from_json(r#"{"body":{"type":"bogus"}}"#).is_err());
}

#[parameterized(
    send_message = { "send_message", Method::SendMessage },
    delete_messages = { "delete_messages", Method::DeleteMessages },
    mark_as_unread = { "mark_as_unread", Method::MarkAsUnread },
    get_chat_history = { "get_chat_history", Method::GetChatHistory },
)]
fn method_parse_and_display(s: &str, expected: Method) {
    let method: Method = s.parse().unwrap();
    assert_eq!(method, expected);
    assert_eq!(method.to_string(), s);
}

#[test]
fn method_parse_unknown() {
    assert!("fly".parse::<Method>().is_err());
}

fn rpc_error(error_code: i32, message: &str, code: i32) -> RpcError {
    RpcError {
        req_msg_id: 1,
        error_code,
        message: message.to_string(),
        code,
    }
}

#[parameterized(
    label_only = { 1, "", 0, "Bad request" },
    same_message = { 2, "not authenticated", 0, "Not authenticated" },
    with_message = { 10, "no such chat", 0, "Invalid chat id: no such chat" },
    with_http = { 3, "", 429, "Rate limited (HTTP 429)" },
    full = { 5, "peer missing", 400, "Invalid peer (chat/user id): peer missing (HTTP 400)" },
    owner = { 14, "", 0, "Space owner required" },
    unknown = { 99, "boom", 0, "Unknown RPC error: boom" },
)]
fn rpc_error_friendly(error_code: i32, message: &str, code: i32, expected: &str) {
    assert_eq!(rpc_error(error_code, message, code).friendly(), expected);
}
