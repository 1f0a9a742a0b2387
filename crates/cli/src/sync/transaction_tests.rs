// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for transaction records and errors.

#![allow(clippy::unwrap_used)]

use super::test_helpers::{record, send_op};
use super::transaction::{TransactionError, TransactionId, TransactionKind, TransactionRecord};
use inl_core::protocol::RpcError;
use yare::parameterized;

#[test]
fn test_transaction_ids_are_unique() {
    assert_ne!(TransactionId::new(), TransactionId::new());
}

#[test]
fn test_record_serde_roundtrip() {
    let rec = record(send_op(3, "hi", 77));
    let json = serde_json::to_string(&rec).unwrap();
    assert!(json.contains("\"method\":\"send_message\""));

    let back: TransactionRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rec);
}

#[test]
fn test_id_serializes_as_plain_string() {
    let id = TransactionId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id));
}

#[parameterized(
    query = { TransactionKind::Query, false, false },
    transient = { TransactionKind::Mutation { durable: false, retry_after_ack: true }, false, true },
    durable_no_retry = { TransactionKind::Mutation { durable: true, retry_after_ack: false }, true, false },
)]
fn test_kind_flags(kind: TransactionKind, durable: bool, retry: bool) {
    assert_eq!(kind.is_durable(), durable);
    assert_eq!(kind.retry_after_ack(), retry);
}

#[test]
fn test_remote_rejected_from_rpc_error() {
    let err = TransactionError::from(RpcError {
        req_msg_id: 9,
        error_code: 3,
        message: "chat is gone".to_string(),
        code: 404,
    });
    assert_eq!(
        err,
        TransactionError::RemoteRejected {
            code: 404,
            error_code: 3,
            message: "chat is gone".to_string(),
        }
    );
    assert!(err.to_string().contains("chat is gone"));
    assert!(err.to_string().contains("404"));
}

#[parameterized(
    not_connected = { TransactionError::NotConnected, "not connected" },
    timeout = { TransactionError::Timeout, "timed out" },
    ambiguous = { TransactionError::AmbiguousOutcome, "outcome unknown" },
    cancelled = { TransactionError::Cancelled, "cancelled" },
    shutdown = { TransactionError::Shutdown, "shut down" },
)]
fn test_error_display(err: TransactionError, needle: &str) {
    assert!(err.to_string().contains(needle), "{}", err);
}
