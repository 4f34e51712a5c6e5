// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── accessors ─────────────────────────────────────────────────────────

#[test]
fn status_error_exposes_status() {
    let err = ApiError::Status { status: 404, message: "not found".to_owned() };
    assert_eq!(err.status(), Some(404));
    assert!(!err.is_unauthorized());
    assert_eq!(err.kind(), "STATUS");
}

#[test]
fn unauthorized_detected_from_status() {
    let err = ApiError::Status { status: 401, message: "nope".to_owned() };
    assert!(err.is_unauthorized());
}

#[test]
fn non_status_errors_have_no_status() {
    assert_eq!(ApiError::RefreshTimeout.status(), None);
    assert_eq!(ApiError::Shutdown.status(), None);
    assert_eq!(ApiError::SessionExpired { reason: "x".to_owned() }.status(), None);
}

#[test]
fn kinds_are_distinct_and_stable() {
    assert_eq!(ApiError::RefreshTimeout.kind(), "REFRESH_TIMEOUT");
    assert_eq!(ApiError::Shutdown.kind(), "SHUTDOWN");
    assert_eq!(ApiError::RefreshFailed { reason: "x".to_owned() }.kind(), "REFRESH_FAILED");
    assert_eq!(ApiError::InvalidConfig("x".to_owned()).kind(), "INVALID_CONFIG");
}

#[test]
fn display_carries_status_and_message() {
    let err = ApiError::Status { status: 503, message: "overloaded".to_owned() };
    assert_eq!(err.to_string(), "request failed (503): overloaded");
}

#[test]
fn decode_error_has_source() {
    use std::error::Error;
    let inner = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err = ApiError::Decode(inner);
    assert!(err.source().is_some());
}

// ── error body message extraction ─────────────────────────────────────

#[yare::parameterized(
    top_level_message = { r#"{"message":"token expired"}"#, "token expired" },
    nested_error_message = { r#"{"error":{"message":"bad key"}}"#, "bad key" },
    error_string = { r#"{"error":"denied"}"#, "denied" },
    plain_text = { "  service unavailable  ", "service unavailable" },
    empty_body = { "", "" },
)]
fn extract_message_handles_common_shapes(body: &str, expected: &str) {
    assert_eq!(extract_message(body), expected);
}

#[test]
fn extract_message_falls_back_to_raw_json() {
    let body = r#"{"code":42}"#;
    assert_eq!(extract_message(body), body);
}
