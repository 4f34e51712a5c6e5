// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::*;

fn jwt_with_exp(exp_secs: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD
        .encode(serde_json::json!({ "sub": "user-1", "exp": exp_secs }).to_string());
    format!("{header}.{payload}.sig")
}

// ── expiry claim extraction ───────────────────────────────────────────

#[test]
fn expiry_reads_exp_claim() {
    let token = jwt_with_exp(1_900_000_000);
    assert_eq!(expiry_epoch_secs(&token), Some(1_900_000_000));
}

#[yare::parameterized(
    not_a_jwt = { "not-a-jwt" },
    two_parts = { "aGVhZA.c2ln" },
    bad_base64 = { "head.!!!.sig" },
    payload_not_json = { "aGVhZA.aGVsbG8.c2ln" },
)]
fn expiry_is_none_for_garbage(token: &str) {
    assert_eq!(expiry_epoch_secs(token), None);
}

#[test]
fn expiry_is_none_without_exp_claim() {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"user-1"}"#);
    let token = format!("{header}.{payload}.");
    assert_eq!(expiry_epoch_secs(&token), None);
}

// ── expiry predicate ──────────────────────────────────────────────────

#[yare::parameterized(
    well_before = { 100, 50_000, false },
    one_ms_before = { 100, 99_999, false },
    exactly_at = { 100, 100_000, true },
    after = { 100, 100_001, true },
)]
fn is_expired_is_inclusive(exp_secs: u64, now_ms: u64, expected: bool) {
    let token = jwt_with_exp(exp_secs);
    assert_eq!(is_expired(&token, now_ms), expected);
}

#[test]
fn undecodable_token_counts_as_not_expired() {
    // The 401 path is the backstop for tokens we cannot inspect.
    assert!(!is_expired("opaque-token", u64::MAX));
}

#[test]
fn epoch_millis_is_sane() {
    // 2020-01-01 in milliseconds; anything earlier means a broken clock.
    assert!(epoch_millis() > 1_577_836_800_000);
}
