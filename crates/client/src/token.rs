// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token material: the access/refresh pair and the unverified JWT expiry
//! check used to decide whether a request needs a refresh before send.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// An access token plus the refresh token that can renew it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    /// Absent when the refresh endpoint did not rotate the refresh token.
    pub refresh_token: Option<String>,
}

/// Current time as milliseconds since the epoch.
pub fn epoch_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Extract the `exp` claim (epoch seconds) from a JWT without verifying it.
///
/// Returns `None` for anything that is not a decodable three-part JWT with a
/// numeric `exp`.
pub fn expiry_epoch_secs(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_u64()
}

/// Whether the access token is expired at `now_ms`.
///
/// Expiry is inclusive (`now >= exp`). A token without a readable `exp`
/// claim is treated as not expired; a stale one is caught by the 401 path.
pub fn is_expired(token: &str, now_ms: u64) -> bool {
    match expiry_epoch_secs(token) {
        Some(exp) => now_ms >= exp.saturating_mul(1000),
        None => false,
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
