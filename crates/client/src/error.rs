// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the client: transport faults, HTTP status errors, and
//! the refresh/session failure modes that force re-authentication.

use std::fmt;

/// Errors surfaced by [`ApiClient`](crate::client::ApiClient) operations.
#[derive(Debug)]
pub enum ApiError {
    /// Non-success status passed through unchanged (including a 401 on the
    /// login path and a 401 that survived the single retry).
    Status { status: u16, message: String },
    /// Local session state was torn down; the caller must re-authenticate.
    SessionExpired { reason: String },
    /// The refresh call was rejected or could not complete.
    RefreshFailed { reason: String },
    /// A queued request outlived the configured refresh wait.
    RefreshTimeout,
    /// The client was shut down while the request was waiting.
    Shutdown,
    /// The request could not be sent or the response body could not be read.
    Transport(reqwest::Error),
    /// The response body did not match the expected shape.
    Decode(serde_json::Error),
    /// Configuration rejected at construction.
    InvalidConfig(String),
}

impl ApiError {
    /// HTTP status carried by this error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the server answered 401 and the client did not recover.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Stable code for logging and event payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "STATUS",
            Self::SessionExpired { .. } => "SESSION_EXPIRED",
            Self::RefreshFailed { .. } => "REFRESH_FAILED",
            Self::RefreshTimeout => "REFRESH_TIMEOUT",
            Self::Shutdown => "SHUTDOWN",
            Self::Transport(_) => "TRANSPORT",
            Self::Decode(_) => "DECODE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, message } => write!(f, "request failed ({status}): {message}"),
            Self::SessionExpired { reason } => write!(f, "session expired: {reason}"),
            Self::RefreshFailed { reason } => write!(f, "token refresh failed: {reason}"),
            Self::RefreshTimeout => f.write_str("timed out waiting for token refresh"),
            Self::Shutdown => f.write_str("client shut down"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Decode(e) => write!(f, "response decode error: {e}"),
            Self::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Tries the common shapes (`{"message": …}`, `{"error": {"message": …}}`,
/// `{"error": "…"}`) and falls back to the raw body text.
pub fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
            return msg.to_owned();
        }
        if let Some(err) = value.get("error") {
            if let Some(msg) = err.get("message").and_then(|m| m.as_str()) {
                return msg.to_owned();
            }
            if let Some(msg) = err.as_str() {
                return msg.to_owned();
            }
        }
    }
    body.trim().to_owned()
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
