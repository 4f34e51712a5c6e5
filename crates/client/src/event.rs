// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle events broadcast by the client.
//!
//! `SessionInvalidated` is the signal embedders act on (drop to the login
//! screen); it replaces the hard page reload a browser client would do.

use serde::{Deserialize, Serialize};

/// Events emitted on the client's broadcast channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    /// A refresh completed and the new access token is in the store.
    Refreshed { access_token: String },
    /// A refresh attempt failed (diagnostic; teardown follows separately).
    RefreshFailed { error: String },
    /// Local session state was wiped; the user must authenticate again.
    SessionInvalidated { reason: String },
}
