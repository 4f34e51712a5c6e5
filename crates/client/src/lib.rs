// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tollgate: bearer-auth HTTP client with single-flight token refresh.
//!
//! The client stamps `Authorization: Bearer <access>` on outgoing
//! requests, refreshes expired access tokens through a single-flight gate
//! (one network refresh no matter how many requests hit expiry at once),
//! retries a 401'd request once with the new token, and tears down local
//! session state when a refresh cannot succeed.

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod refresh;
pub mod singleflight;
pub mod store;
pub mod token;

pub use client::{shared, ApiClient};
pub use config::{AuthMode, ClientConfig};
pub use error::ApiError;
pub use event::AuthEvent;
pub use store::{FileStore, MemoryStore, TokenStore, DEVICE_LOCK_FLAG};
