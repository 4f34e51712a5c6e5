// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default path of the token refresh endpoint, relative to the base URL.
pub const DEFAULT_REFRESH_PATH: &str = "/api/general/auth/refresh-token";

/// Default path fragment identifying the login request (never refreshed).
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default bound on how long a queued request waits for an in-flight
/// refresh: the request timeout plus headroom, so a waiter outlives a slow
/// leader but never hangs.
const DEFAULT_REFRESH_WAIT_MS: u64 = 15_000;

/// Whether the client manages tokens on the way in and out.
///
/// - `Managed`: stamp bearer tokens, refresh on expiry, retry once on 401.
/// - `Passthrough`: send requests untouched (the server-render analogue of
///   running without cookies).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Managed,
    Passthrough,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Managed => f.write_str("managed"),
            Self::Passthrough => f.write_str("passthrough"),
        }
    }
}

impl std::str::FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "managed" => Ok(Self::Managed),
            "passthrough" => Ok(Self::Passthrough),
            other => anyhow::bail!("invalid auth mode: {other}"),
        }
    }
}

/// Client configuration, passed explicitly at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://api.example.com`.
    pub base_url: String,

    /// Path of the refresh endpoint, relative to `base_url`.
    pub refresh_path: String,

    /// Path fragment identifying login requests. A request whose path
    /// contains this fragment is never refreshed; its 401s pass through.
    pub login_path: String,

    /// Token interception mode.
    pub auth_mode: AuthMode,

    /// Per-request timeout in milliseconds (also bounds the refresh call).
    pub request_timeout_ms: u64,

    /// How long a queued request waits for an in-flight refresh, in
    /// milliseconds.
    pub refresh_wait_ms: u64,
}

fn env_u64(var: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(var) {
        Ok(raw) => {
            raw.parse().map_err(|_| anyhow::anyhow!("{var} must be an integer, got {raw:?}"))
        }
        Err(_) => Ok(default),
    }
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_path: DEFAULT_REFRESH_PATH.to_owned(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            auth_mode: AuthMode::Managed,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            refresh_wait_ms: DEFAULT_REFRESH_WAIT_MS,
        }
    }

    /// Resolve configuration from the environment.
    ///
    /// `TOLLGATE_BASE_URL` is required; `TOLLGATE_REFRESH_PATH`,
    /// `TOLLGATE_LOGIN_PATH`, `TOLLGATE_AUTH_MODE`,
    /// `TOLLGATE_REQUEST_TIMEOUT_MS` and `TOLLGATE_REFRESH_WAIT_MS` override
    /// their defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let Ok(base_url) = std::env::var("TOLLGATE_BASE_URL") else {
            anyhow::bail!("TOLLGATE_BASE_URL is not set");
        };
        let mut config = Self::new(base_url);
        if let Ok(path) = std::env::var("TOLLGATE_REFRESH_PATH") {
            config.refresh_path = path;
        }
        if let Ok(path) = std::env::var("TOLLGATE_LOGIN_PATH") {
            config.login_path = path;
        }
        if let Ok(mode) = std::env::var("TOLLGATE_AUTH_MODE") {
            config.auth_mode = mode.parse()?;
        }
        config.request_timeout_ms =
            env_u64("TOLLGATE_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        config.refresh_wait_ms = env_u64("TOLLGATE_REFRESH_WAIT_MS", DEFAULT_REFRESH_WAIT_MS)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration after construction.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }
        if self.base_url.ends_with('/') {
            anyhow::bail!("base_url must not end with a slash (paths start with one)");
        }
        if !self.refresh_path.starts_with('/') {
            anyhow::bail!("refresh_path must start with a slash");
        }
        if self.login_path.is_empty() {
            anyhow::bail!("login_path must not be empty");
        }
        if self.request_timeout_ms == 0 {
            anyhow::bail!("request_timeout_ms must be non-zero");
        }
        if self.refresh_wait_ms == 0 {
            anyhow::bail!("refresh_wait_ms must be non-zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_wait(&self) -> Duration {
        Duration::from_millis(self.refresh_wait_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
