// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token storage seam: where the access/refresh pair and session flags live.
//!
//! The client only reads and overwrites tokens through [`TokenStore`]; it is
//! never the source of truth. Two implementations ship: [`MemoryStore`] for
//! process-local sessions and tests, and [`FileStore`] for sessions that
//! survive restarts (JSON file, atomic writes).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Flag cleared on every 401 (a device-lock marker set by the login flow).
pub const DEVICE_LOCK_FLAG: &str = "lock_device";

/// Storage contract for authentication artifacts.
///
/// `clear` wipes everything (tokens and flags) — the fail-closed teardown
/// used when a refresh cannot succeed.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn set_access_token(&self, token: &str);
    fn set_refresh_token(&self, token: &str);
    fn delete_access_token(&self);
    fn flag(&self, key: &str) -> Option<String>;
    fn set_flag(&self, key: &str, value: &str);
    fn remove_flag(&self, key: &str);
    fn clear(&self);
}

/// Session contents shared by both store implementations.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub flags: HashMap<String, String>,
}

// -- In-memory store -----------------------------------------------------

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<SessionData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    fn set_access_token(&self, token: &str) {
        self.state.write().access_token = Some(token.to_owned());
    }

    fn set_refresh_token(&self, token: &str) {
        self.state.write().refresh_token = Some(token.to_owned());
    }

    fn delete_access_token(&self) {
        self.state.write().access_token = None;
    }

    fn flag(&self, key: &str) -> Option<String> {
        self.state.read().flags.get(key).cloned()
    }

    fn set_flag(&self, key: &str, value: &str) {
        self.state.write().flags.insert(key.to_owned(), value.to_owned());
    }

    fn remove_flag(&self, key: &str) {
        self.state.write().flags.remove(key);
    }

    fn clear(&self) {
        *self.state.write() = SessionData::default();
    }
}

// -- File-backed store ---------------------------------------------------

/// JSON-file-backed store with atomic writes (tmp + rename).
///
/// Reads are served from an in-memory copy; every mutation is written back.
/// A failed write keeps the in-memory state and logs a warning, so a full
/// disk degrades to memory-only behavior instead of erroring every request.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: RwLock<SessionData>,
}

impl FileStore {
    /// Open a store at `path`, loading existing contents if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            SessionData::default()
        };
        Ok(Self { path, state: RwLock::new(state) })
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionData)) {
        let snapshot = {
            let mut state = self.state.write();
            f(&mut state);
            state.clone()
        };
        if let Err(e) = save(&self.path, &snapshot) {
            tracing::warn!(err = %e, path = %self.path.display(), "failed to persist session");
        }
    }
}

impl TokenStore for FileStore {
    fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    fn set_access_token(&self, token: &str) {
        self.mutate(|s| s.access_token = Some(token.to_owned()));
    }

    fn set_refresh_token(&self, token: &str) {
        self.mutate(|s| s.refresh_token = Some(token.to_owned()));
    }

    fn delete_access_token(&self) {
        self.mutate(|s| s.access_token = None);
    }

    fn flag(&self, key: &str) -> Option<String> {
        self.state.read().flags.get(key).cloned()
    }

    fn set_flag(&self, key: &str, value: &str) {
        self.mutate(|s| {
            s.flags.insert(key.to_owned(), value.to_owned());
        });
    }

    fn remove_flag(&self, key: &str) {
        self.mutate(|s| {
            s.flags.remove(key);
        });
    }

    fn clear(&self) {
        self.mutate(|s| *s = SessionData::default());
    }
}

/// Save session data to a JSON file atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) to avoid corruption when
/// concurrent saves race on the same `.tmp` file.
fn save(path: &Path, data: &SessionData) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let json = serde_json::to_string_pretty(data)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
