// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── MemoryStore ───────────────────────────────────────────────────────

#[test]
fn memory_store_round_trips_tokens() {
    let store = MemoryStore::new();
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);

    store.set_access_token("acc-1");
    store.set_refresh_token("ref-1");
    assert_eq!(store.access_token().as_deref(), Some("acc-1"));
    assert_eq!(store.refresh_token().as_deref(), Some("ref-1"));

    store.delete_access_token();
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token().as_deref(), Some("ref-1"));
}

#[test]
fn memory_store_flags() {
    let store = MemoryStore::new();
    assert_eq!(store.flag(DEVICE_LOCK_FLAG), None);
    store.set_flag(DEVICE_LOCK_FLAG, "1");
    assert_eq!(store.flag(DEVICE_LOCK_FLAG).as_deref(), Some("1"));
    store.remove_flag(DEVICE_LOCK_FLAG);
    assert_eq!(store.flag(DEVICE_LOCK_FLAG), None);
}

#[test]
fn memory_store_clear_wipes_everything() {
    let store = MemoryStore::new();
    store.set_access_token("acc");
    store.set_refresh_token("ref");
    store.set_flag("lock_device", "1");
    store.clear();
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    assert_eq!(store.flag("lock_device"), None);
}

// ── FileStore ─────────────────────────────────────────────────────────

#[test]
fn file_store_persists_across_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");

    {
        let store = FileStore::open(&path)?;
        store.set_access_token("acc-1");
        store.set_refresh_token("ref-1");
        store.set_flag("lock_device", "1");
    }

    let reopened = FileStore::open(&path)?;
    assert_eq!(reopened.access_token().as_deref(), Some("acc-1"));
    assert_eq!(reopened.refresh_token().as_deref(), Some("ref-1"));
    assert_eq!(reopened.flag("lock_device").as_deref(), Some("1"));
    Ok(())
}

#[test]
fn file_store_open_on_missing_file_starts_empty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::open(dir.path().join("session.json"))?;
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    Ok(())
}

#[test]
fn file_store_open_rejects_corrupt_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json")?;
    assert!(FileStore::open(&path).is_err());
    Ok(())
}

#[test]
fn file_store_clear_persists_the_wipe() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");

    let store = FileStore::open(&path)?;
    store.set_access_token("acc-1");
    store.clear();
    drop(store);

    let reopened = FileStore::open(&path)?;
    assert_eq!(reopened.access_token(), None);
    Ok(())
}

#[test]
fn file_store_leaves_no_tmp_files_behind() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");

    let store = FileStore::open(&path)?;
    store.set_access_token("acc-1");
    store.set_refresh_token("ref-1");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "stray tmp files: {leftovers:?}");
    Ok(())
}

#[test]
fn session_data_serializes_compactly() -> anyhow::Result<()> {
    // Empty optional fields stay out of the file.
    let json = serde_json::to_string(&SessionData::default())?;
    assert_eq!(json, "{}");
    Ok(())
}
