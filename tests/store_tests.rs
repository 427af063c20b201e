// Integration tests for the local store and the startup session step

use agrogpt_client::store::{CREDENTIAL_KEY, SESSION_ID_KEY};
use agrogpt_client::{load_session_config, Language, LocalStore};
use anyhow::Result;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_missing_store_starts_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = LocalStore::open(temp_dir.path().join("store.json"))?;

    assert_eq!(store.get(CREDENTIAL_KEY), None);
    assert!(!store.path().exists(), "Opening must not create the file");

    Ok(())
}

#[test]
fn test_persist_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("nested").join("store.json");

    let mut store = LocalStore::open(&path)?;
    store.persist(CREDENTIAL_KEY, "abc123")?;
    store.persist(CREDENTIAL_KEY, "def456")?;

    let reopened = LocalStore::open(&path)?;
    assert_eq!(reopened.get(CREDENTIAL_KEY), Some("def456"));
    assert!(!path.with_extension("json.tmp").exists(), "Temp file is renamed away");

    Ok(())
}

#[test]
fn test_corrupt_store_is_an_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("store.json");
    fs::write(&path, "{ not json")?;

    let err = LocalStore::open(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse store"));

    Ok(())
}

#[test]
fn test_first_start_creates_and_persists_session_id() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("store.json");

    let mut store = LocalStore::open(&path)?;
    let config = load_session_config(&mut store, Language::Bengali)?;

    assert!(config.session_id.starts_with("session_"));
    assert_eq!(config.credential, "", "No key saved yet");
    assert!(!config.has_credential());
    assert_eq!(config.language, Language::Bengali);

    let reopened = LocalStore::open(&path)?;
    assert_eq!(reopened.get(SESSION_ID_KEY), Some(config.session_id.as_str()));

    Ok(())
}

#[test]
fn test_session_id_is_stable_across_starts() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("store.json");

    let first = load_session_config(&mut LocalStore::open(&path)?, Language::English)?;
    let second = load_session_config(&mut LocalStore::open(&path)?, Language::English)?;

    assert_eq!(first.session_id, second.session_id);

    Ok(())
}

#[test]
fn test_saved_credential_is_loaded() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("store.json");
    fs::write(
        &path,
        r#"{ "agrogpt_apikey": "abc123", "agrogpt_session_id": "s1" }"#,
    )?;

    let config = load_session_config(&mut LocalStore::open(&path)?, Language::English)?;

    assert_eq!(config.session_id, "s1");
    assert_eq!(config.credential, "abc123");
    assert!(config.has_credential());

    Ok(())
}
