//! Locally persisted key/value state
//!
//! Holds the user's API key and the session identity between runs. Values are
//! read once at startup and written back only through [`LocalStore::persist`].

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::messages::Language;
use crate::session::SessionConfig;

pub const CREDENTIAL_KEY: &str = "agrogpt_apikey";
pub const SESSION_ID_KEY: &str = "agrogpt_session_id";

/// JSON file of string values
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl LocalStore {
    /// Open the store at `path`, starting empty if the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse store: {}", path.display()))?
        } else {
            debug!("No store at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    /// Default location: `<config dir>/agrogpt/store.json`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Cannot find the user config directory")?;
        Ok(dir.join("agrogpt").join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a value and write the whole store to disk
    ///
    /// The file is replaced via a temporary sibling and a rename, so a crash
    /// mid-write leaves the previous contents intact.
    pub fn persist(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!("Persisted {} to {}", key, self.path.display());

        Ok(())
    }
}

/// Generate a fresh session identity, e.g. `session_1730000000000_k3j9x0a2b`
pub fn generate_session_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}

/// Startup step: build the session configuration from persisted state.
///
/// The credential is empty when none was saved. A session identity is created
/// and persisted on first use and reused afterwards.
pub fn load_session_config(store: &mut LocalStore, language: Language) -> Result<SessionConfig> {
    let credential = store.get(CREDENTIAL_KEY).unwrap_or_default().to_string();

    let session_id = match store.get(SESSION_ID_KEY) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = generate_session_id();
            store.persist(SESSION_ID_KEY, &id)?;
            info!("Created session {}", id);
            id
        }
    };

    Ok(SessionConfig::new(session_id, credential).with_language(language))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_session_ids_differ() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
