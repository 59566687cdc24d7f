//! Per-provider credential persistence.
//!
//! The session controller never talks to the filesystem directly — it goes
//! through the [`CredentialStore`] trait so tests (and `--no-store` runs) can
//! substitute an in-memory store.  The durable implementation keeps a small
//! JSON map in the settings directory, one entry per provider storage key.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::providers;

/// Capability injected into the session controller: look up and persist the
/// API key for a single provider.
///
/// Both operations degrade silently.  A broken store must never block the
/// chat flow — the key entered by the user still works in memory for the
/// current session.
pub trait CredentialStore {
    /// Return the stored key for the provider, if any.
    fn load(&self, provider: &str) -> Option<String>;
    /// Persist the key for the provider, overwriting any previous value.
    fn save(&mut self, provider: &str, value: &str);
}

// ── File-backed store ───────────────────────────────────────────────────────

/// Durable store backed by a JSON file (`credentials.json` in the settings
/// directory).  Values survive restarts; write failures are logged and the
/// store keeps working in memory.
pub struct FileCredentialStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileCredentialStore {
    /// Open (or lazily create) the store at `path`.  An unreadable or
    /// corrupt file is treated as empty.
    pub fn open(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), %err, "credential file is corrupt; starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), %err, "could not read credential file");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    fn flush(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(dir = %parent.display(), %err, "could not create settings directory");
                return;
            }
        }
        match serde_json::to_string_pretty(&self.entries) {
            Ok(raw) => {
                if let Err(err) = fs::write(&self.path, raw) {
                    warn!(path = %self.path.display(), %err, "could not persist credentials");
                }
            }
            Err(err) => warn!(%err, "could not serialize credentials"),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, provider: &str) -> Option<String> {
        self.entries.get(&providers::storage_key(provider)).cloned()
    }

    fn save(&mut self, provider: &str, value: &str) {
        debug!(provider, "saving credential");
        self.entries
            .insert(providers::storage_key(provider), value.to_string());
        self.flush();
    }
}

// ── In-memory store ─────────────────────────────────────────────────────────

/// Volatile store for tests and `--no-store` runs.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: BTreeMap<String, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, provider: &str) -> Option<String> {
        self.entries.get(&providers::storage_key(provider)).cloned()
    }

    fn save(&mut self, provider: &str, value: &str) {
        self.entries
            .insert(providers::storage_key(provider), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let mut store = FileCredentialStore::open(path.clone());
        assert_eq!(store.load("groq"), None);
        store.save("groq", "gsk_test");
        store.save("gemini", "AIza_test");

        // A fresh store reads the values back from disk.
        let reopened = FileCredentialStore::open(path);
        assert_eq!(reopened.load("groq"), Some("gsk_test".to_string()));
        assert_eq!(reopened.load("gemini"), Some("AIza_test".to_string()));
        assert_eq!(reopened.load("ollama"), None);
    }

    #[test]
    fn save_overwrites_previous_value() {
        let mut store = MemoryCredentialStore::new();
        store.save("groq", "old");
        store.save("groq", "new");
        assert_eq!(store.load("groq"), Some("new".to_string()));
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileCredentialStore::open(path);
        assert_eq!(store.load("groq"), None);
    }

    #[test]
    fn unwritable_path_is_a_no_op() {
        // Parent "directory" is actually a file, so every write must fail —
        // but save still works for the in-memory lifetime of the store.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let mut store = FileCredentialStore::open(blocker.join("credentials.json"));
        store.save("groq", "gsk_test");
        assert_eq!(store.load("groq"), Some("gsk_test".to_string()));
    }
}
