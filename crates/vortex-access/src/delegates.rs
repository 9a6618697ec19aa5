// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted list of delegated users, stored as a flat JSON array of numbers.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, warn};
use vortex_core::{VortexError, jid};

/// Admin-editable delegated-user list.
///
/// Entries are kept as digit strings. Every change is written back to disk
/// before the call returns.
#[derive(Debug)]
pub struct DelegateStore {
    path: PathBuf,
    entries: Mutex<Vec<String>>,
}

impl DelegateStore {
    /// Loads the list at `path`. A missing or malformed file starts empty.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, VortexError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => Vec::new(),
            Ok(raw) => match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
                Ok(values) => values.iter().filter_map(entry_digits).collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "delegate list is not a JSON array, starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(VortexError::storage(e)),
        };
        debug!(path = %path.display(), count = entries.len(), "delegate list loaded");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// An empty list persisted at `path` on first change.
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `sender_id` (identifier or number) is delegated.
    pub async fn contains(&self, sender_id: &str) -> bool {
        let digits = jid::phone_digits(jid::user_part(sender_id));
        !digits.is_empty() && self.entries.lock().await.contains(&digits)
    }

    /// Adds a number. Returns `false` if it was already present.
    pub async fn add(&self, number: &str) -> Result<bool, VortexError> {
        let digits = jid::phone_digits(jid::user_part(number));
        if digits.is_empty() {
            return Err(VortexError::Handler {
                command: "sudo".to_string(),
                message: format!("`{number}` is not a phone number"),
            });
        }
        let mut entries = self.entries.lock().await;
        if entries.contains(&digits) {
            return Ok(false);
        }
        entries.push(digits);
        self.persist(&entries).await?;
        Ok(true)
    }

    /// Removes a number. Returns `false` if it was not present.
    pub async fn remove(&self, number: &str) -> Result<bool, VortexError> {
        let digits = jid::phone_digits(jid::user_part(number));
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| *e != digits);
        if entries.len() == before {
            return Ok(false);
        }
        self.persist(&entries).await?;
        Ok(true)
    }

    pub async fn list(&self) -> Vec<String> {
        self.entries.lock().await.clone()
    }

    async fn persist(&self, entries: &[String]) -> Result<(), VortexError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(VortexError::storage)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(VortexError::storage)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(VortexError::storage)
    }
}

/// Accepts `"234..."`, `"234...@s.whatsapp.net"` or a bare JSON number.
fn entry_digits(value: &serde_json::Value) -> Option<String> {
    let digits = match value {
        serde_json::Value::String(s) => jid::phone_digits(jid::user_part(s)),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!digits.is_empty()).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DelegateStore::load(dir.path().join("sudo.json")).await.unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn loads_mixed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sudo.json");
        std::fs::write(&path, r#"["2348011111111", "2348022222222@s.whatsapp.net", 2348033333333]"#)
            .unwrap();

        let store = DelegateStore::load(&path).await.unwrap();
        assert_eq!(
            store.list().await,
            vec!["2348011111111", "2348022222222", "2348033333333"]
        );
        assert!(store.contains("2348022222222:4@s.whatsapp.net").await);
        assert!(!store.contains("2348099999999@s.whatsapp.net").await);
    }

    #[tokio::test]
    #[traced_test]
    async fn malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sudo.json");
        std::fs::write(&path, "{not an array").unwrap();
        let store = DelegateStore::load(&path).await.unwrap();
        assert!(store.list().await.is_empty());
        assert!(logs_contain("delegate list is not a JSON array"));
    }

    #[tokio::test]
    async fn add_and_remove_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib/sudo.json");
        let store = DelegateStore::load(&path).await.unwrap();

        assert!(store.add("+234 801 111 1111").await.unwrap());
        assert!(!store.add("2348011111111@s.whatsapp.net").await.unwrap());
        let on_disk: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec!["2348011111111"]);

        assert!(store.remove("2348011111111").await.unwrap());
        assert!(!store.remove("2348011111111").await.unwrap());
        let reloaded = DelegateStore::load(&path).await.unwrap();
        assert!(reloaded.list().await.is_empty());
    }

    #[tokio::test]
    async fn add_rejects_non_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let store = DelegateStore::empty(dir.path().join("sudo.json"));
        assert!(store.add("someone").await.is_err());
    }
}
