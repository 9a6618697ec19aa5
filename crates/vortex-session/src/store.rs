// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk credential file (`<dir>/creds.json`), the single source of truth
//! for the transport's login state.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vortex_core::{SessionCredentials, VortexError};

/// File name the transport reads credentials from.
pub const CREDENTIALS_FILE: &str = "creds.json";

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CREDENTIALS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads stored credentials. A missing or unparseable file yields `None`.
    pub async fn load(&self) -> Result<Option<SessionCredentials>, VortexError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VortexError::storage(e)),
        };

        match SessionCredentials::from_json(&raw) {
            Ok(creds) => Ok(Some(creds)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable credential file");
                Ok(None)
            }
        }
    }

    /// Writes JSON text exactly as given, replacing the whole file.
    pub async fn write_raw(&self, json: &str) -> Result<(), VortexError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(VortexError::storage)?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(VortexError::storage)?;
        debug!(path = %self.path.display(), bytes = json.len(), "credentials written");
        Ok(())
    }

    pub async fn persist(&self, credentials: &SessionCredentials) -> Result<(), VortexError> {
        self.write_raw(credentials.as_json()).await
    }

    /// Removes the credential file. Returns whether a file was removed.
    pub async fn delete(&self) -> Result<bool, VortexError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VortexError::storage(e)),
        }
    }
}
