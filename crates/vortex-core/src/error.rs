// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Vortex agent.

use thiserror::Error;

/// The primary error type used across all Vortex crates.
#[derive(Debug, Error)]
pub enum VortexError {
    /// Configuration errors (invalid TOML, bad values, duplicate plugin identifiers at load).
    #[error("configuration error: {0}")]
    Config(String),

    /// A session token that does not follow the `<marker>:~<base64 json>` format.
    #[error("invalid session token: {0}")]
    InvalidFormat(String),

    /// No credentials on disk, no token configured, and no terminal to ask.
    #[error("no session credentials available; set SESSION_ID or run interactively")]
    MissingCredentials,

    /// The remote side revoked the session.
    #[error("session logged out by the remote server")]
    LoggedOut,

    /// Transport errors (socket failure, request rejected by the sidecar, bad frame).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local persistence errors (credential file, delegate list, tracker snapshot).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Two plugins claim the same command identifier.
    #[error("command identifier `{pattern}` is already registered")]
    DuplicatePattern { pattern: String },

    /// A command handler failed.
    #[error("command `{command}` failed: {message}")]
    Handler { command: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VortexError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        VortexError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        VortexError::Storage {
            source: Box::new(source),
        }
    }

    /// Whether this error must end the process rather than be retried.
    ///
    /// Fatal: bad or missing credentials, a logged-out session, and
    /// configuration mistakes such as duplicate command identifiers.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VortexError::Config(_)
                | VortexError::InvalidFormat(_)
                | VortexError::MissingCredentials
                | VortexError::LoggedOut
                | VortexError::DuplicatePattern { .. }
        )
    }
}
