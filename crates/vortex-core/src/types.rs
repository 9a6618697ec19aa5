// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common enums shared by the connection manager, resolver and dispatcher.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ordinal permission level of a requester.
///
/// Variants are declared lowest first, so the derived `Ord` is the rank:
/// `Member < GroupAdmin < Delegated < Owner`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AuthorizationTier {
    Member,
    GroupAdmin,
    Delegated,
    Owner,
}

impl AuthorizationTier {
    /// Returns true if this tier ranks at or above `required`.
    pub fn satisfies(self, required: AuthorizationTier) -> bool {
        self >= required
    }
}

/// State of the single live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingPairing,
    Open,
    Closing,
}

impl ConnectionState {
    /// A connection attempt is in flight or established.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::AwaitingPairing | ConnectionState::Open
        )
    }
}

/// How a socket close must be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DisconnectClass {
    /// The session was revoked: delete credentials and stop.
    Terminal,
    /// Anything else: reconnect after the backoff.
    Transient,
}

/// Presence values understood by the transport.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PresenceKind {
    Available,
    Unavailable,
    Composing,
    Recording,
    Paused,
}

/// Formats a duration in whole seconds as `{d}d {h}h {m}m {s}s`.
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = total_secs % 86_400 / 3_600;
    let minutes = total_secs % 3_600 / 60;
    let seconds = total_secs % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}
