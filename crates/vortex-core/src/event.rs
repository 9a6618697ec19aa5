// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed events emitted by a [`Transport`](crate::traits::Transport).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::oneshot;

use crate::credentials::SessionCredentials;
use crate::message::{MessageKey, RawMessage};
use crate::types::DisconnectClass;

/// Status code the protocol attaches to a close caused by a revoked session.
pub const LOGGED_OUT_STATUS: u16 = 401;

/// Classifies a close by its status code. Pure: only the logged-out code is terminal.
pub fn classify_disconnect(status_code: Option<u16>) -> DisconnectClass {
    match status_code {
        Some(LOGGED_OUT_STATUS) => DisconnectClass::Terminal,
        _ => DisconnectClass::Transient,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPhase {
    Connecting,
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectInfo {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DisconnectInfo {
    pub fn class(&self) -> DisconnectClass {
        classify_disconnect(self.status_code)
    }
}

/// `connection.update`: any subset of the fields may be present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionUpdate {
    #[serde(default)]
    pub connection: Option<ConnectionPhase>,
    #[serde(default)]
    pub last_disconnect: Option<DisconnectInfo>,
    /// A fresh QR payload to show while pairing.
    #[serde(default)]
    pub qr: Option<String>,
}

impl ConnectionUpdate {
    pub fn open() -> Self {
        Self {
            connection: Some(ConnectionPhase::Open),
            ..Default::default()
        }
    }

    pub fn closed(status_code: Option<u16>) -> Self {
        Self {
            connection: Some(ConnectionPhase::Close),
            last_disconnect: Some(DisconnectInfo {
                status_code,
                message: None,
            }),
            qr: None,
        }
    }
}

/// One entry of `messages.update`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageUpdate {
    pub key: MessageKey,
    #[serde(default)]
    pub update: Map<String, Value>,
}

impl MessageUpdate {
    /// The protocol reports a deletion as an update that nulls the message.
    pub fn is_deletion(&self) -> bool {
        matches!(self.update.get("message"), Some(Value::Null))
    }

    /// Who performed the update, as far as the key tells.
    pub fn actor(&self) -> &str {
        self.key
            .participant
            .as_deref()
            .unwrap_or(&self.key.remote_jid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    pub id: String,
    pub from: String,
    pub status: String,
}

impl CallEvent {
    pub fn is_offer(&self) -> bool {
        self.status == "offer"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub id: String,
    #[serde(default)]
    pub presences: Map<String, Value>,
}

/// The transport asks for a previously seen message (decryption retry).
#[derive(Debug)]
pub struct MessageLookup {
    pub key: MessageKey,
    pub reply: oneshot::Sender<Option<Value>>,
}

/// Everything a transport can report.
#[derive(Debug)]
pub enum TransportEvent {
    ConnectionUpdate(ConnectionUpdate),
    CredentialsUpdate(SessionCredentials),
    MessagesUpsert(Vec<RawMessage>),
    MessagesUpdate(Vec<MessageUpdate>),
    CallOffer(Vec<CallEvent>),
    PresenceUpdate(PresenceUpdate),
    MessageLookup(MessageLookup),
}
