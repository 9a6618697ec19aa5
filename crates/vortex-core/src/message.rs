// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message shapes: raw transport payloads, the normalized form consumed by
//! the agent, and outbound content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Addresses a single message on the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    pub remote_jid: String,
    #[serde(default)]
    pub from_me: bool,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
}

/// A message as delivered by the transport in `messages.upsert`.
///
/// `message` is the protocol's content object, left untyped; normalization
/// turns it into a [`NormalizedMessage`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub key: MessageKey,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub push_name: Option<String>,
    #[serde(default)]
    pub message_timestamp: Option<i64>,
    #[serde(default)]
    pub newsletter_server_id: Option<Value>,
}

/// Closed set of content kinds, resolved once during normalization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Audio,
    Reaction,
    ProtocolRevoke,
    Other,
}

/// The message a reply quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedMessage {
    pub id: Option<String>,
    pub sender_id: Option<String>,
    pub text: Option<String>,
    pub content: Value,
}

/// Canonical message shape. Built once per inbound message, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub is_group: bool,
    pub from_me: bool,
    pub content_type: ContentType,
    pub text: Option<String>,
    pub quoted: Option<QuotedMessage>,
    pub timestamp: DateTime<Utc>,
    pub push_name: Option<String>,
    /// For `protocol-revoke` messages, the id of the message being revoked.
    pub revoked_id: Option<String>,
    /// Unwrapped content object, used for replay and `getMessage` lookups.
    pub content: Value,
    pub key: MessageKey,
}

/// Content the agent sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundContent {
    Text { text: String },
    Image { url: String, caption: Option<String> },
    Audio { url: String, ptt: bool },
    Reaction { emoji: String, key: MessageKey },
}

/// A message to deliver to a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub content: OutboundContent,
    /// Key of the message this one replies to.
    pub quoted: Option<MessageKey>,
}

impl OutboundMessage {
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            content: OutboundContent::Text { text: text.into() },
            quoted: None,
        }
    }

    pub fn reaction(chat_id: impl Into<String>, emoji: impl Into<String>, key: MessageKey) -> Self {
        Self {
            chat_id: chat_id.into(),
            content: OutboundContent::Reaction {
                emoji: emoji.into(),
                key,
            },
            quoted: None,
        }
    }

    /// Marks this message as a reply to `key`.
    pub fn quoting(mut self, key: &MessageKey) -> Self {
        self.quoted = Some(key.clone());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupParticipant {
    pub id: String,
    /// `"admin"`, `"superadmin"`, or absent for regular members.
    #[serde(default)]
    pub admin: Option<String>,
}

/// Live group metadata as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub participants: Vec<GroupParticipant>,
}

impl GroupMetadata {
    /// Identifiers of all participants holding any admin role.
    pub fn admins(&self) -> impl Iterator<Item = &str> {
        self.participants
            .iter()
            .filter(|p| p.admin.is_some())
            .map(|p| p.id.as_str())
    }

    pub fn is_admin(&self, sender_id: &str) -> bool {
        self.admins().any(|admin| crate::jid::same_user(admin, sender_id))
    }
}

/// Newsletter metadata. `viewer_metadata` is present once the account follows it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterMetadata {
    pub id: String,
    #[serde(default)]
    pub viewer_metadata: Option<Value>,
}

impl NewsletterMetadata {
    pub fn is_following(&self) -> bool {
        self.viewer_metadata.as_ref().is_some_and(|v| !v.is_null())
    }
}
