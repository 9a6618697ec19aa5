// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns raw `messages.upsert` payloads into [`NormalizedMessage`]s.
//!
//! Envelope unwrapping and content-type resolution happen here once, so
//! nothing downstream inspects protocol shapes again.

use chrono::{DateTime, Utc};
use serde_json::Value;
use vortex_core::{ContentType, NormalizedMessage, QuotedMessage, RawMessage, jid};

/// Wrappers whose inner `message` is the real content.
const ENVELOPES: &[&str] = &[
    "ephemeralMessage",
    "viewOnceMessage",
    "viewOnceMessageV2",
    "viewOnceMessageV2Extension",
    "documentWithCaptionMessage",
];

/// Keys that ride along with content and never name its type.
const AUXILIARY_KEYS: &[&str] = &["senderKeyDistributionMessage", "messageContextInfo"];

/// `protocolMessage.type` value for a revoke.
const REVOKE: i64 = 0;

/// Strips envelope wrappers until the content object itself is reached.
pub fn unwrap_envelopes(content: &Value) -> &Value {
    let mut current = content;
    loop {
        let inner = ENVELOPES
            .iter()
            .find_map(|key| current.get(key).and_then(|e| e.get("message")));
        match inner {
            Some(inner) => current = inner,
            None => return current,
        }
    }
}

/// The key naming the content kind, skipping auxiliary keys.
pub fn content_key(content: &Value) -> Option<&str> {
    content
        .as_object()?
        .keys()
        .map(String::as_str)
        .find(|key| !AUXILIARY_KEYS.contains(key))
}

fn is_revoke(protocol: &Value) -> bool {
    match protocol.get("type") {
        Some(Value::Number(n)) => n.as_i64() == Some(REVOKE),
        Some(Value::String(s)) => s == "REVOKE",
        // The protocol omits zero-valued enums.
        None => protocol.get("key").is_some(),
        _ => false,
    }
}

fn classify(key: Option<&str>, content: &Value) -> ContentType {
    match key {
        Some("conversation" | "extendedTextMessage") => ContentType::Text,
        Some("imageMessage") => ContentType::Image,
        Some("videoMessage") => ContentType::Video,
        Some("audioMessage") => ContentType::Audio,
        Some("reactionMessage") => ContentType::Reaction,
        Some("protocolMessage") if content.get("protocolMessage").is_some_and(is_revoke) => {
            ContentType::ProtocolRevoke
        }
        _ => ContentType::Other,
    }
}

/// The human-readable text carried by `content`, if any.
pub fn extract_text(content: &Value) -> Option<String> {
    let text = content
        .get("conversation")
        .or_else(|| content.pointer("/extendedTextMessage/text"))
        .or_else(|| content.pointer("/imageMessage/caption"))
        .or_else(|| content.pointer("/videoMessage/caption"))
        .or_else(|| content.pointer("/documentMessage/caption"))
        .or_else(|| content.pointer("/reactionMessage/text"))?;
    text.as_str().map(String::from)
}

fn extract_quoted(content: &Value, key: Option<&str>) -> Option<QuotedMessage> {
    let context = content.get(key?)?.get("contextInfo")?;
    let quoted = context.get("quotedMessage")?;
    let quoted = unwrap_envelopes(quoted);
    Some(QuotedMessage {
        id: context.get("stanzaId").and_then(Value::as_str).map(String::from),
        sender_id: context
            .get("participant")
            .and_then(Value::as_str)
            .map(jid::normalize),
        text: extract_text(quoted),
        content: quoted.clone(),
    })
}

/// Normalizes one raw message.
///
/// Returns `None` for stubs without content. `own_id` is the connected
/// account, used as the sender of messages sent from this account.
pub fn normalize(raw: &RawMessage, own_id: Option<&str>) -> Option<NormalizedMessage> {
    let content = unwrap_envelopes(raw.message.as_ref()?);
    let key = content_key(content);
    let content_type = classify(key, content);

    let sender = if raw.key.from_me {
        own_id.unwrap_or(&raw.key.remote_jid)
    } else {
        raw.key
            .participant
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&raw.key.remote_jid)
    };

    let revoked_id = match content_type {
        ContentType::ProtocolRevoke => content
            .pointer("/protocolMessage/key/id")
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    };

    let timestamp = raw
        .message_timestamp
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    let chat_id = jid::normalize(&raw.key.remote_jid);
    Some(NormalizedMessage {
        id: raw.key.id.clone(),
        is_group: jid::is_group(&chat_id),
        chat_id,
        sender_id: jid::normalize(sender),
        from_me: raw.key.from_me,
        content_type,
        text: extract_text(content),
        quoted: extract_quoted(content, key),
        timestamp,
        push_name: raw.push_name.clone(),
        revoked_id,
        content: content.clone(),
        key: raw.key.clone(),
    })
}
