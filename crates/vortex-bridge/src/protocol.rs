// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frames exchanged with the protocol sidecar.
//!
//! ```json
//! {"type": "req", "id": 7, "method": "sendMessage", "params": {"jid": "...", "content": {"text": "hi"}}}
//! {"type": "res", "id": 7, "ok": true, "result": {"key": {...}}}
//! {"type": "event", "event": "messages.upsert", "data": {"messages": [...], "type": "notify"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use vortex_core::{
    CallEvent, ConnectionUpdate, MessageUpdate, OutboundContent, OutboundMessage, PresenceUpdate,
    RawMessage, SessionCredentials, TransportEvent,
};

/// Method name the sidecar uses to ask for a previously seen message.
pub const GET_MESSAGE: &str = "getMessage";

pub mod events {
    pub const CONNECTION_UPDATE: &str = "connection.update";
    pub const CREDS_UPDATE: &str = "creds.update";
    pub const MESSAGES_UPSERT: &str = "messages.upsert";
    pub const MESSAGES_UPDATE: &str = "messages.update";
    pub const CALL: &str = "call";
    pub const PRESENCE_UPDATE: &str = "presence.update";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    Req {
        id: u64,
        method: String,
        #[serde(default)]
        params: Value,
    },
    Res {
        id: u64,
        ok: bool,
        #[serde(default)]
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<FrameError>,
    },
    Event {
        event: String,
        #[serde(default)]
        data: Value,
    },
}

impl Frame {
    pub fn request(id: u64, method: &str, params: Value) -> Self {
        Frame::Req {
            id,
            method: method.to_string(),
            params,
        }
    }

    pub fn success(id: u64, result: Value) -> Self {
        Frame::Res {
            id,
            ok: true,
            result,
            error: None,
        }
    }

    /// The response payload, or the sidecar's error message.
    pub fn into_outcome(self) -> Option<(u64, Result<Value, String>)> {
        match self {
            Frame::Res {
                id,
                ok: true,
                result,
                ..
            } => Some((id, Ok(result))),
            Frame::Res { id, error, .. } => Some((
                id,
                Err(error.map_or_else(|| "request rejected".to_string(), |e| e.message)),
            )),
            _ => None,
        }
    }
}

/// Maps a named sidecar event to a typed transport event.
///
/// Returns `Ok(None)` for events the agent does not consume.
pub fn decode_event(name: &str, data: Value) -> Result<Option<TransportEvent>, serde_json::Error> {
    let event = match name {
        events::CONNECTION_UPDATE => {
            TransportEvent::ConnectionUpdate(serde_json::from_value::<ConnectionUpdate>(data)?)
        }
        events::CREDS_UPDATE => {
            let document: Map<String, Value> = serde_json::from_value(data)?;
            TransportEvent::CredentialsUpdate(SessionCredentials::from_document(document))
        }
        events::MESSAGES_UPSERT => {
            // Either the full `{messages, type}` payload or a bare array.
            let messages = match data {
                Value::Object(mut payload) => payload.remove("messages").unwrap_or_default(),
                other => other,
            };
            TransportEvent::MessagesUpsert(serde_json::from_value::<Vec<RawMessage>>(messages)?)
        }
        events::MESSAGES_UPDATE => {
            TransportEvent::MessagesUpdate(serde_json::from_value::<Vec<MessageUpdate>>(data)?)
        }
        events::CALL => TransportEvent::CallOffer(serde_json::from_value::<Vec<CallEvent>>(data)?),
        events::PRESENCE_UPDATE => {
            TransportEvent::PresenceUpdate(serde_json::from_value::<PresenceUpdate>(data)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}

/// Content object in the shape the protocol library sends.
pub fn content_json(content: &OutboundContent) -> Value {
    match content {
        OutboundContent::Text { text } => json!({ "text": text }),
        OutboundContent::Image { url, caption } => {
            let mut image = json!({ "image": { "url": url } });
            if let Some(caption) = caption {
                image["caption"] = json!(caption);
            }
            image
        }
        OutboundContent::Audio { url, ptt } => json!({
            "audio": { "url": url },
            "mimetype": "audio/mpeg",
            "ptt": ptt,
        }),
        OutboundContent::Reaction { emoji, key } => json!({
            "react": { "text": emoji, "key": key },
        }),
    }
}

pub fn send_message_params(message: &OutboundMessage) -> Value {
    json!({
        "jid": message.chat_id,
        "content": content_json(&message.content),
        "quoted": message.quoted,
    })
}
