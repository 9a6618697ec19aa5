// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for protocol payloads used across tests.

use serde_json::{Value, json};
use vortex_core::{GroupMetadata, GroupParticipant, MessageKey, MessageUpdate, RawMessage};

pub const OWNER: &str = "2349117525115@s.whatsapp.net";
pub const MEMBER: &str = "2348000000001@s.whatsapp.net";
pub const GROUP: &str = "120363025000000000@g.us";

pub fn key(chat: &str, id: &str, participant: Option<&str>) -> MessageKey {
    MessageKey {
        remote_jid: chat.to_string(),
        from_me: false,
        id: id.to_string(),
        participant: participant.map(String::from),
    }
}

/// A raw message with arbitrary `content`.
pub fn raw(chat: &str, id: &str, participant: Option<&str>, content: Value) -> RawMessage {
    RawMessage {
        key: key(chat, id, participant),
        message: Some(content),
        push_name: Some("Tester".to_string()),
        message_timestamp: Some(1_700_000_000),
        newsletter_server_id: None,
    }
}

/// A plain text message in a direct chat with `sender`.
pub fn direct_text(sender: &str, id: &str, text: &str) -> RawMessage {
    raw(sender, id, None, json!({ "conversation": text }))
}

/// A plain text message from `sender` in `group`.
pub fn group_text(group: &str, sender: &str, id: &str, text: &str) -> RawMessage {
    raw(group, id, Some(sender), json!({ "conversation": text }))
}

/// A `messages.update` entry announcing that `id` was deleted.
pub fn deletion(chat: &str, id: &str, actor: Option<&str>) -> MessageUpdate {
    let update = json!({ "message": null });
    MessageUpdate {
        key: key(chat, id, actor),
        update: update.as_object().cloned().unwrap_or_default(),
    }
}

/// Group metadata with the given admins and members.
pub fn group(id: &str, admins: &[&str], members: &[&str]) -> GroupMetadata {
    let participants = admins
        .iter()
        .map(|a| GroupParticipant {
            id: a.to_string(),
            admin: Some("admin".to_string()),
        })
        .chain(members.iter().map(|m| GroupParticipant {
            id: m.to_string(),
            admin: None,
        }))
        .collect();
    GroupMetadata {
        id: id.to_string(),
        subject: "Test group".to_string(),
        participants,
    }
}
