// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configured background behaviours: read receipts, status reactions,
//! newsletter reactions and call rejection.

use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde_json::Value;
use tracing::{debug, info, warn};
use vortex_config::model::{AutomationConfig, StartupConfig};
use vortex_core::{
    CallEvent, NormalizedMessage, OutboundMessage, RawMessage, Transport, jid,
};

/// What happened to an inbound message before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// A regular chat message; continue to the dispatcher.
    Continue,
    /// Status posts and newsletter posts stop here.
    Consumed,
}

pub struct Automation {
    config: AutomationConfig,
    newsletters: HashSet<String>,
    transport: Arc<dyn Transport>,
}

fn pick(emojis: &[String]) -> Option<&str> {
    emojis.choose(&mut rand::thread_rng()).map(String::as_str)
}

fn server_id(raw: &RawMessage) -> Option<String> {
    match raw.newsletter_server_id.as_ref()? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Automation {
    pub fn new(config: AutomationConfig, startup: &StartupConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            newsletters: startup.newsletters.iter().cloned().collect(),
            transport,
        }
    }

    pub async fn on_message(&self, message: &NormalizedMessage, raw: &RawMessage) -> Routing {
        if jid::is_status(&message.chat_id) {
            if !message.from_me {
                self.on_status(message).await;
            }
            return Routing::Consumed;
        }

        if jid::is_newsletter(&message.chat_id) {
            self.on_newsletter_post(message, raw).await;
            return Routing::Consumed;
        }

        if self.config.read_message && !message.from_me {
            if let Err(e) = self
                .transport
                .read_messages(std::slice::from_ref(&message.key))
                .await
            {
                debug!(message_id = %message.id, error = %e, "read receipt failed");
            }
        }
        Routing::Continue
    }

    async fn on_status(&self, message: &NormalizedMessage) {
        if self.config.auto_status_seen {
            if let Err(e) = self
                .transport
                .read_messages(std::slice::from_ref(&message.key))
                .await
            {
                warn!(poster = %message.sender_id, error = %e, "failed to mark status seen");
            }
        }

        if self.config.auto_status_react {
            if let Some(emoji) = pick(&self.config.status_emojis) {
                let reaction =
                    OutboundMessage::reaction(jid::STATUS_BROADCAST, emoji, message.key.clone());
                if let Err(e) = self.transport.send_message(reaction).await {
                    warn!(poster = %message.sender_id, error = %e, "failed to react to status");
                }
            }
        }

        if self.config.auto_status_reply {
            let reply = OutboundMessage::text(
                message.sender_id.clone(),
                self.config.auto_status_msg.clone(),
            )
            .quoting(&message.key);
            if let Err(e) = self.transport.send_message(reply).await {
                warn!(poster = %message.sender_id, error = %e, "failed to reply to status");
            }
        }
    }

    async fn on_newsletter_post(&self, message: &NormalizedMessage, raw: &RawMessage) {
        if !self.config.newsletter_react || !self.newsletters.contains(&message.chat_id) {
            return;
        }
        let (Some(server_id), Some(emoji)) = (server_id(raw), pick(&self.config.newsletter_emojis))
        else {
            return;
        };
        match self
            .transport
            .react_to_newsletter(&message.chat_id, &server_id, emoji)
            .await
        {
            Ok(()) => debug!(newsletter = %message.chat_id, %server_id, emoji, "reacted to newsletter post"),
            Err(e) => debug!(newsletter = %message.chat_id, error = %e, "newsletter reaction failed"),
        }
    }

    /// Rejects offered calls when anti-call is on and tells the caller why.
    pub async fn on_call(&self, call: &CallEvent) {
        if !self.config.anti_call || !call.is_offer() {
            return;
        }
        if let Err(e) = self.transport.reject_call(&call.id, &call.from).await {
            warn!(call_id = %call.id, caller = %call.from, error = %e, "failed to reject call");
            return;
        }
        info!(call_id = %call.id, caller = %call.from, "call rejected");
        let notice = OutboundMessage::text(
            jid::normalize(&call.from),
            self.config.reject_message.clone(),
        );
        if let Err(e) = self.transport.send_message(notice).await {
            warn!(caller = %call.from, error = %e, "failed to send call rejection notice");
        }
    }
}
