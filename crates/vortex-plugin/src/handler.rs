// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capability every command implements and the context it receives.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vortex_access::DelegateStore;
use vortex_core::{
    AuthorizationTier, MessageKey, NormalizedMessage, OutboundMessage, Transport, VortexError,
};

use crate::command::CommandInvocation;
use crate::registry::SharedRegistry;

/// Static facts about the running bot, shown by informational commands.
#[derive(Debug, Clone)]
pub struct BotProfile {
    pub name: String,
    pub owner_name: String,
    pub prefix: String,
    /// Contact number shown by `dev`, digits only.
    pub contact: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl BotProfile {
    pub fn new(name: impl Into<String>, owner_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_name: owner_name.into(),
            prefix: prefix.into(),
            contact: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_contact(mut self, contact: Option<String>) -> Self {
        self.contact = contact;
        self
    }
}

/// Everything a handler may touch for one invocation.
///
/// The active connection is passed in here; handlers hold no global state.
#[derive(Clone)]
pub struct CommandContext {
    pub transport: Arc<dyn Transport>,
    pub message: NormalizedMessage,
    pub invocation: CommandInvocation,
    pub tier: AuthorizationTier,
    pub registry: SharedRegistry,
    pub delegates: Arc<DelegateStore>,
    pub bot: Arc<BotProfile>,
}

impl CommandContext {
    /// Replies in the invoking chat, quoting the command message.
    pub async fn reply(&self, text: impl Into<String>) -> Result<MessageKey, VortexError> {
        self.transport
            .send_message(
                OutboundMessage::text(self.message.chat_id.clone(), text).quoting(&self.message.key),
            )
            .await
    }

    pub async fn send(&self, message: OutboundMessage) -> Result<MessageKey, VortexError> {
        self.transport.send_message(message).await
    }

    /// Display name of the requester.
    pub fn requester_name(&self) -> &str {
        self.message.push_name.as_deref().unwrap_or("there")
    }
}

/// A command implementation.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn handle(&self, ctx: &CommandContext) -> Result<(), VortexError>;
}

/// Shorthand for a handler failure with a user-facing message.
pub fn handler_error(command: &str, message: impl Into<String>) -> VortexError {
    VortexError::Handler {
        command: command.to_string(),
        message: message.into(),
    }
}
