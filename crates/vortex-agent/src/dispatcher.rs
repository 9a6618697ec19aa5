// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes normalized messages to exactly one command handler.
//!
//! Each invocation runs on its own task behind a guard: handler errors and
//! panics are logged and answered with a generic reply, and never reach the
//! event loop.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vortex_access::AuthorizationResolver;
use vortex_core::{AuthorizationTier, NormalizedMessage, OutboundMessage, Transport};
use vortex_plugin::{BotProfile, CommandContext, SharedRegistry, parse};

/// Generic reply sent when a handler fails.
pub const FAILURE_REPLY: &str = "An error occurred while running that command.";

/// What the dispatcher did with a message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No text, or text without the prefix.
    NotACommand,
    /// Prefixed text naming no registered command.
    UnknownCommand(String),
    /// Private mode: the requester ranks below `delegated`.
    Gated,
    Unauthorized {
        command: String,
        tier: AuthorizationTier,
    },
    /// The handler was spawned; the handle resolves when it finishes.
    Dispatched(JoinHandle<HandlerOutcome>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Completed,
    Failed(String),
    Panicked,
}

pub struct Dispatcher {
    registry: SharedRegistry,
    resolver: Arc<AuthorizationResolver>,
    transport: Arc<dyn Transport>,
    bot: Arc<BotProfile>,
    private_mode: bool,
    unauthorized_reply: Option<String>,
}

impl Dispatcher {
    pub fn new(
        registry: SharedRegistry,
        resolver: Arc<AuthorizationResolver>,
        transport: Arc<dyn Transport>,
        bot: Arc<BotProfile>,
    ) -> Self {
        Self {
            registry,
            resolver,
            transport,
            bot,
            private_mode: false,
            unauthorized_reply: Some("You are not allowed to use this command.".to_string()),
        }
    }

    pub fn private_mode(mut self, private: bool) -> Self {
        self.private_mode = private;
        self
    }

    /// Text replied on a tier check failure; `None` drops silently.
    pub fn unauthorized_reply(mut self, reply: Option<String>) -> Self {
        self.unauthorized_reply = reply;
        self
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, message: NormalizedMessage) -> DispatchOutcome {
        let Some(invocation) = message
            .text
            .as_deref()
            .and_then(|text| parse(text, &self.bot.prefix))
        else {
            return DispatchOutcome::NotACommand;
        };

        // The read guard is dropped here; handlers may take the write lock.
        let descriptor = self.registry.read().await.lookup(&invocation.command);
        let Some(descriptor) = descriptor else {
            debug!(command = %invocation.command, "no plugin for command");
            return DispatchOutcome::UnknownCommand(invocation.command);
        };

        let tier = self
            .resolver
            .resolve_tier(&message.sender_id, &message.chat_id)
            .await;

        if self.private_mode && !tier.satisfies(AuthorizationTier::Delegated) {
            debug!(command = %invocation.command, sender = %message.sender_id, "private mode, ignoring");
            return DispatchOutcome::Gated;
        }

        if !tier.satisfies(descriptor.required_tier) {
            info!(
                command = %invocation.command,
                sender = %message.sender_id,
                %tier,
                required = %descriptor.required_tier,
                "unauthorized command"
            );
            if let Some(reply) = &self.unauthorized_reply {
                let notice = OutboundMessage::text(message.chat_id.clone(), reply.clone())
                    .quoting(&message.key);
                if let Err(e) = self.transport.send_message(notice).await {
                    warn!(error = %e, "failed to send unauthorized reply");
                }
            }
            return DispatchOutcome::Unauthorized {
                command: invocation.command,
                tier,
            };
        }

        info!(
            command = %descriptor.pattern,
            sender = %message.sender_id,
            chat_id = %message.chat_id,
            %tier,
            "dispatching command"
        );

        let ctx = CommandContext {
            transport: Arc::clone(&self.transport),
            message,
            invocation,
            tier,
            registry: Arc::clone(&self.registry),
            delegates: Arc::clone(self.resolver.delegates()),
            bot: Arc::clone(&self.bot),
        };

        let handle = tokio::spawn(async move {
            let command = descriptor.pattern.clone();
            let guarded = {
                let ctx = ctx.clone();
                tokio::spawn(async move { descriptor.handler.handle(&ctx).await })
            };

            let outcome = match guarded.await {
                Ok(Ok(())) => return HandlerOutcome::Completed,
                Ok(Err(e)) => {
                    warn!(command = %command, error = %e, "command failed");
                    HandlerOutcome::Failed(e.to_string())
                }
                Err(e) => {
                    error!(command = %command, error = %e, "command panicked");
                    HandlerOutcome::Panicked
                }
            };

            if let Err(e) = ctx.reply(FAILURE_REPLY).await {
                warn!(command = %command, error = %e, "failed to report command failure");
            }
            outcome
        });

        DispatchOutcome::Dispatched(handle)
    }
}
