// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sudo add|del|list`: edits the delegated-user list.

use async_trait::async_trait;
use vortex_core::{VortexError, jid};

use crate::handler::{CommandContext, CommandHandler};

pub struct Sudo;

impl Sudo {
    /// The number named in the arguments, or the author of the quoted message.
    fn target(ctx: &CommandContext) -> Option<String> {
        let typed = ctx.invocation.args.get(1..).unwrap_or_default().join("");
        let digits = jid::phone_digits(&typed);
        if !digits.is_empty() {
            return Some(digits);
        }
        ctx.message
            .quoted
            .as_ref()
            .and_then(|q| q.sender_id.as_deref())
            .map(|sender| jid::user_part(sender).to_string())
    }
}

#[async_trait]
impl CommandHandler for Sudo {
    async fn handle(&self, ctx: &CommandContext) -> Result<(), VortexError> {
        let prefix = &ctx.invocation.prefix_used;
        let usage = format!("Usage: {prefix}sudo add <number> | {prefix}sudo del <number> | {prefix}sudo list");

        let action = ctx.invocation.arg(0).map(str::to_lowercase);
        match action.as_deref() {
            Some("list") => {
                let entries = ctx.delegates.list().await;
                let text = if entries.is_empty() {
                    "No delegated users.".to_string()
                } else {
                    let lines: Vec<String> = entries
                        .iter()
                        .enumerate()
                        .map(|(i, n)| format!("{}. +{n}", i + 1))
                        .collect();
                    format!("*Delegated users*\n{}", lines.join("\n"))
                };
                ctx.reply(text).await?;
            }
            Some("add") => match Self::target(ctx) {
                Some(number) => {
                    let text = if ctx.delegates.add(&number).await? {
                        format!("+{number} can now use delegated commands.")
                    } else {
                        format!("+{number} is already delegated.")
                    };
                    ctx.reply(text).await?;
                }
                None => {
                    ctx.reply(usage).await?;
                }
            },
            Some("del" | "remove" | "rm") => match Self::target(ctx) {
                Some(number) => {
                    let text = if ctx.delegates.remove(&number).await? {
                        format!("+{number} is no longer delegated.")
                    } else {
                        format!("+{number} was not delegated.")
                    };
                    ctx.reply(text).await?;
                }
                None => {
                    ctx.reply(usage).await?;
                }
            },
            _ => {
                ctx.reply(usage).await?;
            }
        }
        Ok(())
    }
}
