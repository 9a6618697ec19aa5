// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugin list|remove|add`: runtime changes to the registered command set.

use async_trait::async_trait;
use tracing::info;
use vortex_core::VortexError;

use super::{BUILTIN_NAMES, descriptor_for};
use crate::handler::{CommandContext, CommandHandler};

pub struct PluginAdmin;

#[async_trait]
impl CommandHandler for PluginAdmin {
    async fn handle(&self, ctx: &CommandContext) -> Result<(), VortexError> {
        let action = ctx.invocation.arg(0).map(str::to_lowercase);
        let name = ctx.invocation.arg(1).map(str::to_lowercase);

        let text = match (action.as_deref(), name) {
            (Some("list"), _) => {
                let registry = ctx.registry.read().await;
                let lines: Vec<String> = registry
                    .list()
                    .iter()
                    .map(|d| {
                        if d.aliases.is_empty() {
                            format!("• {} [{}]", d.pattern, d.required_tier)
                        } else {
                            format!(
                                "• {} ({}) [{}]",
                                d.pattern,
                                d.aliases.join(", "),
                                d.required_tier
                            )
                        }
                    })
                    .collect();
                format!("*{} plugins loaded*\n{}", registry.len(), lines.join("\n"))
            }
            (Some("remove"), Some(name)) => {
                if name == "plugin" {
                    "The plugin manager cannot remove itself.".to_string()
                } else {
                    match ctx.registry.write().await.unregister(&name) {
                        Some(removed) => {
                            info!(pattern = %removed.pattern, "plugin removed at runtime");
                            format!("Removed `{}`.", removed.pattern)
                        }
                        None => format!("No plugin answers to `{name}`."),
                    }
                }
            }
            (Some("add"), Some(name)) => match descriptor_for(&name) {
                Some(descriptor) => {
                    let pattern = descriptor.pattern.clone();
                    match ctx.registry.write().await.register(descriptor) {
                        Ok(()) => {
                            info!(pattern = %pattern, "plugin added at runtime");
                            format!("Added `{pattern}`.")
                        }
                        Err(VortexError::DuplicatePattern { pattern }) => {
                            format!("`{pattern}` is already registered.")
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => format!(
                    "Unknown plugin `{name}`. Available: {}",
                    BUILTIN_NAMES.join(", ")
                ),
            },
            _ => {
                let prefix = &ctx.invocation.prefix_used;
                format!(
                    "Usage: {prefix}plugin list | {prefix}plugin remove <name> | {prefix}plugin add <name>"
                )
            }
        };
        ctx.reply(text).await?;
        Ok(())
    }
}
