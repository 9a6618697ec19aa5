// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `menu`: registered commands grouped by category.

use async_trait::async_trait;
use chrono::Utc;
use vortex_core::{VortexError, format_uptime};

use crate::handler::{CommandContext, CommandHandler};

pub struct Menu;

#[async_trait]
impl CommandHandler for Menu {
    async fn handle(&self, ctx: &CommandContext) -> Result<(), VortexError> {
        let groups = ctx.registry.read().await.by_category();
        let uptime = (Utc::now() - ctx.bot.started_at).num_seconds().max(0) as u64;

        let mut text = format!(
            "*{} MENU*\nPrefix: {}\nUptime: {}\n",
            ctx.bot.name.to_uppercase(),
            ctx.bot.prefix,
            format_uptime(uptime)
        );
        for (category, plugins) in groups {
            text.push_str(&format!("\n*{}*\n", category.to_uppercase()));
            for plugin in plugins {
                text.push_str(&format!("• {}{}", ctx.bot.prefix, plugin.pattern));
                if !plugin.description.is_empty() {
                    text.push_str(&format!(" - {}", plugin.description));
                }
                text.push('\n');
            }
        }
        ctx.reply(text.trim_end()).await?;
        Ok(())
    }
}
