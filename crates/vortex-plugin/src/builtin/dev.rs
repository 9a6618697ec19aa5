// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dev`: developer info card.

use async_trait::async_trait;
use vortex_core::VortexError;

use crate::handler::{CommandContext, CommandHandler};

pub struct Dev;

/// Maps ASCII letters to small capitals.
pub fn small_caps(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_ascii_lowercase() {
            'a' => 'ᴀ',
            'b' => 'ʙ',
            'c' => 'ᴄ',
            'd' => 'ᴅ',
            'e' => 'ᴇ',
            'f' => 'ғ',
            'g' => 'ɢ',
            'h' => 'ʜ',
            'i' => 'ɪ',
            'j' => 'ᴊ',
            'k' => 'ᴋ',
            'l' => 'ʟ',
            'm' => 'ᴍ',
            'n' => 'ɴ',
            'o' => 'ᴏ',
            'p' => 'ᴘ',
            'q' => 'ǫ',
            'r' => 'ʀ',
            't' => 'ᴛ',
            'u' => 'ᴜ',
            'v' => 'ᴠ',
            'w' => 'ᴡ',
            'y' => 'ʏ',
            'z' => 'ᴢ',
            _ => c,
        })
        .collect()
}

#[async_trait]
impl CommandHandler for Dev {
    async fn handle(&self, ctx: &CommandContext) -> Result<(), VortexError> {
        let bot = &ctx.bot;
        let mut card = format!(
            "╭─⌈ {} ⌋─\n│ Hello, *{}*!\n│ *OWNER INFO:*\n│ ───────────────\n│ Name    : {}\n",
            small_caps(&bot.name),
            ctx.requester_name(),
            bot.owner_name,
        );
        if let Some(contact) = &bot.contact {
            card.push_str(&format!("│ Contact : wa.me/+{contact}\n"));
        }
        card.push_str(&format!(
            "╰───────────────\n\n> *Made by {} | Powered by {}*",
            bot.owner_name, bot.name
        ));
        ctx.reply(card).await?;
        Ok(())
    }
}
