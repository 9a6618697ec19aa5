// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ping`: round-trip latency check.

use std::time::Instant;

use async_trait::async_trait;
use vortex_core::VortexError;

use crate::handler::{CommandContext, CommandHandler};

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn handle(&self, ctx: &CommandContext) -> Result<(), VortexError> {
        let started = Instant::now();
        ctx.reply("Pinging...").await?;
        let latency = started.elapsed().as_millis();
        ctx.reply(format!("*Pong!* {latency} ms")).await?;
        Ok(())
    }
}
