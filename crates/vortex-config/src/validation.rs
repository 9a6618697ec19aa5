// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty prefixes, positive limits, and URL schemes.

use crate::diagnostic::ConfigError;
use crate::model::VortexConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &VortexConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.bot.prefix.is_empty() {
        fail("bot.prefix must not be empty".to_string());
    }

    if config.bot.prefix.chars().any(char::is_whitespace) {
        fail(format!(
            "bot.prefix `{}` must not contain whitespace",
            config.bot.prefix
        ));
    }

    let mode = config.bot.mode.to_ascii_lowercase();
    if mode != "public" && mode != "private" {
        fail(format!(
            "bot.mode must be `public` or `private`, got `{}`",
            config.bot.mode
        ));
    }

    for number in &config.bot.owner_numbers {
        if !number.chars().any(|c| c.is_ascii_digit()) {
            fail(format!("bot.owner_numbers entry `{number}` contains no digits"));
        }
    }

    if let Some(dev) = &config.bot.dev
        && !dev.chars().any(|c| c.is_ascii_digit())
    {
        fail(format!("bot.dev `{dev}` contains no digits"));
    }

    if config.session.marker.trim().is_empty() {
        fail("session.marker must not be empty".to_string());
    }

    if config.session.dir.trim().is_empty() {
        fail("session.dir must not be empty".to_string());
    }

    if config.antidelete.capacity == 0 {
        fail("antidelete.capacity must be greater than 0".to_string());
    }

    if config.antidelete.max_age_secs == 0 {
        fail("antidelete.max_age_secs must be greater than 0".to_string());
    }

    let forward_to = config.antidelete.forward_to.as_str();
    if forward_to != "owner" && forward_to != "chat" {
        fail(format!(
            "antidelete.forward_to must be `owner` or `chat`, got `{forward_to}`"
        ));
    }

    if config.presence.window_secs == 0 {
        fail("presence.window_secs must be greater than 0".to_string());
    }

    if config.presence.max_transitions == 0 {
        fail("presence.max_transitions must be greater than 0".to_string());
    }

    let url = config.transport.url.trim();
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        fail(format!(
            "transport.url `{url}` must start with ws:// or wss://"
        ));
    }

    if config.transport.request_timeout_secs == 0 {
        fail("transport.request_timeout_secs must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
