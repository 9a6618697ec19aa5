// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vortex.toml` > `~/.config/vortex/vortex.toml` > `/etc/vortex/vortex.toml`
//! with environment variable overrides via the `VORTEX_` prefix and the flat
//! variable names older deployments use (`SESSION_ID`, `PREFIX`, ...).

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::VortexConfig;

/// Flat environment variables and the keys they set.
pub const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("SESSION_ID", "session.id"),
    ("PAIRING_CODE", "session.pairing_code"),
    ("MODE", "bot.mode"),
    ("PREFIX", "bot.prefix"),
    ("OWNER_NUMBER", "bot.owner_numbers"),
    ("DEV", "bot.dev"),
    ("ANTI_CALL", "automation.anti_call"),
    ("REJECT_MSG", "automation.reject_message"),
    ("READ_MESSAGE", "automation.read_message"),
    ("AUTO_STATUS_SEEN", "automation.auto_status_seen"),
    ("AUTO_STATUS_REACT", "automation.auto_status_react"),
    ("AUTO_STATUS_REPLY", "automation.auto_status_reply"),
    ("AUTO_STATUS_MSG", "automation.auto_status_msg"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vortex/vortex.toml` (system-wide)
/// 3. `~/.config/vortex/vortex.toml` (user XDG config)
/// 4. `./vortex.toml` (local directory)
/// 5. `VORTEX_*` environment variables
/// 6. Legacy flat environment variables
pub fn load_config() -> Result<VortexConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no environment).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<VortexConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VortexConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VortexConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VortexConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .merge(legacy_env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(VortexConfig::default()))
        .merge(Toml::file("/etc/vortex/vortex.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vortex/vortex.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vortex.toml"))
        .merge(env_provider())
        .merge(legacy_env_provider())
}

/// Loads `.env` from the working directory into the process environment.
///
/// Variables already set in the environment win. A missing file is not an error.
pub fn load_dotenv() -> Option<std::path::PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable .env file");
            None
        }
    }
}

/// Create the `VORTEX_` provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")`: `VORTEX_BOT_OWNER_NUMBERS` must map to
/// `bot.owner_numbers`, not `bot.owner.numbers`.
fn env_provider() -> Env {
    Env::prefixed("VORTEX_").map(|key| {
        // Example: VORTEX_ANTIDELETE_MAX_AGE_SECS -> "antidelete_max_age_secs"
        let key_str = key.as_str().to_ascii_lowercase();
        let section = [
            "session_",
            "bot_",
            "automation_",
            "startup_",
            "antidelete_",
            "presence_",
            "transport_",
        ]
        .into_iter()
        .find(|section| key_str.starts_with(section));
        let mapped = match section {
            Some(section) => key_str.replacen(section, &section.replace('_', "."), 1),
            None => key_str,
        };
        mapped.into()
    })
}

/// Provider for the unprefixed variables listed in [`LEGACY_ENV_KEYS`].
fn legacy_env_provider() -> Env {
    let names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        let name = key.as_str();
        LEGACY_ENV_KEYS
            .iter()
            .find(|(env, _)| env.eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).to_string())
            .unwrap_or_else(|| name.to_ascii_lowercase())
            .into()
    })
}
