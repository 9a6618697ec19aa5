// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared wiring for agent integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use secrecy::SecretString;
use vortex_access::{AuthorizationResolver, DelegateStore};
use vortex_config::model::VortexConfig;
use vortex_core::{Transport, VortexError};
use vortex_plugin::BotProfile;
use vortex_session::{CredentialStore, Prompter, SessionBootstrap, SessionCodec};
use vortex_test_utils::MockTransport;

pub const REGISTERED: &str = r#"{"registered":true,"me":{"id":"10000:7@s.whatsapp.net"}}"#;

/// Answers prompts from a script.
#[derive(Default)]
pub struct Script {
    pub interactive: bool,
    pub phone: Option<String>,
}

impl Prompter for Script {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn read_token(&self) -> Result<Option<SecretString>, VortexError> {
        Ok(None)
    }

    fn read_phone(&self) -> Result<Option<String>, VortexError> {
        Ok(self.phone.clone())
    }
}

pub fn write_registered(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("creds.json"), REGISTERED).unwrap();
}

pub fn bootstrap(dir: &Path, pairing_code: bool, script: Script) -> SessionBootstrap {
    SessionBootstrap::new(
        SessionCodec::new("kc"),
        CredentialStore::new(dir),
        None,
        pairing_code,
        Arc::new(script),
    )
}

/// Configuration with one owner, no network side effects at startup and
/// state kept under `dir`.
pub fn config(dir: &Path) -> VortexConfig {
    let mut config = VortexConfig::default();
    config.bot.owner_numbers = vec!["2349117525115".to_string()];
    config.bot.owner_name = "Kelvin".to_string();
    config.session.dir = dir.join("session").display().to_string();
    config.bot.delegates_path = dir.join("sudo.json").display().to_string();
    config.startup.newsletters = Vec::new();
    config.automation.newsletter_react = false;
    config
}

pub fn resolver(config: &VortexConfig, mock: &Arc<MockTransport>) -> Arc<AuthorizationResolver> {
    let transport: Arc<dyn Transport> = mock.clone();
    Arc::new(AuthorizationResolver::new(
        config.bot.owner_digits(),
        Arc::new(DelegateStore::empty(&config.bot.delegates_path)),
        transport,
    ))
}

pub fn bot(config: &VortexConfig) -> Arc<BotProfile> {
    Arc::new(BotProfile::new(
        config.bot.name.clone(),
        config.bot.owner_name.clone(),
        config.bot.prefix.clone(),
    ))
}
