// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in commands.
//!
//! Each command registers itself through [`register_builtins`], the single
//! explicit registration call made when the connection first opens.

pub mod dev;
pub mod menu;
pub mod ping;
pub mod plugin;
pub mod sudo;

use std::sync::Arc;

use vortex_core::{AuthorizationTier, VortexError};

pub use dev::Dev;
pub use menu::Menu;
pub use ping::Ping;
pub use plugin::PluginAdmin;
pub use sudo::Sudo;

use crate::registry::{PluginDescriptor, PluginRegistry};

/// Patterns of every built-in, in registration order.
pub const BUILTIN_NAMES: &[&str] = &["ping", "dev", "menu", "sudo", "plugin"];

/// A fresh descriptor for the built-in named `name`.
pub fn descriptor_for(name: &str) -> Option<PluginDescriptor> {
    let descriptor = match name {
        "ping" => PluginDescriptor::new("ping", Arc::new(Ping))
            .category("main")
            .description("Check response latency"),
        "dev" => PluginDescriptor::new("dev", Arc::new(Dev))
            .aliases(&["developer", "owner"])
            .category("owner")
            .description("Displays the developer info"),
        "menu" => PluginDescriptor::new("menu", Arc::new(Menu))
            .aliases(&["help"])
            .category("main")
            .description("List available commands"),
        "sudo" => PluginDescriptor::new("sudo", Arc::new(Sudo))
            .category("owner")
            .tier(AuthorizationTier::Owner)
            .description("Manage delegated users"),
        "plugin" => PluginDescriptor::new("plugin", Arc::new(PluginAdmin))
            .category("owner")
            .tier(AuthorizationTier::Owner)
            .description("List, remove or add plugins"),
        _ => return None,
    };
    Some(descriptor)
}

/// Registers all built-in commands into the given registry.
pub fn register_builtins(registry: &mut PluginRegistry) -> Result<(), VortexError> {
    for name in BUILTIN_NAMES {
        if let Some(descriptor) = descriptor_for(name) {
            registry.register(descriptor)?;
        }
    }
    Ok(())
}
