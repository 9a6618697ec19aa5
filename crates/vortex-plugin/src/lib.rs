// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command grammar, plugin registry, and built-in commands.
//!
//! Commands are explicit registrations of a [`CommandHandler`] against a
//! [`PluginRegistry`]; the dispatcher resolves a parsed [`CommandInvocation`]
//! to exactly one [`PluginDescriptor`].

pub mod builtin;
pub mod command;
pub mod handler;
pub mod registry;

pub use builtin::{BUILTIN_NAMES, register_builtins};
pub use command::{CommandInvocation, parse};
pub use handler::{BotProfile, CommandContext, CommandHandler, handler_error};
pub use registry::{PluginDescriptor, PluginRegistry, SharedRegistry};
