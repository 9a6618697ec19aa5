// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of command plugins.
//!
//! The `PluginRegistry` keeps `PluginDescriptor`s in registration order.
//! Every pattern and alias is a command identifier, and identifiers are
//! unique across the whole registry, compared case-insensitively.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use vortex_core::{AuthorizationTier, VortexError};

use crate::handler::CommandHandler;

/// Registry shared between the dispatcher and admin commands.
pub type SharedRegistry = Arc<RwLock<PluginRegistry>>;

/// A registered command.
pub struct PluginDescriptor {
    pub pattern: String,
    pub aliases: Vec<String>,
    pub category: String,
    pub required_tier: AuthorizationTier,
    pub description: String,
    pub handler: Arc<dyn CommandHandler>,
}

impl PluginDescriptor {
    pub fn new(pattern: &str, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            aliases: Vec::new(),
            category: "misc".to_string(),
            required_tier: AuthorizationTier::Member,
            description: String::new(),
            handler,
        }
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_lowercase()).collect();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn tier(mut self, tier: AuthorizationTier) -> Self {
        self.required_tier = tier;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Pattern followed by aliases.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.pattern.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn matches(&self, command: &str) -> bool {
        self.identifiers().any(|id| id.eq_ignore_ascii_case(command))
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("pattern", &self.pattern)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("required_tier", &self.required_tier)
            .finish()
    }
}

/// Ordered set of command plugins.
pub struct PluginRegistry {
    descriptors: Vec<Arc<PluginDescriptor>>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Adds a plugin.
    ///
    /// Fails with [`VortexError::DuplicatePattern`] if any identifier of
    /// `descriptor` is already taken, including by itself.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> Result<(), VortexError> {
        let ids: Vec<&str> = descriptor.identifiers().collect();
        for (i, id) in ids.iter().enumerate() {
            let repeated = ids[..i].iter().any(|prev| prev.eq_ignore_ascii_case(id));
            if repeated || self.lookup(id).is_some() {
                return Err(VortexError::DuplicatePattern {
                    pattern: id.to_lowercase(),
                });
            }
        }
        debug!(pattern = %descriptor.pattern, aliases = ?descriptor.aliases, "plugin registered");
        self.descriptors.push(Arc::new(descriptor));
        Ok(())
    }

    /// First plugin, in registration order, whose pattern or alias matches.
    pub fn lookup(&self, command: &str) -> Option<Arc<PluginDescriptor>> {
        self.descriptors
            .iter()
            .find(|d| d.matches(command))
            .cloned()
    }

    /// Removes the plugin answering to `name` (pattern or alias).
    pub fn unregister(&mut self, name: &str) -> Option<Arc<PluginDescriptor>> {
        let index = self.descriptors.iter().position(|d| d.matches(name))?;
        Some(self.descriptors.remove(index))
    }

    /// All plugins in registration order.
    pub fn list(&self) -> Vec<Arc<PluginDescriptor>> {
        self.descriptors.clone()
    }

    /// Plugins grouped by category, each group sorted by pattern.
    pub fn by_category(&self) -> BTreeMap<String, Vec<Arc<PluginDescriptor>>> {
        let mut groups: BTreeMap<String, Vec<Arc<PluginDescriptor>>> = BTreeMap::new();
        for descriptor in &self.descriptors {
            groups
                .entry(descriptor.category.clone())
                .or_default()
                .push(Arc::clone(descriptor));
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.pattern.cmp(&b.pattern));
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CommandContext;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn handle(&self, _ctx: &CommandContext) -> Result<(), VortexError> {
            Ok(())
        }
    }

    fn descriptor(pattern: &str, aliases: &[&str]) -> PluginDescriptor {
        PluginDescriptor::new(pattern, Arc::new(Noop)).aliases(aliases)
    }

    #[test]
    fn register_and_lookup_case_insensitive() {
        let mut registry = PluginRegistry::new();
        registry
            .register(descriptor("dev", &["developer", "owner"]))
            .unwrap();
        assert_eq!(registry.lookup("DEV").unwrap().pattern, "dev");
        assert_eq!(registry.lookup("Owner").unwrap().pattern, "dev");
        assert!(registry.lookup("ping").is_none());
    }

    #[test]
    fn duplicate_pattern_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(descriptor("ping", &[])).unwrap();
        let err = registry.register(descriptor("PING", &[])).unwrap_err();
        assert!(matches!(err, VortexError::DuplicatePattern { pattern } if pattern == "ping"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn alias_colliding_with_pattern_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(descriptor("menu", &["help"])).unwrap();
        assert!(registry.register(descriptor("assist", &["Help"])).is_err());
        assert!(registry.register(descriptor("help", &[])).is_err());
        assert!(registry.register(descriptor("list", &["menu"])).is_err());
    }

    #[test]
    fn self_colliding_alias_rejected() {
        let mut registry = PluginRegistry::new();
        assert!(registry.register(descriptor("ping", &["PING"])).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_by_alias_frees_identifiers() {
        let mut registry = PluginRegistry::new();
        registry.register(descriptor("menu", &["help"])).unwrap();
        let removed = registry.unregister("help").unwrap();
        assert_eq!(removed.pattern, "menu");
        assert!(registry.lookup("menu").is_none());
        registry.register(descriptor("help", &[])).unwrap();
    }

    #[test]
    fn list_keeps_registration_order_and_groups_by_category() {
        let mut registry = PluginRegistry::new();
        registry
            .register(descriptor("sudo", &[]).category("owner"))
            .unwrap();
        registry
            .register(descriptor("ping", &[]).category("main"))
            .unwrap();
        registry
            .register(descriptor("dev", &[]).category("owner"))
            .unwrap();

        let order: Vec<String> = registry.list().iter().map(|d| d.pattern.clone()).collect();
        assert_eq!(order, vec!["sudo", "ping", "dev"]);

        let groups = registry.by_category();
        let owner: Vec<&str> = groups["owner"].iter().map(|d| d.pattern.as_str()).collect();
        assert_eq!(owner, vec!["dev", "sudo"]);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["main", "owner"]);
    }
}
