// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-invocation authorization tier resolution.

use std::sync::Arc;

use tracing::{debug, warn};
use vortex_core::{AuthorizationTier, Transport, jid};

use crate::delegates::DelegateStore;

/// Computes the tier of a requester from static owners, the delegate list
/// and live group metadata.
///
/// Nothing is cached between calls: group admin sets are fetched per call.
pub struct AuthorizationResolver {
    owners: Vec<String>,
    delegates: Arc<DelegateStore>,
    transport: Arc<dyn Transport>,
}

impl AuthorizationResolver {
    /// `owners` are phone numbers in any notation; the developer number
    /// belongs here as well.
    pub fn new(
        owners: impl IntoIterator<Item = String>,
        delegates: Arc<DelegateStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            owners: owners
                .into_iter()
                .map(|n| jid::phone_digits(&n))
                .filter(|n| !n.is_empty())
                .collect(),
            delegates,
            transport,
        }
    }

    pub fn delegates(&self) -> &Arc<DelegateStore> {
        &self.delegates
    }

    /// Whether `sender_id` is the bot itself or a configured owner.
    pub fn is_owner(&self, sender_id: &str) -> bool {
        if let Some(own) = self.transport.own_id()
            && jid::same_user(&own, sender_id)
        {
            return true;
        }
        let user = jid::user_part(sender_id);
        self.owners.iter().any(|owner| owner == user)
    }

    /// Highest tier `sender_id` holds in `chat_id`. Never fails: a group
    /// metadata error leaves the sender a member.
    pub async fn resolve_tier(&self, sender_id: &str, chat_id: &str) -> AuthorizationTier {
        if self.is_owner(sender_id) {
            return AuthorizationTier::Owner;
        }

        if self.delegates.contains(sender_id).await {
            return AuthorizationTier::Delegated;
        }

        if jid::is_group(chat_id) {
            match self.transport.group_metadata(chat_id).await {
                Ok(metadata) if metadata.is_admin(sender_id) => {
                    return AuthorizationTier::GroupAdmin;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(chat_id, error = %e, "group metadata unavailable, treating sender as member");
                }
            }
        }

        debug!(sender_id, chat_id, "resolved member tier");
        AuthorizationTier::Member
    }
}
