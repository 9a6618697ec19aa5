// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vortex chat agent.
//!
//! Holds the shared error type, the domain types every other crate consumes,
//! and the [`Transport`] trait that isolates the agent from the chat-protocol
//! library.

pub mod credentials;
pub mod error;
pub mod event;
pub mod jid;
pub mod message;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use credentials::SessionCredentials;
pub use error::VortexError;
pub use event::{
    CallEvent, ConnectionPhase, ConnectionUpdate, DisconnectInfo, LOGGED_OUT_STATUS,
    MessageLookup, MessageUpdate, PresenceUpdate, TransportEvent, classify_disconnect,
};
pub use message::{
    ContentType, GroupMetadata, GroupParticipant, MessageKey, NewsletterMetadata,
    NormalizedMessage, OutboundContent, OutboundMessage, QuotedMessage, RawMessage,
};
pub use traits::{EventStream, Transport};
pub use types::{AuthorizationTier, ConnectionState, DisconnectClass, PresenceKind, format_uptime};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn fatal_errors_match_taxonomy() {
        assert!(VortexError::InvalidFormat("x".into()).is_fatal());
        assert!(VortexError::MissingCredentials.is_fatal());
        assert!(VortexError::LoggedOut.is_fatal());
        assert!(VortexError::DuplicatePattern { pattern: "ping".into() }.is_fatal());
        assert!(VortexError::Config("bad".into()).is_fatal());

        assert!(!VortexError::transport("socket closed").is_fatal());
        assert!(!VortexError::storage(std::io::Error::other("disk")).is_fatal());
        assert!(
            !VortexError::Handler {
                command: "ping".into(),
                message: "boom".into()
            }
            .is_fatal()
        );
        assert!(
            !VortexError::Timeout {
                duration: std::time::Duration::from_secs(30)
            }
            .is_fatal()
        );
        assert!(!VortexError::Internal("x".into()).is_fatal());
    }

    #[test]
    fn tier_ranks_are_ordered() {
        use AuthorizationTier::*;
        assert!(Member < GroupAdmin && GroupAdmin < Delegated && Delegated < Owner);
        assert!(Owner.satisfies(Delegated));
        assert!(Delegated.satisfies(Delegated));
        assert!(!GroupAdmin.satisfies(Delegated));
        assert!(Member.satisfies(Member));
    }

    #[test]
    fn tier_display_and_parse_round_trip() {
        for tier in [
            AuthorizationTier::Member,
            AuthorizationTier::GroupAdmin,
            AuthorizationTier::Delegated,
            AuthorizationTier::Owner,
        ] {
            let s = tier.to_string();
            assert_eq!(AuthorizationTier::from_str(&s).unwrap(), tier);
        }
        assert_eq!(AuthorizationTier::GroupAdmin.to_string(), "group-admin");
    }

    #[test]
    fn active_connection_states() {
        assert!(!ConnectionState::Disconnected.is_active());
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::AwaitingPairing.is_active());
        assert!(ConnectionState::Open.is_active());
        assert!(!ConnectionState::Closing.is_active());
    }

    #[test]
    fn presence_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PresenceKind::Composing).unwrap(),
            "\"composing\""
        );
        assert_eq!(PresenceKind::from_str("recording").unwrap(), PresenceKind::Recording);
    }
}
