// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary to the chat-protocol library.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::credentials::SessionCredentials;
use crate::error::VortexError;
use crate::event::TransportEvent;
use crate::message::{GroupMetadata, MessageKey, NewsletterMetadata, OutboundMessage};
use crate::types::PresenceKind;

/// Stream of events for one connection. It ends when the connection is gone.
pub type EventStream = mpsc::Receiver<TransportEvent>;

/// A chat-protocol connection.
///
/// Implementations own socket handling, encryption and protocol framing.
/// The agent drives them through `open`/`close` and consumes the returned
/// [`EventStream`]; every other method is a request against the live
/// connection and fails with [`VortexError::Transport`] when there is none.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Starts a connection using `credentials` and returns its event stream.
    async fn open(&self, credentials: SessionCredentials) -> Result<EventStream, VortexError>;

    /// Closes the current connection, if any.
    async fn close(&self) -> Result<(), VortexError>;

    /// Identity of the logged-in account once the connection is open.
    fn own_id(&self) -> Option<String>;

    /// Requests a pairing code for `phone` (digits only).
    async fn request_pairing_code(&self, phone: &str) -> Result<String, VortexError>;

    async fn send_message(&self, message: OutboundMessage) -> Result<MessageKey, VortexError>;

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, VortexError>;

    /// Joins a group through an invite code. Returns the group identifier.
    async fn accept_group_invite(&self, code: &str) -> Result<String, VortexError>;

    async fn newsletter_metadata(&self, newsletter_id: &str)
    -> Result<NewsletterMetadata, VortexError>;

    async fn follow_newsletter(&self, newsletter_id: &str) -> Result<(), VortexError>;

    async fn react_to_newsletter(
        &self,
        newsletter_id: &str,
        server_id: &str,
        emoji: &str,
    ) -> Result<(), VortexError>;

    async fn reject_call(&self, call_id: &str, caller: &str) -> Result<(), VortexError>;

    /// Sends read receipts.
    async fn read_messages(&self, keys: &[MessageKey]) -> Result<(), VortexError>;

    /// Publishes a presence, globally when `chat_id` is `None`.
    async fn send_presence(
        &self,
        presence: PresenceKind,
        chat_id: Option<&str>,
    ) -> Result<(), VortexError>;
}
