// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic testing.
//!
//! `MockTransport` implements `Transport` with injectable events and captured
//! outbound traffic for assertion in tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use vortex_core::{
    ConnectionUpdate, EventStream, GroupMetadata, MessageKey, NewsletterMetadata,
    OutboundMessage, PresenceKind, SessionCredentials, Transport, TransportEvent, VortexError,
};

/// How long the `wait_for_*` helpers wait before panicking.
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the agent asked the transport to do, besides sending messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportCalls {
    pub pairing_requests: Vec<String>,
    pub followed_newsletters: Vec<String>,
    pub accepted_invites: Vec<String>,
    pub newsletter_reactions: Vec<(String, String, String)>,
    pub rejected_calls: Vec<(String, String)>,
    pub read_keys: Vec<MessageKey>,
    pub presences: Vec<(PresenceKind, Option<String>)>,
    pub group_lookups: Vec<String>,
}

/// A scripted chat-protocol connection.
///
/// - **events**: injected with [`emit`](Self::emit) into the stream returned by `open()`
/// - **sent**: messages passed to `send_message()`, retrievable via [`sent_messages`](Self::sent_messages)
pub struct MockTransport {
    events: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    opened_with: Mutex<Vec<SessionCredentials>>,
    open_count: AtomicUsize,
    close_count: AtomicUsize,
    fail_next_opens: AtomicUsize,
    own_id: Mutex<Option<String>>,
    groups: Mutex<HashMap<String, GroupMetadata>>,
    newsletters: Mutex<HashMap<String, NewsletterMetadata>>,
    failing: Mutex<HashSet<String>>,
    fail_sends: AtomicBool,
    pairing_code: Mutex<String>,
    sent: Mutex<Vec<OutboundMessage>>,
    calls: Mutex<TransportCalls>,
    notify: Notify,
}

impl MockTransport {
    /// Create a mock with no groups, no newsletters and own id `10000@s.whatsapp.net`.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(None),
            opened_with: Mutex::new(Vec::new()),
            open_count: AtomicUsize::new(0),
            close_count: AtomicUsize::new(0),
            fail_next_opens: AtomicUsize::new(0),
            own_id: Mutex::new(Some("10000:7@s.whatsapp.net".to_string())),
            groups: Mutex::new(HashMap::new()),
            newsletters: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            fail_sends: AtomicBool::new(false),
            pairing_code: Mutex::new("ABCDEFGH".to_string()),
            sent: Mutex::new(Vec::new()),
            calls: Mutex::new(TransportCalls::default()),
            notify: Notify::new(),
        }
    }

    pub fn with_own_id(self, own_id: Option<&str>) -> Self {
        *lock(&self.own_id) = own_id.map(String::from);
        self
    }

    pub fn with_group(self, metadata: GroupMetadata) -> Self {
        lock(&self.groups).insert(metadata.id.clone(), metadata);
        self
    }

    pub fn with_newsletter(self, metadata: NewsletterMetadata) -> Self {
        lock(&self.newsletters).insert(metadata.id.clone(), metadata);
        self
    }

    /// Any request naming `target` (group, newsletter, invite code) fails.
    pub fn failing_for(self, target: &str) -> Self {
        lock(&self.failing).insert(target.to_string());
        self
    }

    pub fn with_pairing_code(self, code: &str) -> Self {
        *lock(&self.pairing_code) = code.to_string();
        self
    }

    /// The next `count` calls to `open()` fail with a transport error.
    pub fn fail_next_opens(&self, count: usize) {
        self.fail_next_opens.store(count, Ordering::SeqCst);
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Injects an event into the current connection's stream.
    ///
    /// Returns `false` if there is no open stream.
    pub async fn emit(&self, event: TransportEvent) -> bool {
        let sender = lock(&self.events).clone();
        match sender {
            Some(sender) => sender.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Reports a close with `status_code` and ends the current stream.
    pub async fn drop_connection(&self, status_code: Option<u16>) {
        self.emit(TransportEvent::ConnectionUpdate(ConnectionUpdate::closed(
            status_code,
        )))
        .await;
        lock(&self.events).take();
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn opened_with(&self) -> Vec<SessionCredentials> {
        lock(&self.opened_with).clone()
    }

    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        lock(&self.sent).clone()
    }

    /// Texts of all sent text messages, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent_messages()
            .into_iter()
            .filter_map(|m| match m.content {
                vortex_core::OutboundContent::Text { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> TransportCalls {
        lock(&self.calls).clone()
    }

    pub fn clear_sent(&self) {
        lock(&self.sent).clear();
    }

    /// Waits until at least `count` messages were sent.
    ///
    /// # Panics
    ///
    /// Panics if the count is not reached within five seconds.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<OutboundMessage> {
        self.wait_until(|mock| mock.sent_messages().len() >= count)
            .await;
        self.sent_messages()
    }

    /// Waits until `open()` was called at least `count` times.
    pub async fn wait_for_opens(&self, count: usize) {
        self.wait_until(|mock| mock.open_count() >= count).await;
    }

    /// Waits until `predicate` holds, re-checking after every recorded call.
    pub async fn wait_until(&self, predicate: impl Fn(&Self) -> bool) {
        let result = tokio::time::timeout(WAIT_TIMEOUT, async {
            loop {
                let notified = self.notify.notified();
                if predicate(self) {
                    return;
                }
                notified.await;
            }
        })
        .await;
        assert!(result.is_ok(), "condition not reached within {WAIT_TIMEOUT:?}");
    }

    fn record(&self, apply: impl FnOnce(&mut TransportCalls)) {
        apply(&mut lock(&self.calls));
        self.notify.notify_waiters();
    }

    fn check(&self, target: &str) -> Result<(), VortexError> {
        if lock(&self.failing).contains(target) {
            return Err(VortexError::transport(format!("mock failure for {target}")));
        }
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(&self, credentials: SessionCredentials) -> Result<EventStream, VortexError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.opened_with).push(credentials);

        let should_fail = self
            .fail_next_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        self.notify.notify_waiters();
        if should_fail {
            return Err(VortexError::transport("mock open failure"));
        }

        let (tx, rx) = mpsc::channel(64);
        *lock(&self.events) = Some(tx);
        Ok(rx)
    }

    async fn close(&self) -> Result<(), VortexError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.events).take();
        self.notify.notify_waiters();
        Ok(())
    }

    fn own_id(&self) -> Option<String> {
        lock(&self.own_id).clone()
    }

    async fn request_pairing_code(&self, phone: &str) -> Result<String, VortexError> {
        self.record(|c| c.pairing_requests.push(phone.to_string()));
        Ok(lock(&self.pairing_code).clone())
    }

    async fn send_message(&self, message: OutboundMessage) -> Result<MessageKey, VortexError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(VortexError::transport("mock send failure"));
        }
        let key = MessageKey {
            remote_jid: message.chat_id.clone(),
            from_me: true,
            id: format!("MOCK{}", lock(&self.sent).len()),
            participant: None,
        };
        lock(&self.sent).push(message);
        self.notify.notify_waiters();
        Ok(key)
    }

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, VortexError> {
        self.record(|c| c.group_lookups.push(group_id.to_string()));
        self.check(group_id)?;
        lock(&self.groups)
            .get(group_id)
            .cloned()
            .ok_or_else(|| VortexError::transport(format!("unknown group {group_id}")))
    }

    async fn accept_group_invite(&self, code: &str) -> Result<String, VortexError> {
        self.check(code)?;
        self.record(|c| c.accepted_invites.push(code.to_string()));
        Ok(format!("{code}@g.us"))
    }

    async fn newsletter_metadata(
        &self,
        newsletter_id: &str,
    ) -> Result<NewsletterMetadata, VortexError> {
        self.check(newsletter_id)?;
        Ok(lock(&self.newsletters)
            .get(newsletter_id)
            .cloned()
            .unwrap_or_else(|| NewsletterMetadata {
                id: newsletter_id.to_string(),
                viewer_metadata: None,
            }))
    }

    async fn follow_newsletter(&self, newsletter_id: &str) -> Result<(), VortexError> {
        self.check(newsletter_id)?;
        self.record(|c| c.followed_newsletters.push(newsletter_id.to_string()));
        Ok(())
    }

    async fn react_to_newsletter(
        &self,
        newsletter_id: &str,
        server_id: &str,
        emoji: &str,
    ) -> Result<(), VortexError> {
        self.check(newsletter_id)?;
        self.record(|c| {
            c.newsletter_reactions.push((
                newsletter_id.to_string(),
                server_id.to_string(),
                emoji.to_string(),
            ))
        });
        Ok(())
    }

    async fn reject_call(&self, call_id: &str, caller: &str) -> Result<(), VortexError> {
        self.record(|c| {
            c.rejected_calls
                .push((call_id.to_string(), caller.to_string()))
        });
        Ok(())
    }

    async fn read_messages(&self, keys: &[MessageKey]) -> Result<(), VortexError> {
        self.record(|c| c.read_keys.extend_from_slice(keys));
        Ok(())
    }

    async fn send_presence(
        &self,
        presence: PresenceKind,
        chat_id: Option<&str>,
    ) -> Result<(), VortexError> {
        self.record(|c| c.presences.push((presence, chat_id.map(String::from))));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vortex_core::{ConnectionPhase, GroupParticipant};

    #[tokio::test]
    async fn emit_reaches_open_stream() {
        let mock = MockTransport::new();
        let mut events = mock.open(SessionCredentials::fresh()).await.unwrap();

        assert!(
            mock.emit(TransportEvent::ConnectionUpdate(ConnectionUpdate::open()))
                .await
        );
        match events.recv().await {
            Some(TransportEvent::ConnectionUpdate(update)) => {
                assert_eq!(update.connection, Some(ConnectionPhase::Open));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn drop_connection_ends_stream() {
        let mock = MockTransport::new();
        let mut events = mock.open(SessionCredentials::fresh()).await.unwrap();
        mock.drop_connection(Some(428)).await;

        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::ConnectionUpdate(_))
        ));
        assert!(events.recv().await.is_none());
        assert!(!mock.emit(TransportEvent::MessagesUpsert(vec![])).await);
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let mock = MockTransport::new();
        let key = mock
            .send_message(OutboundMessage::text("1@s.whatsapp.net", "hello"))
            .await
            .unwrap();
        assert!(key.from_me);
        assert_eq!(mock.sent_texts(), vec!["hello"]);
    }

    #[tokio::test]
    async fn failing_targets_error() {
        let mock = MockTransport::new()
            .with_group(GroupMetadata {
                id: "1@g.us".into(),
                subject: "ok".into(),
                participants: vec![GroupParticipant {
                    id: "5@s.whatsapp.net".into(),
                    admin: Some("admin".into()),
                }],
            })
            .failing_for("2@g.us");
        assert!(mock.group_metadata("1@g.us").await.is_ok());
        assert!(mock.group_metadata("2@g.us").await.is_err());
        assert_eq!(mock.calls().group_lookups, vec!["1@g.us", "2@g.us"]);
    }

    #[tokio::test]
    async fn open_failures_are_counted_down() {
        let mock = MockTransport::new();
        mock.fail_next_opens(1);
        assert!(mock.open(SessionCredentials::fresh()).await.is_err());
        assert!(mock.open(SessionCredentials::fresh()).await.is_ok());
        assert_eq!(mock.open_count(), 2);
    }
}
