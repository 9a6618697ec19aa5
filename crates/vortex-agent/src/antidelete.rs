// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message-state tracker for deletion recovery.
//!
//! Every observed message is kept in a bounded, oldest-first window keyed by
//! message id. A deletion event that names a tracked id yields the original
//! snapshot so it can be re-rendered. The event loop owns the tracker; it is
//! never shared.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use vortex_config::model::AntiDeleteConfig;
use vortex_core::{
    ContentType, MessageKey, NormalizedMessage, OutboundMessage, Transport, VortexError,
    format_uptime, jid,
};

/// Snapshot of one observed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedMessageRecord {
    pub message_id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub content_type: ContentType,
    pub text: Option<String>,
    pub content: Value,
    pub first_seen_at: DateTime<Utc>,
}

impl TrackedMessageRecord {
    fn from_message(message: &NormalizedMessage, now: DateTime<Utc>) -> Self {
        Self {
            message_id: message.id.clone(),
            chat_id: message.chat_id.clone(),
            sender_id: message.sender_id.clone(),
            sender_name: message.push_name.clone(),
            content_type: message.content_type,
            text: message.text.clone(),
            content: message.content.clone(),
            first_seen_at: now,
        }
    }
}

/// A tracked message that was deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredDeletion {
    pub record: TrackedMessageRecord,
    pub deleting_actor_id: String,
    /// Chat named by the deletion event. Informational; it may differ from
    /// `record.chat_id`.
    pub reported_chat_id: String,
}

impl RecoveredDeletion {
    pub fn chat_mismatch(&self) -> bool {
        self.reported_chat_id != self.record.chat_id
    }
}

/// Retention bounds. Whichever is hit first evicts the oldest record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub capacity: usize,
    pub max_age: Duration,
}

impl RetentionPolicy {
    pub fn from_config(config: &AntiDeleteConfig) -> Self {
        Self {
            capacity: config.capacity,
            max_age: i64::try_from(config.max_age_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            max_age: Duration::hours(48),
        }
    }
}

/// Bounded window of recently seen messages.
#[derive(Debug)]
pub struct MessageTracker {
    policy: RetentionPolicy,
    records: HashMap<String, TrackedMessageRecord>,
    /// Ids in first-seen order, oldest at the front.
    order: VecDeque<String>,
}

impl MessageTracker {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            records: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, message_id: &str) -> Option<&TrackedMessageRecord> {
        self.records.get(message_id)
    }

    pub fn observe(&mut self, message: &NormalizedMessage) {
        self.observe_at(message, Utc::now());
    }

    /// Records `message` as seen at `now`, then applies the retention policy.
    ///
    /// Re-observing an id overwrites the snapshot but keeps its original
    /// first-seen time and position.
    pub fn observe_at(&mut self, message: &NormalizedMessage, now: DateTime<Utc>) {
        match self.records.get_mut(&message.id) {
            Some(existing) => {
                let first_seen_at = existing.first_seen_at;
                *existing = TrackedMessageRecord::from_message(message, first_seen_at);
            }
            None => {
                self.records.insert(
                    message.id.clone(),
                    TrackedMessageRecord::from_message(message, now),
                );
                self.order.push_back(message.id.clone());
            }
        }
        self.evict(now);
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        // No horizon when the age limit reaches past the representable range.
        let horizon = now.checked_sub_signed(self.policy.max_age);
        while let Some(oldest) = self.order.front() {
            let expired = match self.records.get(oldest) {
                Some(record) => horizon.is_some_and(|horizon| record.first_seen_at < horizon),
                None => true,
            };
            if self.records.len() <= self.policy.capacity && !expired {
                break;
            }
            if let Some(id) = self.order.pop_front() {
                self.records.remove(&id);
            }
        }
    }

    /// Correlates a deletion by message id alone.
    ///
    /// An unknown id is expected (never seen or already evicted) and yields
    /// `None`. A recovered record is released so each deletion reports once.
    pub fn on_deletion_event(
        &mut self,
        message_id: &str,
        chat_id: &str,
        deleting_actor_id: &str,
    ) -> Option<RecoveredDeletion> {
        let record = self.records.remove(message_id)?;
        self.order.retain(|id| id != message_id);
        Some(RecoveredDeletion {
            record,
            deleting_actor_id: jid::normalize(deleting_actor_id),
            reported_chat_id: jid::normalize(chat_id),
        })
    }

    /// Stored content for a `getMessage` retry lookup.
    pub fn lookup_content(&self, message_id: &str) -> Option<Value> {
        self.records.get(message_id).map(|r| r.content.clone())
    }

    /// Writes all records, oldest first, as a JSON array.
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), VortexError> {
        let records: Vec<&TrackedMessageRecord> = self
            .order
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect();
        let json = serde_json::to_vec(&records)
            .map_err(|e| VortexError::Internal(format!("failed to encode tracker snapshot: {e}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(VortexError::storage)?;
        }
        tokio::fs::write(path, json)
            .await
            .map_err(VortexError::storage)?;
        info!(path = %path.display(), records = records.len(), "tracker snapshot saved");
        Ok(())
    }

    /// Restores a snapshot, re-applying `policy`. A missing or unreadable
    /// snapshot yields an empty tracker.
    pub async fn load_snapshot(path: &Path, policy: RetentionPolicy) -> Self {
        let mut tracker = Self::new(policy);
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no tracker snapshot");
                return tracker;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read tracker snapshot");
                return tracker;
            }
        };
        let mut records: Vec<TrackedMessageRecord> = match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt tracker snapshot");
                return tracker;
            }
        };
        records.sort_by_key(|r| r.first_seen_at);
        for record in records {
            if tracker.records.contains_key(&record.message_id) {
                continue;
            }
            tracker.order.push_back(record.message_id.clone());
            tracker.records.insert(record.message_id.clone(), record);
        }
        tracker.evict(Utc::now());
        info!(path = %path.display(), records = tracker.len(), "tracker snapshot restored");
        tracker
    }
}

/// Where recovered deletions are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardTarget {
    /// The bot's own chat.
    Owner,
    /// Back into the chat the message was deleted from.
    Chat,
}

impl ForwardTarget {
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("chat") {
            ForwardTarget::Chat
        } else {
            ForwardTarget::Owner
        }
    }
}

/// Renders recovered deletions and forwards them.
pub struct DeletionNotifier {
    transport: Arc<dyn Transport>,
    target: ForwardTarget,
}

impl DeletionNotifier {
    pub fn new(transport: Arc<dyn Transport>, target: ForwardTarget) -> Self {
        Self { transport, target }
    }

    pub fn render(recovered: &RecoveredDeletion, now: DateTime<Utc>) -> String {
        let record = &recovered.record;
        let age = (now - record.first_seen_at).num_seconds().max(0) as u64;
        let sender = match &record.sender_name {
            Some(name) => format!("{name} (@{})", jid::user_part(&record.sender_id)),
            None => format!("@{}", jid::user_part(&record.sender_id)),
        };
        let body = match &record.text {
            Some(text) if !text.is_empty() => text.clone(),
            _ => format!("[{}]", record.content_type),
        };
        let mut notice = format!(
            "*DELETED MESSAGE*\nFrom: {sender}\nChat: {}\nDeleted by: @{}\nSent: {} ago\n",
            record.chat_id,
            jid::user_part(&recovered.deleting_actor_id),
            format_uptime(age),
        );
        if recovered.chat_mismatch() {
            notice.push_str(&format!("Reported in: {}\n", recovered.reported_chat_id));
        }
        notice.push_str(&format!("\n{body}"));
        notice
    }

    fn destination(&self, recovered: &RecoveredDeletion) -> String {
        match self.target {
            ForwardTarget::Chat => recovered.record.chat_id.clone(),
            ForwardTarget::Owner => self
                .transport
                .own_id()
                .map(|id| jid::normalize(&id))
                .unwrap_or_else(|| recovered.record.chat_id.clone()),
        }
    }

    pub async fn notify(&self, recovered: &RecoveredDeletion) -> Result<MessageKey, VortexError> {
        let chat_id = self.destination(recovered);
        let text = Self::render(recovered, Utc::now());
        self.transport
            .send_message(OutboundMessage::text(chat_id, text))
            .await
    }
}
