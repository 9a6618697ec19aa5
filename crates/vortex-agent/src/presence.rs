// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Simulated activity presence.
//!
//! Each chat moves `idle -> composing|recording -> paused/idle`. Transitions
//! pass through a global sliding-window limiter; a saturated limiter drops
//! them. The controller is pure: the caller supplies the clock and publishes
//! the returned transitions.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use vortex_config::model::PresenceConfig;
use vortex_core::{PresenceKind, PresenceUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Idle,
    Composing,
    Recording,
    Paused,
}

/// A presence to publish, globally when `chat_id` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceTransition {
    pub chat_id: Option<String>,
    pub kind: PresenceKind,
}

#[derive(Debug, Clone)]
pub struct PresenceSettings {
    pub always_online: bool,
    pub auto_typing: bool,
    pub auto_recording: bool,
    pub dwell: Duration,
    pub max_transitions: usize,
    pub window: Duration,
}

impl PresenceSettings {
    pub fn from_config(config: &PresenceConfig) -> Self {
        Self {
            always_online: config.always_online,
            auto_typing: config.auto_typing,
            auto_recording: config.auto_recording,
            dwell: Duration::from_secs(config.dwell_secs),
            max_transitions: config.max_transitions,
            window: Duration::from_secs(config.window_secs),
        }
    }
}

/// Sliding-window counter of emitted transitions.
#[derive(Debug)]
pub struct RateLimiter {
    max: usize,
    window: Duration,
    emitted: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            emitted: VecDeque::new(),
        }
    }

    /// Takes a slot if one is free. Never waits.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.emitted.front() {
            if now.duration_since(oldest) >= self.window {
                self.emitted.pop_front();
            } else {
                break;
            }
        }
        if self.emitted.len() >= self.max {
            return false;
        }
        self.emitted.push_back(now);
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct ChatActivity {
    state: ActivityState,
    since: Instant,
}

pub struct PresenceController {
    settings: PresenceSettings,
    chats: HashMap<String, ChatActivity>,
    limiter: RateLimiter,
}

impl PresenceController {
    pub fn new(settings: PresenceSettings) -> Self {
        let limiter = RateLimiter::new(settings.max_transitions, settings.window);
        Self {
            settings,
            chats: HashMap::new(),
            limiter,
        }
    }

    pub fn state(&self, chat_id: &str) -> ActivityState {
        self.chats
            .get(chat_id)
            .map(|c| c.state)
            .unwrap_or(ActivityState::Idle)
    }

    fn emit(&mut self, chat_id: Option<&str>, kind: PresenceKind, now: Instant) -> Option<PresenceTransition> {
        if !self.limiter.try_acquire(now) {
            debug!(chat_id = ?chat_id, presence = %kind, "presence limiter saturated, dropping");
            return None;
        }
        Some(PresenceTransition {
            chat_id: chat_id.map(String::from),
            kind,
        })
    }

    /// Activity in `chat_id` (an inbound message about to be handled).
    pub fn on_activity(&mut self, chat_id: &str, now: Instant) -> Option<PresenceTransition> {
        let (state, kind) = if self.settings.auto_recording {
            (ActivityState::Recording, PresenceKind::Recording)
        } else if self.settings.auto_typing {
            (ActivityState::Composing, PresenceKind::Composing)
        } else {
            return None;
        };

        if let Some(activity) = self.chats.get_mut(chat_id) {
            if activity.state == state {
                activity.since = now;
                return None;
            }
        }

        let transition = self.emit(Some(chat_id), kind, now)?;
        self.chats
            .insert(chat_id.to_string(), ChatActivity { state, since: now });
        Some(transition)
    }

    /// Returns chats whose dwell time elapsed to idle, publishing `paused`.
    pub fn tick(&mut self, now: Instant) -> Vec<PresenceTransition> {
        let dwell = self.settings.dwell;
        let mut expired: Vec<String> = self
            .chats
            .iter()
            .filter(|(_, a)| now.duration_since(a.since) >= dwell)
            .map(|(chat, _)| chat.clone())
            .collect();
        expired.sort();

        let mut transitions = Vec::new();
        for chat in expired {
            if let Some(activity) = self.chats.get_mut(&chat) {
                activity.state = ActivityState::Paused;
            }
            if let Some(t) = self.emit(Some(&chat), PresenceKind::Paused, now) {
                transitions.push(t);
            }
            self.chats.remove(&chat);
        }
        transitions
    }

    /// A remote presence change. With always-online set, re-asserts `available`.
    pub fn on_presence_update(&mut self, update: &PresenceUpdate, now: Instant) -> Option<PresenceTransition> {
        if !self.settings.always_online {
            return None;
        }
        debug!(chat_id = %update.id, "presence update, re-asserting availability");
        self.emit(None, PresenceKind::Available, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(typing: bool, recording: bool, max: usize) -> PresenceSettings {
        PresenceSettings {
            always_online: true,
            auto_typing: typing,
            auto_recording: recording,
            dwell: Duration::from_secs(5),
            max_transitions: max,
            window: Duration::from_secs(60),
        }
    }

    #[test]
    fn limiter_frees_slots_after_window() {
        let start = Instant::now();
        let mut limiter = RateLimiter::new(2, Duration::from_secs(10));
        assert!(limiter.try_acquire(start));
        assert!(limiter.try_acquire(start));
        assert!(!limiter.try_acquire(start + Duration::from_secs(9)));
        assert!(limiter.try_acquire(start + Duration::from_secs(10)));
    }

    #[test]
    fn disabled_flags_emit_nothing() {
        let mut controller = PresenceController::new(settings(false, false, 10));
        assert!(controller.on_activity("a@s.whatsapp.net", Instant::now()).is_none());
        assert_eq!(controller.state("a@s.whatsapp.net"), ActivityState::Idle);
    }

    #[test]
    fn typing_dwells_then_pauses() {
        let start = Instant::now();
        let mut controller = PresenceController::new(settings(true, false, 10));
        let t = controller.on_activity("a", start).unwrap();
        assert_eq!(t.kind, PresenceKind::Composing);
        assert_eq!(controller.state("a"), ActivityState::Composing);

        // Repeated activity refreshes without re-emitting.
        assert!(controller.on_activity("a", start + Duration::from_secs(3)).is_none());
        assert!(controller.tick(start + Duration::from_secs(6)).is_empty());

        let back = controller.tick(start + Duration::from_secs(8));
        assert_eq!(
            back,
            vec![PresenceTransition {
                chat_id: Some("a".into()),
                kind: PresenceKind::Paused
            }]
        );
        assert_eq!(controller.state("a"), ActivityState::Idle);
    }

    #[test]
    fn recording_wins_over_typing() {
        let mut controller = PresenceController::new(settings(true, true, 10));
        let t = controller.on_activity("a", Instant::now()).unwrap();
        assert_eq!(t.kind, PresenceKind::Recording);
    }

    #[test]
    fn saturated_limiter_drops_transitions() {
        let start = Instant::now();
        let mut controller = PresenceController::new(settings(true, false, 2));
        assert!(controller.on_activity("a", start).is_some());
        assert!(controller.on_activity("b", start).is_some());
        assert!(controller.on_activity("c", start).is_none());
        // Dropped transitions leave the chat idle.
        assert_eq!(controller.state("c"), ActivityState::Idle);
    }

    #[test]
    fn always_online_reasserts_availability() {
        let mut controller = PresenceController::new(settings(false, false, 10));
        let update = PresenceUpdate {
            id: "a@s.whatsapp.net".into(),
            presences: Default::default(),
        };
        let t = controller.on_presence_update(&update, Instant::now()).unwrap();
        assert_eq!(t.kind, PresenceKind::Available);
        assert_eq!(t.chat_id, None);

        let mut quiet = PresenceController::new(PresenceSettings {
            always_online: false,
            ..settings(false, false, 10)
        });
        assert!(quiet.on_presence_update(&update, Instant::now()).is_none());
    }
}
