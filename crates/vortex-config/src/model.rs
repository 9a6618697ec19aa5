// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vortex agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level Vortex configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with `VORTEX_*` and
/// legacy flat environment variable overrides. Every section defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VortexConfig {
    /// Session token and credential storage.
    #[serde(default)]
    pub session: SessionConfig,

    /// Bot identity, command prefix and owners.
    #[serde(default)]
    pub bot: BotConfig,

    /// Automatic behaviors (read receipts, status handling, anti-call).
    #[serde(default)]
    pub automation: AutomationConfig,

    /// Side effects run when the connection opens.
    #[serde(default)]
    pub startup: StartupConfig,

    /// Deleted-message tracking.
    #[serde(default)]
    pub antidelete: AntiDeleteConfig,

    /// Simulated presence.
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Protocol sidecar connection.
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Session token and credential file settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Portable session token (`<marker>:~<base64>`). `None` falls back to
    /// the credential file or interactive pairing. A blank value counts as
    /// unset.
    #[serde(default, deserialize_with = "non_blank")]
    pub id: Option<String>,

    /// Token marker expected before `:~`.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Directory holding `creds.json`.
    #[serde(default = "default_session_dir")]
    pub dir: String,

    /// Offer phone-number pairing instead of a QR code.
    #[serde(default)]
    pub pairing_code: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id: None,
            marker: default_marker(),
            dir: default_session_dir(),
            pairing_code: false,
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("id", &self.id.as_ref().map(|_| "[REDACTED]"))
            .field("marker", &self.marker)
            .field("dir", &self.dir)
            .field("pairing_code", &self.pairing_code)
            .finish()
    }
}

fn default_marker() -> String {
    "kc".to_string()
}

fn default_session_dir() -> String {
    "./sessions".to_string()
}

/// Bot identity and command settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in notices and the menu.
    #[serde(default = "default_bot_name")]
    pub name: String,

    #[serde(default = "default_owner_name")]
    pub owner_name: String,

    /// Command prefix.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// `public` answers everyone; `private` only delegated users and owners.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Owner phone numbers. Accepts strings, bare numbers, or a comma list.
    #[serde(default, deserialize_with = "phone_list")]
    pub owner_numbers: Vec<String>,

    /// Developer number with owner rights.
    #[serde(default, deserialize_with = "optional_phone")]
    pub dev: Option<String>,

    /// JSON array of delegated user numbers.
    #[serde(default = "default_delegates_path")]
    pub delegates_path: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            owner_name: default_owner_name(),
            prefix: default_prefix(),
            mode: default_mode(),
            owner_numbers: Vec::new(),
            dev: None,
            delegates_path: default_delegates_path(),
            log_level: default_log_level(),
        }
    }
}

impl BotConfig {
    pub fn is_private(&self) -> bool {
        self.mode.eq_ignore_ascii_case("private")
    }

    /// Owner numbers plus the developer number, digits only.
    pub fn owner_digits(&self) -> Vec<String> {
        self.owner_numbers
            .iter()
            .chain(self.dev.iter())
            .map(|n| n.chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

fn default_bot_name() -> String {
    "KC".to_string()
}

fn default_owner_name() -> String {
    "KC".to_string()
}

fn default_prefix() -> String {
    ".".to_string()
}

fn default_mode() -> String {
    "public".to_string()
}

fn default_delegates_path() -> String {
    "./lib/sudo.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Automatic behaviors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationConfig {
    /// Reject incoming calls and answer with `reject_message`.
    #[serde(default)]
    pub anti_call: bool,

    #[serde(default = "default_reject_message")]
    pub reject_message: String,

    /// Send read receipts for every inbound message.
    #[serde(default)]
    pub read_message: bool,

    /// Mark status posts as seen.
    #[serde(default = "default_true")]
    pub auto_status_seen: bool,

    /// React to status posts with a random emoji.
    #[serde(default)]
    pub auto_status_react: bool,

    /// Reply privately to status posters.
    #[serde(default)]
    pub auto_status_reply: bool,

    #[serde(default = "default_status_message")]
    pub auto_status_msg: String,

    /// Emojis picked from for status reactions.
    #[serde(default = "default_status_emojis")]
    pub status_emojis: Vec<String>,

    /// React to posts of the followed newsletters.
    #[serde(default = "default_true")]
    pub newsletter_react: bool,

    #[serde(default = "default_newsletter_emojis")]
    pub newsletter_emojis: Vec<String>,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            anti_call: false,
            reject_message: default_reject_message(),
            read_message: false,
            auto_status_seen: true,
            auto_status_react: false,
            auto_status_reply: false,
            auto_status_msg: default_status_message(),
            status_emojis: default_status_emojis(),
            newsletter_react: true,
            newsletter_emojis: default_newsletter_emojis(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_reject_message() -> String {
    "*Busy, call later*".to_string()
}

fn default_status_message() -> String {
    "*Seen your status*".to_string()
}

fn default_status_emojis() -> Vec<String> {
    [
        "❤️", "💸", "😇", "🍂", "💥", "💯", "🔥", "💫", "💎", "💗", "🤍", "🖤", "👀", "🙌", "🙆",
        "🚩", "🥰", "💐", "👏", "🤎", "✅", "🫀", "🧡", "😶", "🥹", "🌸", "🕊️", "🌷", "⛅", "🌟",
        "🥺", "💜", "💙", "🌝", "💚",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_newsletter_emojis() -> Vec<String> {
    ["😂", "🥺", "👍", "☺️", "🥹", "♥️", "🩵"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Startup side effects.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StartupConfig {
    /// Send a connection notice to the bot's own chat.
    #[serde(default = "default_true")]
    pub announce: bool,

    /// Newsletters to follow once connected.
    #[serde(default = "default_newsletters")]
    pub newsletters: Vec<String>,

    /// Group invite codes to accept once connected.
    #[serde(default)]
    pub group_invites: Vec<String>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            announce: true,
            newsletters: default_newsletters(),
            group_invites: Vec::new(),
        }
    }
}

fn default_newsletters() -> Vec<String> {
    vec!["120363401297349965@newsletter".to_string()]
}

/// Deleted-message tracking.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AntiDeleteConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of tracked messages.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Records older than this are evicted.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    /// `owner` forwards recovered messages to the bot's own chat, `chat`
    /// posts them back where they were deleted.
    #[serde(default = "default_forward_to")]
    pub forward_to: String,

    /// JSON snapshot written on shutdown and restored on start.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl Default for AntiDeleteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_capacity(),
            max_age_secs: default_max_age_secs(),
            forward_to: default_forward_to(),
            snapshot_path: None,
        }
    }
}

fn default_capacity() -> usize {
    10_000
}

fn default_max_age_secs() -> u64 {
    48 * 60 * 60
}

fn default_forward_to() -> String {
    "owner".to_string()
}

/// Simulated presence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceConfig {
    /// Keep announcing `available`.
    #[serde(default)]
    pub always_online: bool,

    /// Show `composing` in chats the bot is answering.
    #[serde(default)]
    pub auto_typing: bool,

    /// Show `recording` in chats the bot is answering.
    #[serde(default)]
    pub auto_recording: bool,

    /// How long an activity presence lasts before pausing.
    #[serde(default = "default_dwell_secs")]
    pub dwell_secs: u64,

    /// Transitions allowed per window, across all chats.
    #[serde(default = "default_max_transitions")]
    pub max_transitions: usize,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            always_online: false,
            auto_typing: false,
            auto_recording: false,
            dwell_secs: default_dwell_secs(),
            max_transitions: default_max_transitions(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_dwell_secs() -> u64 {
    5
}

fn default_max_transitions() -> usize {
    20
}

fn default_window_secs() -> u64 {
    60
}

/// Protocol sidecar connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// WebSocket URL of the sidecar.
    #[serde(default = "default_transport_url")]
    pub url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fixed delay before reconnecting after a transient close.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: default_transport_url(),
            request_timeout_secs: default_request_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

fn default_transport_url() -> String {
    "ws://127.0.0.1:8787/ws".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

/// A phone number as written in TOML or parsed from the environment.
#[derive(Deserialize)]
#[serde(untagged)]
enum PhoneValue {
    Text(String),
    Number(u64),
}

impl PhoneValue {
    fn into_numbers(self) -> Vec<String> {
        match self {
            PhoneValue::Number(n) => vec![n.to_string()],
            PhoneValue::Text(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhoneListValue {
    One(PhoneValue),
    Many(Vec<PhoneValue>),
}

const PHONE_LIST_EXPECTED: &str =
    "expected a phone number, a comma-separated string of numbers, or a list of them";

fn phone_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = PhoneListValue::deserialize(deserializer)
        .map_err(|_| D::Error::custom(PHONE_LIST_EXPECTED))?;
    Ok(match value {
        PhoneListValue::One(value) => value.into_numbers(),
        PhoneListValue::Many(values) => values
            .into_iter()
            .flat_map(PhoneValue::into_numbers)
            .collect(),
    })
}

fn optional_phone<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<PhoneValue>::deserialize(deserializer)
        .map_err(|_| D::Error::custom("expected a phone number"))?
        .and_then(|value| value.into_numbers().into_iter().next()))
}

fn non_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|value| !value.trim().is_empty()))
}
