// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for chat identifiers (`<user>[:<device>]@<server>`).

/// Server part of individual user identifiers.
pub const USER_SERVER: &str = "s.whatsapp.net";

/// Pseudo-chat that carries status posts.
pub const STATUS_BROADCAST: &str = "status@broadcast";

const GROUP_SUFFIX: &str = "@g.us";
const NEWSLETTER_SUFFIX: &str = "@newsletter";

/// Whether the identifier names a group chat.
pub fn is_group(jid: &str) -> bool {
    jid.ends_with(GROUP_SUFFIX)
}

/// Whether the identifier is the status broadcast pseudo-chat.
pub fn is_status(jid: &str) -> bool {
    jid == STATUS_BROADCAST
}

/// Whether the identifier names a newsletter channel.
pub fn is_newsletter(jid: &str) -> bool {
    jid.ends_with(NEWSLETTER_SUFFIX)
}

/// The user part of an identifier, without device suffix or server.
///
/// `"2349:12@s.whatsapp.net"` -> `"2349"`; a bare number is returned as is.
pub fn user_part(jid: &str) -> &str {
    let user = jid.split_once('@').map(|(user, _)| user).unwrap_or(jid);
    user.split_once(':').map(|(user, _)| user).unwrap_or(user)
}

/// Strips any device suffix: `"2349:12@s.whatsapp.net"` -> `"2349@s.whatsapp.net"`.
pub fn normalize(jid: &str) -> String {
    match jid.split_once('@') {
        Some((_, server)) => format!("{}@{server}", user_part(jid)),
        None => user_part(jid).to_string(),
    }
}

/// Keeps only the ASCII digits of a phone number as typed by a human.
pub fn phone_digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Builds a user identifier from a phone number in any notation.
pub fn from_number(number: &str) -> String {
    format!("{}@{USER_SERVER}", phone_digits(number))
}

/// Whether two identifiers refer to the same account, ignoring devices.
pub fn same_user(a: &str, b: &str) -> bool {
    let (a, b) = (user_part(a), user_part(b));
    !a.is_empty() && a == b
}
