// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment extraction failures are traced back to where the setting was
//! written: a line of a `vortex.toml`, or a `VORTEX_*` or legacy flat
//! environment variable. Unknown keys are matched against the section key
//! tables below, so a key placed under the wrong section is pointed to its
//! real home.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::fmt;

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::loader::LEGACY_ENV_KEYS;

/// Source name used for TOML passed in as a string.
pub const INLINE_SOURCE: &str = "<inline>";

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Keys accepted in each `vortex.toml` section.
pub const SECTION_KEYS: &[(&str, &[&str])] = &[
    ("session", &["id", "marker", "dir", "pairing_code"]),
    (
        "bot",
        &[
            "name",
            "owner_name",
            "prefix",
            "mode",
            "owner_numbers",
            "dev",
            "delegates_path",
            "log_level",
        ],
    ),
    (
        "automation",
        &[
            "anti_call",
            "reject_message",
            "read_message",
            "auto_status_seen",
            "auto_status_react",
            "auto_status_reply",
            "auto_status_msg",
            "status_emojis",
            "newsletter_react",
            "newsletter_emojis",
        ],
    ),
    ("startup", &["announce", "newsletters", "group_invites"]),
    (
        "antidelete",
        &["enabled", "capacity", "max_age_secs", "forward_to", "snapshot_path"],
    ),
    (
        "presence",
        &[
            "always_online",
            "auto_typing",
            "auto_recording",
            "dwell_secs",
            "max_transitions",
            "window_secs",
        ],
    ),
    (
        "transport",
        &["url", "request_timeout_secs", "reconnect_delay_secs"],
    ),
];

/// Where an offending setting was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    File(String),
    Inline,
    Env(String),
    Unknown,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => write!(f, "`{path}`"),
            Origin::Inline => f.write_str("inline configuration"),
            Origin::Env(name) => write!(f, "environment variable `{name}`"),
            Origin::Unknown => f.write_str("configuration"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section of the config accepts at this position.
    #[error("unknown key `{key}` in {origin}")]
    #[diagnostic(
        code(vortex::config::unknown_key),
        help("{}", unknown_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted path, e.g. `bot.prefx`.
        key: String,
        origin: Origin,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("unknown key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unknown section `{section}` in {origin}")]
    #[diagnostic(
        code(vortex::config::unknown_section),
        help("{}", unknown_help(suggestion.as_deref(), valid_sections))
    )]
    UnknownSection {
        section: String,
        origin: Origin,
        suggestion: Option<String>,
        valid_sections: String,
        #[label("unknown section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the expected type.
    #[error("invalid value for `{key}` in {origin}: {detail}")]
    #[diagnostic(code(vortex::config::invalid_value), help("{}", hint))]
    InvalidValue {
        key: String,
        origin: Origin,
        detail: String,
        hint: String,
        #[label("rejected value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("validation error: {message}")]
    #[diagnostic(code(vortex::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(vortex::config::other))]
    Other(String),
}

fn unknown_help(suggestion: Option<&str>, valid: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid here: {valid}"),
        None => format!("valid here: {valid}"),
    }
}

/// Keys of `section`, if it is a known section.
pub fn section_keys(section: &str) -> Option<&'static [&'static str]> {
    SECTION_KEYS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, keys)| *keys)
}

fn section_names() -> impl Iterator<Item = &'static str> {
    SECTION_KEYS.iter().map(|(name, _)| *name)
}

/// The section that owns `key`, if exactly one does.
fn home_section(key: &str) -> Option<&'static str> {
    let mut owners = SECTION_KEYS
        .iter()
        .filter(|(_, keys)| keys.contains(&key))
        .map(|(name, _)| *name);
    match (owners.next(), owners.next()) {
        (Some(section), None) => Some(section),
        _ => None,
    }
}

/// Closest candidate to `unknown` by Jaro-Winkler similarity.
pub fn suggest<'a>(unknown: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate)
}

/// Converts every error in a figment failure into a diagnostic.
///
/// `toml_sources` holds `(name, content)` pairs of the TOML files that were
/// merged, used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, toml_sources))
        .collect()
}

fn convert(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    let path: Vec<&str> = error.path.iter().map(String::as_str).collect();
    match &error.kind {
        Kind::UnknownField(field, _) => match path.first() {
            Some(section) => unknown_key(error, section, field, sources),
            None => unknown_top_level(error, field, sources),
        },
        Kind::InvalidType(..)
        | Kind::InvalidValue(..)
        | Kind::InvalidLength(..)
        | Kind::Message(_)
            if path.len() >= 2 =>
        {
            invalid_value(error, &path, sources)
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

fn unknown_key(
    error: &figment::Error,
    section: &str,
    key: &str,
    sources: &[(String, String)],
) -> ConfigError {
    let valid = section_keys(section).unwrap_or_default();
    let placed = place(
        error,
        &[section, key],
        Target::Key {
            section: Some(section),
            key,
        },
        sources,
    );
    let from_env = matches!(placed.origin, Origin::Env(_));

    let suggestion = match home_section(key).filter(|home| *home != section) {
        Some(home) if from_env => Some(prefixed_env_name(&[home, key])),
        Some(home) => Some(format!("[{home}] {key}")),
        None => suggest(key, valid.iter().copied()).map(|candidate| {
            if from_env {
                prefixed_env_name(&[section, candidate])
            } else {
                candidate.to_string()
            }
        }),
    };

    ConfigError::UnknownKey {
        key: format!("{section}.{key}"),
        origin: placed.origin,
        suggestion,
        valid_keys: valid.join(", "),
        span: placed.span,
        src: placed.src,
    }
}

/// An unknown name at the top level: a misspelled section header, or a key
/// written before any header.
fn unknown_top_level(
    error: &figment::Error,
    name: &str,
    sources: &[(String, String)],
) -> ConfigError {
    let valid_sections = section_names().collect::<Vec<_>>().join(", ");

    if let Some(home) = home_section(name) {
        let placed = place(
            error,
            &[name],
            Target::Key {
                section: None,
                key: name,
            },
            sources,
        );
        return ConfigError::UnknownKey {
            key: name.to_string(),
            origin: placed.origin,
            suggestion: Some(format!("[{home}] {name}")),
            valid_keys: valid_sections,
            span: placed.span,
            src: placed.src,
        };
    }

    let placed = place(error, &[name], Target::Header(name), sources);
    let from_env = matches!(placed.origin, Origin::Env(_));
    let suggestion = suggest(name, section_names()).map(|section| {
        if from_env {
            format!("VORTEX_{}_...", section.to_ascii_uppercase())
        } else {
            section.to_string()
        }
    });
    ConfigError::UnknownSection {
        section: name.to_string(),
        origin: placed.origin,
        suggestion,
        valid_sections,
        span: placed.span,
        src: placed.src,
    }
}

fn invalid_value(
    error: &figment::Error,
    path: &[&str],
    sources: &[(String, String)],
) -> ConfigError {
    let key = path.join(".");
    let placed = place(
        error,
        path,
        Target::Value {
            section: path[0],
            key: path[1],
        },
        sources,
    );
    let detail = match &error.kind {
        Kind::Message(message) => message.clone(),
        kind => kind.to_string(),
    };
    ConfigError::InvalidValue {
        hint: value_hint(&key),
        key,
        origin: placed.origin,
        detail,
        span: placed.span,
        src: placed.src,
    }
}

fn value_hint(key: &str) -> String {
    match key {
        "bot.owner_numbers" => {
            "use a number, a comma-separated string of numbers, or a list of them".to_string()
        }
        "bot.dev" => "use a single phone number".to_string(),
        "session.id" => "use the `<marker>:~<base64>` token printed by `vortex session encode`"
            .to_string(),
        "session.pairing_code" => "use `true` or `false`".to_string(),
        _ if key.ends_with("_secs") => "use a whole number of seconds".to_string(),
        _ => match key.split_once('.').and_then(|(section, _)| section_keys(section)) {
            Some(_) => format!("see the `{key}` entry in the example vortex.toml"),
            None => format!("remove or correct `{key}`"),
        },
    }
}

struct Placement {
    origin: Origin,
    span: Option<SourceSpan>,
    src: Option<NamedSource<String>>,
}

impl Placement {
    fn bare(origin: Origin) -> Self {
        Self {
            origin,
            span: None,
            src: None,
        }
    }
}

/// Works out where the setting at `path` came from.
///
/// Environment metadata wins. Otherwise the TOML sources are searched,
/// starting with the file figment attributes the error to; failing that,
/// a set environment variable for the path is assumed to be the culprit.
fn place(
    error: &figment::Error,
    path: &[&str],
    target: Target<'_>,
    sources: &[(String, String)],
) -> Placement {
    let metadata = error.metadata.as_ref();
    if let Some(metadata) = metadata
        && metadata.name.contains("environment")
    {
        let name = if metadata.name.contains("VORTEX_") {
            prefixed_env_name(path)
        } else {
            legacy_env_name(path)
                .map(str::to_string)
                .unwrap_or_else(|| prefixed_env_name(path))
        };
        return Placement::bare(Origin::Env(name));
    }

    let attributed = metadata.and_then(|metadata| match &metadata.source {
        Some(figment::Source::File(file)) => Some(file.display().to_string()),
        _ => None,
    });
    let candidates = attributed
        .iter()
        .filter_map(|file| sources.iter().find(|(name, _)| name == file))
        .chain(sources.iter());
    for (name, content) in candidates {
        if let Some(span) = locate(content, target) {
            let origin = if name == INLINE_SOURCE {
                Origin::Inline
            } else {
                Origin::File(name.clone())
            };
            return Placement {
                origin,
                span: Some(span),
                src: Some(NamedSource::new(name, content.clone())),
            };
        }
    }

    let prefixed = prefixed_env_name(path);
    if std::env::var_os(&prefixed).is_some() {
        return Placement::bare(Origin::Env(prefixed));
    }
    match legacy_env_name(path).filter(|name| std::env::var_os(name).is_some()) {
        Some(name) => Placement::bare(Origin::Env(name.to_string())),
        None => Placement::bare(Origin::Unknown),
    }
}

fn prefixed_env_name(path: &[&str]) -> String {
    format!("VORTEX_{}", path.join("_").to_ascii_uppercase())
}

fn legacy_env_name(path: &[&str]) -> Option<&'static str> {
    let dotted = path.join(".");
    LEGACY_ENV_KEYS
        .iter()
        .find(|(_, key)| *key == dotted)
        .map(|(name, _)| *name)
}

/// What to point at inside a TOML document.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Header(&'a str),
    Key {
        section: Option<&'a str>,
        key: &'a str,
    },
    Value {
        section: &'a str,
        key: &'a str,
    },
}

/// Byte span of `target` in `content`.
///
/// Keys only match inside their own section: a `prefix` under `[session]`
/// is not mistaken for the one under `[bot]`.
fn locate(content: &str, target: Target<'_>) -> Option<SourceSpan> {
    let mut line_start = 0;
    let mut current: Option<&str> = None;

    for raw in content.split_inclusive('\n') {
        let start = line_start;
        line_start += raw.len();

        let line = strip_comment(raw.trim_end_matches(['\n', '\r']));
        let indent = line.len() - line.trim_start().len();
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(header) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            let name = header.trim();
            current = Some(name);
            if matches!(target, Target::Header(wanted) if wanted == name) {
                return Some(SourceSpan::new((start + indent).into(), text.len()));
            }
            continue;
        }

        let Some((name, value)) = text.split_once('=') else {
            continue;
        };
        match target {
            Target::Header(_) => {}
            Target::Key { section, key } if current == section && name.trim() == key => {
                return Some(SourceSpan::new((start + indent).into(), key.len()));
            }
            Target::Value { section, key } if current == Some(section) && name.trim() == key => {
                let value = value.trim();
                let offset = text.len() - text[name.len() + 1..].trim_start().len();
                return Some(SourceSpan::new((start + indent + offset).into(), value.len()));
            }
            _ => {}
        }
    }
    None
}

/// Drops a trailing `# comment`, ignoring `#` inside quoted strings.
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    for (index, c) in line.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(open), c) if c == open => quote = None,
            (None, '#') => return &line[..index],
            _ => {}
        }
    }
    line
}

/// Prints every diagnostic to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    if errors.len() > 1 {
        eprintln!("{} configuration problems found", errors.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VortexConfig;

    fn spanned<'a>(content: &'a str, span: SourceSpan) -> &'a str {
        &content[span.offset()..span.offset() + span.len()]
    }

    #[test]
    fn section_tables_match_the_model() {
        let serialized = toml::Value::try_from(VortexConfig::default()).unwrap();
        let table = serialized.as_table().unwrap();
        for (section, keys) in SECTION_KEYS {
            let present = table[*section].as_table().unwrap();
            for key in present.keys() {
                assert!(keys.contains(&key.as_str()), "{section}.{key} missing from table");
            }
            for key in *keys {
                let optional = matches!(*key, "id" | "dev" | "snapshot_path");
                assert!(present.contains_key(*key) || optional, "{section}.{key} not in model");
            }
        }
        assert_eq!(table.len(), SECTION_KEYS.len());
    }

    #[test]
    fn keys_are_located_within_their_own_section() {
        let content = "[session]\nprefix = \"x\"\n\n[bot]\nname = \"KC\"\n  prefix = \"!\"\n";
        let span = locate(
            content,
            Target::Key {
                section: Some("bot"),
                key: "prefix",
            },
        )
        .unwrap();
        assert_eq!(span.offset(), content.rfind("prefix").unwrap());
        assert_eq!(spanned(content, span), "prefix");

        assert!(
            locate(
                content,
                Target::Key {
                    section: Some("presence"),
                    key: "prefix"
                }
            )
            .is_none()
        );
    }

    #[test]
    fn values_and_headers_are_located() {
        let content = "[bot] # identity\nowner_numbers = true # oops\ndev=\"a#b\"\n";
        let value = locate(
            content,
            Target::Value {
                section: "bot",
                key: "owner_numbers",
            },
        )
        .unwrap();
        assert_eq!(spanned(content, value), "true");

        let dev = locate(
            content,
            Target::Value {
                section: "bot",
                key: "dev",
            },
        )
        .unwrap();
        assert_eq!(spanned(content, dev), "\"a#b\"");

        let header = locate(content, Target::Header("bot")).unwrap();
        assert_eq!(spanned(content, header), "[bot]");
    }

    #[test]
    fn suggestions_come_from_the_section_table() {
        let bot = section_keys("bot").unwrap();
        assert_eq!(suggest("prefx", bot.iter().copied()), Some("prefix"));
        assert_eq!(suggest("owner_number", bot.iter().copied()), Some("owner_numbers"));
        assert_eq!(suggest("zzzz", bot.iter().copied()), None);
        assert_eq!(suggest("antidelet", section_names()), Some("antidelete"));
    }

    #[test]
    fn home_section_is_unique_or_none() {
        assert_eq!(home_section("anti_call"), Some("automation"));
        assert_eq!(home_section("marker"), Some("session"));
        assert_eq!(home_section("nope"), None);
    }

    #[test]
    fn legacy_names_map_back_from_paths() {
        assert_eq!(legacy_env_name(&["session", "id"]), Some("SESSION_ID"));
        assert_eq!(legacy_env_name(&["bot", "owner_numbers"]), Some("OWNER_NUMBER"));
        assert_eq!(legacy_env_name(&["presence", "dwell_secs"]), None);
        assert_eq!(
            prefixed_env_name(&["antidelete", "max_age_secs"]),
            "VORTEX_ANTIDELETE_MAX_AGE_SECS"
        );
    }

    #[test]
    fn origins_read_naturally() {
        assert_eq!(
            Origin::Env("SESSION_ID".into()).to_string(),
            "environment variable `SESSION_ID`"
        );
        assert_eq!(Origin::Inline.to_string(), "inline configuration");
    }
}
