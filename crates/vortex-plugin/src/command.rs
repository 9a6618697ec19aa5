// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command grammar: `<prefix><command> [arg ...]`.

use serde::{Deserialize, Serialize};

/// A command parsed out of message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    /// Lower-cased command word. Empty when the text is only the prefix.
    pub command: String,
    pub args: Vec<String>,
    pub raw_text: String,
    pub prefix_used: String,
}

impl CommandInvocation {
    /// Arguments joined by single spaces.
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Parses `text` as a command for `prefix`.
///
/// Returns `None` for empty text and for text not starting with `prefix`.
/// Pure and deterministic.
pub fn parse(text: &str, prefix: &str) -> Option<CommandInvocation> {
    if text.is_empty() {
        return None;
    }
    let body = text.strip_prefix(prefix)?.trim();

    let (word, remainder) = match body.split_once(char::is_whitespace) {
        Some((word, remainder)) => (word, remainder),
        None => (body, ""),
    };

    Some(CommandInvocation {
        command: word.to_lowercase(),
        args: remainder.split_whitespace().map(String::from).collect(),
        raw_text: text.to_string(),
        prefix_used: prefix.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_command_and_args() {
        let inv = parse("!ping now", "!").unwrap();
        assert_eq!(inv.command, "ping");
        assert_eq!(inv.args, vec!["now"]);
        assert_eq!(inv.raw_text, "!ping now");
        assert_eq!(inv.prefix_used, "!");
    }

    #[test]
    fn text_without_prefix_is_not_a_command() {
        assert_eq!(parse("hello", "!"), None);
        assert_eq!(parse("", "!"), None);
        assert_eq!(parse(" !ping", "!"), None);
    }

    #[test]
    fn bare_prefix_is_empty_command() {
        let inv = parse("!", "!").unwrap();
        assert_eq!(inv.command, "");
        assert!(inv.args.is_empty());
    }

    #[test]
    fn command_is_lower_cased_and_args_keep_case() {
        let inv = parse(".SUDO Add +234 801", ".").unwrap();
        assert_eq!(inv.command, "sudo");
        assert_eq!(inv.args, vec!["Add", "+234", "801"]);
        assert_eq!(inv.rest(), "Add +234 801");
        assert_eq!(inv.arg(1), Some("+234"));
    }

    #[test]
    fn whitespace_runs_collapse() {
        let inv = parse("!  menu \t  a\n\nb  ", "!").unwrap();
        assert_eq!(inv.command, "menu");
        assert_eq!(inv.args, vec!["a", "b"]);
    }

    #[test]
    fn multi_character_prefix() {
        let inv = parse("kc>dev", "kc>").unwrap();
        assert_eq!(inv.command, "dev");
        assert_eq!(parse("kc dev", "kc>"), None);
    }

    proptest! {
        #[test]
        fn parse_is_idempotent_on_normalized_text(
            word in "[a-z]{0,8}",
            args in proptest::collection::vec("[A-Za-z0-9+]{1,6}", 0..5),
        ) {
            // "! a" reads `a` as the command word.
            prop_assume!(!word.is_empty() || args.is_empty());
            let mut text = format!("!{word}");
            for arg in &args {
                text.push(' ');
                text.push_str(arg);
            }
            let first = parse(&text, "!").unwrap();
            prop_assert_eq!(&first.command, &word);
            prop_assert_eq!(&first.args, &args);

            let rebuilt = if first.args.is_empty() {
                format!("!{}", first.command)
            } else {
                format!("!{} {}", first.command, first.rest())
            };
            let second = parse(&rebuilt, "!").unwrap();
            prop_assert_eq!(first.command, second.command);
            prop_assert_eq!(first.args, second.args);
        }

        #[test]
        fn text_not_starting_with_prefix_never_parses(text in "[a-zA-Z ]{0,20}") {
            prop_assert!(parse(&text, "!").is_none());
        }
    }
}
