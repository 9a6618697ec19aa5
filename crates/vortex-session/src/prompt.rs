// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive acquisition of a session token or a pairing phone number.

use std::io::{BufRead, IsTerminal, Write};

use secrecy::SecretString;
use vortex_core::VortexError;

/// Source of interactive answers during credential bootstrap.
pub trait Prompter: Send + Sync + 'static {
    /// Whether a human can be asked at all.
    fn is_interactive(&self) -> bool;

    /// Asks for a session token. `None` when the answer is empty.
    fn read_token(&self) -> Result<Option<SecretString>, VortexError>;

    /// Asks for the phone number to pair. `None` when the answer has no digits.
    fn read_phone(&self) -> Result<Option<String>, VortexError>;
}

/// Prompts on the controlling terminal. The token is read without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn read_token(&self) -> Result<Option<SecretString>, VortexError> {
        eprint!("Paste your SESSION_ID (leave empty to pair with a QR code): ");
        let token = rpassword::read_password()
            .map_err(|e| VortexError::Internal(format!("failed to read session token: {e}")))?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| SecretString::from(token.to_string())))
    }

    fn read_phone(&self) -> Result<Option<String>, VortexError> {
        eprint!("Enter your number to receive a pairing code (e.g. +2349117525115): ");
        std::io::stderr().flush().ok();
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| VortexError::Internal(format!("failed to read phone number: {e}")))?;
        let digits = vortex_core::jid::phone_digits(&line);
        Ok((!digits.is_empty()).then_some(digits))
    }
}

/// Formats a pairing code in groups of four: `ABCDEFGH` -> `ABCD-EFGH`.
pub fn format_pairing_code(code: &str) -> String {
    code.chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}
