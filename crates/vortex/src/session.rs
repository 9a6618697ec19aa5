// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vortex session` commands.

use std::path::Path;

use vortex_config::VortexConfig;
use vortex_core::{SessionCredentials, VortexError};
use vortex_session::SessionCodec;

/// Prints the token that reproduces `path` byte for byte.
pub async fn run_encode(config: &VortexConfig, path: &Path) -> Result<(), VortexError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(VortexError::storage)?;
    let credentials = SessionCredentials::from_json(&raw).map_err(|e| {
        VortexError::InvalidFormat(format!("{} is not a JSON object: {e}", path.display()))
    })?;
    println!("{}", SessionCodec::new(&config.session.marker).encode(&credentials));
    Ok(())
}

pub fn run_inspect(config: &VortexConfig, token: &str) -> Result<(), VortexError> {
    let credentials = SessionCodec::new(&config.session.marker).decode(token)?;
    print!("{}", describe(&credentials));
    Ok(())
}

/// Non-secret facts about a credential document.
fn describe(credentials: &SessionCredentials) -> String {
    let mut fields: Vec<&str> = credentials.document().keys().map(String::as_str).collect();
    fields.sort_unstable();
    format!(
        "registered: {}\naccount: {}\nfields: {}\n",
        credentials.is_registered(),
        credentials.me_id().unwrap_or("unknown"),
        fields.join(", "),
    )
}
