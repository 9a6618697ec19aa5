// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Vortex agent.
//!
//! TOML files in the XDG hierarchy are merged with `VORTEX_*` variables and
//! the flat variables older deployments set (`SESSION_ID`, `MODE`,
//! `ANTI_CALL`, ...). Unknown keys are rejected with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use vortex_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Prefix: {}", config.bot.prefix);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str, load_dotenv};
pub use model::VortexConfig;

/// Load configuration from the XDG hierarchy and the environment, then validate it.
///
/// Returns either a valid `VortexConfig` or every diagnostic found.
pub fn load_and_validate() -> Result<VortexConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            // Read TOML source files for error source span information
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<VortexConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![(
                diagnostic::INLINE_SOURCE.to_string(),
                toml_content.to_string(),
            )];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![
        std::env::current_dir()
            .map(|d| d.join("vortex.toml"))
            .unwrap_or_else(|_| "vortex.toml".into()),
    ];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("vortex/vortex.toml"));
    }
    candidates.push("/etc/vortex/vortex.toml".into());

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
