// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vortex - a chat automation agent.
//!
//! This is the binary entry point for the Vortex agent.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vortex_config::VortexConfig;

/// Vortex - a chat automation agent.
#[derive(Parser, Debug)]
#[command(name = "vortex", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and run the agent (default).
    Serve,
    /// Session token tooling.
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },
    /// Manage Vortex configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Print the session token for a credential file.
    Encode {
        /// Path to a `creds.json` file.
        path: PathBuf,
    },
    /// Describe the credentials inside a session token without printing secrets.
    Inspect {
        token: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate the effective configuration and print a summary.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    vortex_config::load_dotenv();
    let config = match vortex_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            vortex_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Session { action } => match action {
            SessionCommands::Encode { path } => session::run_encode(&config, &path).await,
            SessionCommands::Inspect { token } => session::run_inspect(&config, &token),
        },
        Commands::Config {
            action: ConfigCommands::Check,
        } => {
            print!("{}", config_summary(&config));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn config_summary(config: &VortexConfig) -> String {
    let owners = config.bot.owner_digits();
    format!(
        "configuration is valid\n  bot: {} (prefix `{}`, {} mode)\n  owners: {}\n  session: {} ({})\n  sidecar: {}\n",
        config.bot.name,
        config.bot.prefix,
        config.bot.mode,
        if owners.is_empty() {
            "none".to_string()
        } else {
            owners.join(", ")
        },
        config.session.dir,
        if config.session.id.is_some() {
            "token configured"
        } else {
            "no token"
        },
        config.transport.url,
    )
}
