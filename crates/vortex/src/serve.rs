// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vortex serve` command implementation.
//!
//! Wires the credential bootstrap, the sidecar transport, the connection
//! manager and the authorization resolver into an [`AgentLoop`] and runs it
//! until a shutdown signal or a fatal error.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, warn};
use vortex_access::{AuthorizationResolver, DelegateStore};
use vortex_agent::shutdown;
use vortex_agent::{AgentLoop, ConnectionManager, ConnectionSettings};
use vortex_bridge::BridgeTransport;
use vortex_config::VortexConfig;
use vortex_core::{DisconnectClass, Transport, VortexError};
use vortex_plugin::BotProfile;
use vortex_session::{CredentialStore, SessionBootstrap, SessionCodec, TerminalPrompter};

/// Runs the `vortex serve` command.
pub async fn run_serve(config: VortexConfig) -> Result<(), VortexError> {
    init_tracing(&config.bot.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting vortex serve");

    let bridge = BridgeTransport::from_config(&config.transport);
    info!(url = bridge.url(), "using protocol sidecar");
    let transport: Arc<dyn Transport> = Arc::new(bridge);

    let bootstrap = SessionBootstrap::new(
        SessionCodec::new(&config.session.marker),
        CredentialStore::new(&config.session.dir),
        config.session.id.clone().map(SecretString::from),
        config.session.pairing_code,
        Arc::new(TerminalPrompter),
    );
    let mut connection = ConnectionManager::new(
        Arc::clone(&transport),
        bootstrap,
        ConnectionSettings::from_config(&config.transport),
    );
    connection.on_open(|| info!("connected"));
    connection.on_close(|class, status_code| match class {
        DisconnectClass::Terminal => warn!(?status_code, "session logged out"),
        DisconnectClass::Transient => info!(?status_code, "connection lost, reconnecting"),
    });
    connection.on_credentials_rotated(|_| debug!("session credentials rotated"));

    let delegates = Arc::new(DelegateStore::load(&config.bot.delegates_path).await?);
    info!(count = delegates.list().await.len(), "delegated users loaded");
    let owners = config.bot.owner_digits();
    if owners.is_empty() {
        warn!("no owner numbers configured, only the bot account itself has owner rights");
    }
    let contact = config
        .bot
        .dev
        .clone()
        .or_else(|| owners.first().cloned());
    let resolver = Arc::new(AuthorizationResolver::new(
        owners,
        delegates,
        Arc::clone(&transport),
    ));
    let bot = Arc::new(
        BotProfile::new(
            config.bot.name.clone(),
            config.bot.owner_name.clone(),
            config.bot.prefix.clone(),
        )
        .with_contact(contact),
    );

    let mut agent = AgentLoop::new(&config, connection, resolver, bot).await;
    let cancel = shutdown::install_signal_handler();
    agent.run(cancel).await?;

    info!("vortex serve shut down cleanly");
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vortex={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
