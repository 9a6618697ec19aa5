// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event loop of the Vortex chat agent.
//!
//! The [`AgentLoop`] is the single consumer of the connection's events. For
//! every inbound message it:
//! - normalizes it once
//! - records it in the deletion tracker
//! - runs configured automation (read receipts, status, newsletters)
//! - signals chat activity to the presence controller
//! - hands it to the command dispatcher
//!
//! The loop task is the only writer of the tracker and presence state.

pub mod antidelete;
pub mod automation;
pub mod connection;
pub mod dispatcher;
pub mod normalize;
pub mod presence;
pub mod shutdown;
pub mod startup;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vortex_access::AuthorizationResolver;
use vortex_config::model::VortexConfig;
use vortex_core::{ContentType, RawMessage, Transport, TransportEvent, VortexError};
use vortex_plugin::{BotProfile, PluginRegistry, SharedRegistry};

pub use antidelete::{
    DeletionNotifier, ForwardTarget, MessageTracker, RecoveredDeletion, RetentionPolicy,
    TrackedMessageRecord,
};
pub use automation::{Automation, Routing};
pub use connection::{ConnectionEvent, ConnectionManager, ConnectionSettings, Signal};
pub use dispatcher::{DispatchOutcome, Dispatcher, HandlerOutcome};
pub use normalize::normalize;
pub use presence::{PresenceController, PresenceSettings, PresenceTransition};
pub use startup::{FollowOutcome, StartupReport, StartupRoutine};

const PRESENCE_TICK: Duration = Duration::from_secs(1);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AgentLoop {
    connection: ConnectionManager,
    transport: Arc<dyn Transport>,
    registry: SharedRegistry,
    startup: StartupRoutine,
    dispatcher: Dispatcher,
    automation: Automation,
    tracker: MessageTracker,
    notifier: Option<DeletionNotifier>,
    presence: PresenceController,
    snapshot_path: Option<PathBuf>,
    in_flight: Vec<JoinHandle<HandlerOutcome>>,
}

impl AgentLoop {
    /// Wires the agent from configuration, restoring the tracker snapshot if
    /// one is configured.
    pub async fn new(
        config: &VortexConfig,
        connection: ConnectionManager,
        resolver: Arc<AuthorizationResolver>,
        bot: Arc<BotProfile>,
    ) -> Self {
        let transport = Arc::clone(connection.transport());
        let registry = PluginRegistry::new().shared();

        let policy = RetentionPolicy::from_config(&config.antidelete);
        let snapshot_path = config.antidelete.snapshot_path.as_ref().map(PathBuf::from);
        let tracker = match &snapshot_path {
            Some(path) => MessageTracker::load_snapshot(path, policy).await,
            None => MessageTracker::new(policy),
        };
        let notifier = config.antidelete.enabled.then(|| {
            DeletionNotifier::new(
                Arc::clone(&transport),
                ForwardTarget::from_config(&config.antidelete.forward_to),
            )
        });

        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            resolver,
            Arc::clone(&transport),
            Arc::clone(&bot),
        )
        .private_mode(config.bot.is_private());

        info!(
            bot = %bot.name,
            prefix = %bot.prefix,
            mode = %config.bot.mode,
            transport = transport.name(),
            "agent loop initialized"
        );

        Self {
            startup: StartupRoutine::new(
                config,
                Arc::clone(&transport),
                Arc::clone(&registry),
                bot,
            ),
            automation: Automation::new(
                config.automation.clone(),
                &config.startup,
                Arc::clone(&transport),
            ),
            presence: PresenceController::new(PresenceSettings::from_config(&config.presence)),
            connection,
            transport,
            registry,
            dispatcher,
            tracker,
            notifier,
            snapshot_path,
            in_flight: Vec::new(),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &MessageTracker {
        &self.tracker
    }

    /// Runs until `cancel` fires or a fatal error occurs, then shuts down.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), VortexError> {
        self.connection.start().await?;
        info!("agent loop running");

        let mut ticker = tokio::time::interval(PRESENCE_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break Ok(());
                }
                step = self.connection.step() => match step {
                    Ok(Some(event)) => {
                        if let Err(e) = self.handle(event).await {
                            break Err(e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => break Err(e),
                },
                _ = ticker.tick() => {
                    let transitions = self.presence.tick(Instant::now());
                    self.publish(transitions).await;
                }
            }
        };

        if let Err(e) = &result {
            error!(error = %e, "agent loop stopped on a fatal error");
            self.startup
                .tell_owner(format!("Vortex stopped: {e}"))
                .await;
        }
        self.shutdown().await;
        result
    }

    /// Handles one connection event. Errors are fatal.
    pub async fn handle(&mut self, event: ConnectionEvent) -> Result<(), VortexError> {
        match event {
            ConnectionEvent::Opened => {
                self.startup.on_open().await?;
            }
            ConnectionEvent::Closed { class, status_code } => {
                debug!(%class, ?status_code, "connection closed");
            }
            ConnectionEvent::Transport(event) => self.on_transport_event(event).await,
        }
        Ok(())
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::MessagesUpsert(messages) => {
                for raw in messages {
                    self.on_message(raw).await;
                }
            }
            TransportEvent::MessagesUpdate(updates) => {
                for update in updates.iter().filter(|u| u.is_deletion()) {
                    self.on_deletion(&update.key.id, &update.key.remote_jid, update.actor())
                        .await;
                }
            }
            TransportEvent::CallOffer(calls) => {
                for call in &calls {
                    self.automation.on_call(call).await;
                }
            }
            TransportEvent::PresenceUpdate(update) => {
                if let Some(t) = self.presence.on_presence_update(&update, Instant::now()) {
                    self.publish(vec![t]).await;
                }
            }
            TransportEvent::MessageLookup(lookup) => {
                let content = self.tracker.lookup_content(&lookup.key.id);
                debug!(message_id = %lookup.key.id, found = content.is_some(), "message lookup");
                let _ = lookup.reply.send(content);
            }
            TransportEvent::ConnectionUpdate(_) | TransportEvent::CredentialsUpdate(_) => {
                debug!("lifecycle event reached the agent loop, ignoring");
            }
        }
    }

    async fn on_message(&mut self, raw: RawMessage) {
        let own_id = self.transport.own_id();
        let Some(message) = normalize(&raw, own_id.as_deref()) else {
            debug!(message_id = %raw.key.id, "skipping message without content");
            return;
        };

        if message.content_type == ContentType::ProtocolRevoke {
            if let Some(target) = &message.revoked_id {
                self.on_deletion(target, &message.chat_id, &message.sender_id)
                    .await;
            }
            return;
        }

        self.tracker.observe(&message);

        if self.automation.on_message(&message, &raw).await == Routing::Consumed {
            return;
        }

        if !message.from_me {
            if let Some(t) = self.presence.on_activity(&message.chat_id, Instant::now()) {
                self.publish(vec![t]).await;
            }
        }

        if let DispatchOutcome::Dispatched(handle) = self.dispatcher.dispatch(message).await {
            self.in_flight.retain(|h| !h.is_finished());
            self.in_flight.push(handle);
        }
    }

    async fn on_deletion(&mut self, message_id: &str, chat_id: &str, actor: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let Some(recovered) = self.tracker.on_deletion_event(message_id, chat_id, actor) else {
            debug!(%message_id, "deleted message was not tracked");
            return;
        };
        if recovered.chat_mismatch() {
            info!(
                %message_id,
                original_chat = %recovered.record.chat_id,
                reported_chat = %recovered.reported_chat_id,
                "deletion reported from a different chat"
            );
        }
        info!(%message_id, actor = %recovered.deleting_actor_id, "recovered deleted message");
        if let Err(e) = notifier.notify(&recovered).await {
            warn!(%message_id, error = %e, "failed to forward deleted message");
        }
    }

    async fn publish(&self, transitions: Vec<PresenceTransition>) {
        for t in transitions {
            if let Err(e) = self
                .transport
                .send_presence(t.kind, t.chat_id.as_deref())
                .await
            {
                debug!(presence = %t.kind, error = %e, "failed to publish presence");
            }
        }
    }

    async fn shutdown(&mut self) {
        shutdown::drain_handlers(std::mem::take(&mut self.in_flight), DRAIN_TIMEOUT).await;
        if let Err(e) = self.connection.stop().await {
            warn!(error = %e, "error while closing connection");
        }
        if let Some(path) = &self.snapshot_path {
            if let Err(e) = self.tracker.save_snapshot(path).await {
                warn!(error = %e, "failed to save tracker snapshot");
            }
        }
        info!("agent loop stopped");
    }
}
