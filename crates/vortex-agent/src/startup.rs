// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Side effects run each time the connection opens.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};
use vortex_config::model::VortexConfig;
use vortex_core::{OutboundMessage, PresenceKind, Transport, VortexError, format_uptime, jid};
use vortex_plugin::{BotProfile, SharedRegistry, register_builtins};

/// Result of one newsletter follow attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    Failed(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StartupReport {
    /// Plugins registered on this open; `None` when already loaded.
    pub plugins_loaded: Option<usize>,
    pub notice_sent: bool,
    pub newsletters: Vec<(String, FollowOutcome)>,
    pub invites_accepted: Vec<String>,
    pub invites_failed: Vec<(String, String)>,
}

impl StartupReport {
    pub fn count(&self, wanted: fn(&FollowOutcome) -> bool) -> usize {
        self.newsletters.iter().filter(|(_, o)| wanted(o)).count()
    }
}

pub struct StartupRoutine {
    transport: Arc<dyn Transport>,
    registry: SharedRegistry,
    bot: Arc<BotProfile>,
    announce: bool,
    newsletters: Vec<String>,
    group_invites: Vec<String>,
    /// First configured owner, told about startup failures.
    owner: Option<String>,
    plugins_loaded: bool,
    presence_announced: bool,
}

impl StartupRoutine {
    pub fn new(
        config: &VortexConfig,
        transport: Arc<dyn Transport>,
        registry: SharedRegistry,
        bot: Arc<BotProfile>,
    ) -> Self {
        Self {
            transport,
            registry,
            bot,
            announce: config.startup.announce,
            newsletters: config.startup.newsletters.clone(),
            group_invites: config.startup.group_invites.clone(),
            owner: config.bot.owner_digits().first().map(|n| jid::from_number(n)),
            plugins_loaded: false,
            presence_announced: false,
        }
    }

    /// Runs the open-time side effects. Only a plugin registration conflict
    /// is an error; every other failure is logged and reported.
    pub async fn on_open(&mut self) -> Result<StartupReport, VortexError> {
        let mut report = StartupReport::default();

        if !self.plugins_loaded {
            let mut registry = self.registry.write().await;
            register_builtins(&mut registry)?;
            self.plugins_loaded = true;
            report.plugins_loaded = Some(registry.len());
            info!(count = registry.len(), "plugins loaded");
        }

        // Announced once per process; a failed attempt is retried on the next open.
        if !self.presence_announced {
            match self
                .transport
                .send_presence(PresenceKind::Available, None)
                .await
            {
                Ok(()) => self.presence_announced = true,
                Err(e) => warn!(error = %e, "failed to announce presence"),
            }
        }

        if self.announce {
            report.notice_sent = self.send_notice().await;
        }

        let (newsletters, invites) =
            tokio::join!(self.follow_newsletters(), self.accept_invites());
        report.newsletters = newsletters;
        for (code, result) in invites {
            match result {
                Ok(group) => {
                    info!(%code, %group, "joined group");
                    report.invites_accepted.push(code);
                }
                Err(e) => {
                    self.tell_owner(format!("Failed to join group with invite {code}: {e}"))
                        .await;
                    report.invites_failed.push((code, e));
                }
            }
        }

        info!(
            plugins = ?report.plugins_loaded,
            notice = report.notice_sent,
            followed = report.count(|o| *o == FollowOutcome::Followed),
            already_following = report.count(|o| *o == FollowOutcome::AlreadyFollowing),
            failed = report.count(|o| matches!(o, FollowOutcome::Failed(_))),
            invites_accepted = report.invites_accepted.len(),
            invites_failed = report.invites_failed.len(),
            "startup complete"
        );
        Ok(report)
    }

    fn notice_text(&self) -> String {
        let now = Utc::now();
        let uptime = (now - self.bot.started_at).num_seconds().max(0) as u64;
        format!(
            "*{} connected*\n\nPrefix: {}\nDate: {}\nTime: {}\nUptime: {}",
            self.bot.name,
            self.bot.prefix,
            now.format("%Y-%m-%d"),
            now.format("%H:%M:%S UTC"),
            format_uptime(uptime),
        )
    }

    async fn send_notice(&self) -> bool {
        let Some(own) = self.transport.own_id() else {
            warn!("own identity unknown, skipping connection notice");
            return false;
        };
        let notice = OutboundMessage::text(jid::normalize(&own), self.notice_text());
        match self.transport.send_message(notice).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "failed to send connection notice");
                self.tell_owner(format!("Failed to send connection notice: {e}"))
                    .await;
                false
            }
        }
    }

    async fn follow_one(&self, newsletter: &str) -> FollowOutcome {
        let metadata = match self.transport.newsletter_metadata(newsletter).await {
            Ok(metadata) => metadata,
            Err(e) => return FollowOutcome::Failed(e.to_string()),
        };
        if metadata.is_following() {
            return FollowOutcome::AlreadyFollowing;
        }
        match self.transport.follow_newsletter(newsletter).await {
            Ok(()) => FollowOutcome::Followed,
            Err(e) => FollowOutcome::Failed(e.to_string()),
        }
    }

    async fn follow_newsletters(&self) -> Vec<(String, FollowOutcome)> {
        let attempts = self.newsletters.iter().map(|newsletter| async move {
            let outcome = self.follow_one(newsletter).await;
            match &outcome {
                FollowOutcome::Followed => info!(%newsletter, "followed newsletter"),
                FollowOutcome::AlreadyFollowing => info!(%newsletter, "already following newsletter"),
                FollowOutcome::Failed(e) => {
                    warn!(%newsletter, error = %e, "failed to follow newsletter");
                    self.tell_owner(format!("Failed to follow newsletter {newsletter}: {e}"))
                        .await;
                }
            }
            (newsletter.clone(), outcome)
        });
        join_all(attempts).await
    }

    async fn accept_invites(&self) -> Vec<(String, Result<String, String>)> {
        let attempts = self.group_invites.iter().map(|code| async move {
            let result = self
                .transport
                .accept_group_invite(code)
                .await
                .map_err(|e| e.to_string());
            (code.clone(), result)
        });
        join_all(attempts).await
    }

    /// Best-effort message to the first configured owner.
    pub async fn tell_owner(&self, text: String) {
        let Some(owner) = &self.owner else {
            return;
        };
        if let Err(e) = self
            .transport
            .send_message(OutboundMessage::text(owner.clone(), text))
            .await
        {
            warn!(error = %e, "failed to notify owner");
        }
    }
}
