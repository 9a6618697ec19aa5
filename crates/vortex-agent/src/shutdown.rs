// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown: signal handling and draining of in-flight commands.

use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatcher::HandlerOutcome;

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either arrives.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C stops the agent");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Waits up to `timeout` for running command handlers, then abandons the rest.
pub async fn drain_handlers(handles: Vec<JoinHandle<HandlerOutcome>>, timeout: Duration) {
    let running: Vec<_> = handles.into_iter().filter(|h| !h.is_finished()).collect();
    if running.is_empty() {
        info!("no running commands to drain");
        return;
    }

    let count = running.len();
    info!(count, "waiting for running commands to complete");
    let aborts: Vec<_> = running.iter().map(JoinHandle::abort_handle).collect();

    match tokio::time::timeout(timeout, join_all(running)).await {
        Ok(_) => info!("all commands drained"),
        Err(_) => {
            let remaining = aborts.iter().filter(|a| !a.is_finished()).count();
            warn!(remaining, "drain timeout reached, aborting commands");
            for abort in aborts {
                abort.abort();
            }
        }
    }
}
