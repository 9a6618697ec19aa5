// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle manager.
//!
//! Owns the single live connection:
//!
//! ```text
//! disconnected -> connecting -> (awaiting-pairing) -> open -> disconnected
//! ```
//!
//! A logged-out close is terminal: the credential file is deleted and the
//! manager refuses to reconnect. Every other close schedules one reconnect
//! after a fixed delay. Events of the current connection are pumped into a
//! single channel tagged with a generation, so events from a superseded
//! connection are ignored.

use std::sync::Arc;
use std::time::Duration;

use qrcode::QrCode;
use qrcode::render::unicode;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use vortex_config::model::TransportConfig;
use vortex_core::{
    ConnectionPhase, ConnectionState, ConnectionUpdate, DisconnectClass, EventStream,
    SessionCredentials, Transport, TransportEvent, VortexError, classify_disconnect,
};
use vortex_session::{Acquisition, CredentialStore, SessionBootstrap, format_pairing_code};

const SIGNAL_BUFFER: usize = 256;

/// Internal wake-ups consumed by [`ConnectionManager::process`].
#[derive(Debug)]
pub enum Signal {
    Event { generation: u64, event: TransportEvent },
    StreamEnded { generation: u64 },
    ReconnectDue,
}

/// What the event loop needs to know after a signal was processed.
#[derive(Debug)]
pub enum ConnectionEvent {
    Opened,
    Closed {
        class: DisconnectClass,
        status_code: Option<u16>,
    },
    /// An application-level event for the rest of the agent.
    Transport(TransportEvent),
}

type OpenCallback = Box<dyn Fn() + Send + Sync>;
type CloseCallback = Box<dyn Fn(DisconnectClass, Option<u16>) + Send + Sync>;
type CredentialsCallback = Box<dyn Fn(&SessionCredentials) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub reconnect_delay: Duration,
}

impl ConnectionSettings {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    bootstrap: SessionBootstrap,
    store: CredentialStore,
    settings: ConnectionSettings,
    state: ConnectionState,
    generation: u64,
    reconnect_pending: bool,
    stopped: bool,
    terminated: bool,
    signals_tx: mpsc::Sender<Signal>,
    signals_rx: mpsc::Receiver<Signal>,
    on_open: Vec<OpenCallback>,
    on_close: Vec<CloseCallback>,
    on_credentials: Vec<CredentialsCallback>,
}


/// Renders a QR payload for a terminal.
pub fn render_qr(payload: &str) -> Option<String> {
    let code = QrCode::new(payload.as_bytes()).ok()?;
    Some(
        code.render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .build(),
    )
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        bootstrap: SessionBootstrap,
        settings: ConnectionSettings,
    ) -> Self {
        let store = bootstrap.store().clone();
        let (signals_tx, signals_rx) = mpsc::channel(SIGNAL_BUFFER);
        Self {
            transport,
            bootstrap,
            store,
            settings,
            state: ConnectionState::Disconnected,
            generation: 0,
            reconnect_pending: false,
            stopped: false,
            terminated: false,
            signals_tx,
            signals_rx,
            on_open: Vec::new(),
            on_close: Vec::new(),
            on_credentials: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn on_open(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.on_open.push(Box::new(callback));
    }

    pub fn on_close(&mut self, callback: impl Fn(DisconnectClass, Option<u16>) + Send + Sync + 'static) {
        self.on_close.push(Box::new(callback));
    }

    pub fn on_credentials_rotated(
        &mut self,
        callback: impl Fn(&SessionCredentials) + Send + Sync + 'static,
    ) {
        self.on_credentials.push(Box::new(callback));
    }

    /// Starts a connection attempt. A no-op while one is in flight or open.
    ///
    /// Fails only when no credentials can be obtained; a failed `open` is a
    /// transient close and schedules a reconnect.
    pub async fn start(&mut self) -> Result<(), VortexError> {
        if self.terminated {
            return Err(VortexError::LoggedOut);
        }
        if self.state.is_active() {
            debug!(state = %self.state, "connection attempt already in flight");
            return Ok(());
        }
        self.stopped = false;
        self.state = ConnectionState::Connecting;
        info!(transport = self.transport.name(), "connecting");

        let acquisition = match self.bootstrap.acquire().await {
            Ok(acquisition) => acquisition,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e);
            }
        };

        let credentials = acquisition.credentials().clone();
        let stream = match self.transport.open(credentials).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "failed to open connection");
                self.state = ConnectionState::Disconnected;
                self.schedule_reconnect();
                return Ok(());
            }
        };

        self.generation += 1;
        self.spawn_pump(stream);

        if acquisition.needs_pairing() {
            self.state = ConnectionState::AwaitingPairing;
        }
        if let Acquisition::PairingCode { phone, .. } = &acquisition {
            match self.transport.request_pairing_code(phone).await {
                Ok(code) => {
                    let code = format_pairing_code(&code);
                    info!("pairing code issued");
                    println!("Your pairing code: {code}");
                }
                Err(e) => warn!(error = %e, "failed to request pairing code"),
            }
        }
        Ok(())
    }

    /// Stops the connection and cancels reconnects.
    pub async fn stop(&mut self) -> Result<(), VortexError> {
        self.stopped = true;
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }
        self.state = ConnectionState::Closing;
        // Everything the old connection still sends is stale from here.
        self.generation += 1;
        let result = self.transport.close().await;
        self.state = ConnectionState::Disconnected;
        info!("connection stopped");
        result
    }

    /// Arms the reconnect timer. Returns `false` if one is already pending or
    /// reconnecting is no longer allowed.
    pub fn schedule_reconnect(&mut self) -> bool {
        if self.reconnect_pending || self.terminated || self.stopped {
            return false;
        }
        self.reconnect_pending = true;
        let delay = self.settings.reconnect_delay;
        let tx = self.signals_tx.clone();
        info!(delay_secs = delay.as_secs(), "reconnect scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Signal::ReconnectDue).await;
        });
        true
    }

    fn spawn_pump(&self, mut stream: EventStream) {
        let tx = self.signals_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                if tx.send(Signal::Event { generation, event }).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(Signal::StreamEnded { generation }).await;
        });
    }

    pub async fn next_signal(&mut self) -> Option<Signal> {
        self.signals_rx.recv().await
    }

    /// Waits for and processes the next signal.
    pub async fn step(&mut self) -> Result<Option<ConnectionEvent>, VortexError> {
        match self.next_signal().await {
            Some(signal) => self.process(signal).await,
            None => Ok(None),
        }
    }

    /// Applies one signal to the state machine.
    ///
    /// Returns [`VortexError::LoggedOut`] on a terminal close, after the
    /// credential file was deleted.
    pub async fn process(&mut self, signal: Signal) -> Result<Option<ConnectionEvent>, VortexError> {
        match signal {
            Signal::ReconnectDue => {
                self.reconnect_pending = false;
                if self.stopped || self.terminated {
                    return Ok(None);
                }
                self.start().await?;
                Ok(None)
            }
            Signal::StreamEnded { generation } => {
                if generation != self.generation || !self.state.is_active() {
                    return Ok(None);
                }
                debug!("event stream ended without a close update");
                self.handle_close(None).await
            }
            Signal::Event { generation, event } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "dropping stale event");
                    return Ok(None);
                }
                match event {
                    TransportEvent::ConnectionUpdate(update) => self.handle_update(update).await,
                    TransportEvent::CredentialsUpdate(credentials) => {
                        self.persist(&credentials).await;
                        for callback in &self.on_credentials {
                            callback(&credentials);
                        }
                        Ok(None)
                    }
                    other => Ok(Some(ConnectionEvent::Transport(other))),
                }
            }
        }
    }

    /// Writes rotated credentials before the next signal is processed, so a
    /// later logged-out close always deletes the newest file.
    async fn persist(&self, credentials: &SessionCredentials) {
        if self.terminated {
            debug!("ignoring credentials rotated after logout");
            return;
        }
        if let Err(e) = self.store.persist(credentials).await {
            warn!(error = %e, "failed to persist rotated credentials");
        }
    }

    async fn handle_update(
        &mut self,
        update: ConnectionUpdate,
    ) -> Result<Option<ConnectionEvent>, VortexError> {
        if let Some(qr) = &update.qr {
            match render_qr(qr) {
                Some(rendered) => {
                    info!("scan the QR code to link this device");
                    println!("{rendered}");
                }
                None => warn!("received an unrenderable QR payload"),
            }
        }

        match update.connection {
            Some(ConnectionPhase::Open) => {
                self.state = ConnectionState::Open;
                info!(own_id = ?self.transport.own_id(), "connection open");
                for callback in &self.on_open {
                    callback();
                }
                Ok(Some(ConnectionEvent::Opened))
            }
            Some(ConnectionPhase::Close) => {
                let status_code = update.last_disconnect.and_then(|d| d.status_code);
                self.handle_close(status_code).await
            }
            Some(ConnectionPhase::Connecting) | None => Ok(None),
        }
    }

    async fn handle_close(
        &mut self,
        status_code: Option<u16>,
    ) -> Result<Option<ConnectionEvent>, VortexError> {
        self.state = ConnectionState::Disconnected;
        let class = classify_disconnect(status_code);
        for callback in &self.on_close {
            callback(class, status_code);
        }

        match class {
            DisconnectClass::Terminal => {
                self.terminated = true;
                error!(?status_code, "session logged out, deleting credentials");
                match self.store.delete().await {
                    Ok(true) => info!(path = %self.store.path().display(), "credentials deleted"),
                    Ok(false) => debug!("no credential file to delete"),
                    Err(e) => warn!(error = %e, "failed to delete credentials"),
                }
                Err(VortexError::LoggedOut)
            }
            DisconnectClass::Transient => {
                warn!(?status_code, "connection closed, will reconnect");
                self.schedule_reconnect();
                Ok(Some(ConnectionEvent::Closed { class, status_code }))
            }
        }
    }
}
