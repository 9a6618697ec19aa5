// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides which credentials a connection attempt starts with and whether it
//! has to pair first.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use vortex_core::{SessionCredentials, VortexError};

use crate::codec::SessionCodec;
use crate::prompt::Prompter;
use crate::store::CredentialStore;

/// Outcome of credential resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    /// Registered credentials: connect straight away.
    Resume(SessionCredentials),
    /// Unregistered credentials: pair by scanning the QR codes the transport emits.
    Qr(SessionCredentials),
    /// Unregistered credentials: pair by entering a code on the phone.
    PairingCode {
        credentials: SessionCredentials,
        phone: String,
    },
}

impl Acquisition {
    pub fn credentials(&self) -> &SessionCredentials {
        match self {
            Acquisition::Resume(c) | Acquisition::Qr(c) => c,
            Acquisition::PairingCode { credentials, .. } => credentials,
        }
    }

    pub fn needs_pairing(&self) -> bool {
        !matches!(self, Acquisition::Resume(_))
    }
}

/// Resolves credentials for each connection attempt.
///
/// The configured token is applied once per process: it is decoded, written
/// verbatim to the credential file and used for the first attempt. Later
/// attempts read the file, which by then carries any rotated keys.
/// A blank token is treated as absent.
pub struct SessionBootstrap {
    codec: SessionCodec,
    store: CredentialStore,
    token: Option<SecretString>,
    pairing_code: bool,
    prompter: Arc<dyn Prompter>,
}

impl SessionBootstrap {
    pub fn new(
        codec: SessionCodec,
        store: CredentialStore,
        token: Option<SecretString>,
        pairing_code: bool,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        let token = token.filter(|token| !token.expose_secret().trim().is_empty());
        Self {
            codec,
            store,
            token,
            pairing_code,
            prompter,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub async fn acquire(&mut self) -> Result<Acquisition, VortexError> {
        if let Some(token) = self.token.take() {
            let credentials = self.apply_token(&token).await?;
            return self.pairing_mode(credentials).await;
        }

        if let Some(credentials) = self.store.load().await? {
            return self.pairing_mode(credentials).await;
        }

        if !self.prompter.is_interactive() {
            return Err(VortexError::MissingCredentials);
        }

        if !self.pairing_code {
            let prompter = Arc::clone(&self.prompter);
            let answer = run_prompt(move || prompter.read_token()).await?;
            if let Some(token) = answer {
                let credentials = self.apply_token(&token).await?;
                return self.pairing_mode(credentials).await;
            }
        }

        self.pairing_mode(SessionCredentials::fresh()).await
    }

    async fn apply_token(&self, token: &SecretString) -> Result<SessionCredentials, VortexError> {
        info!(marker = %self.codec.prefix(), "decoding session token");
        let json = self.codec.decode_json(token.expose_secret())?;
        self.store.write_raw(&json).await?;
        SessionCredentials::from_json(&json)
            .map_err(|e| VortexError::InvalidFormat(format!("payload is not a JSON object: {e}")))
    }

    async fn pairing_mode(
        &self,
        credentials: SessionCredentials,
    ) -> Result<Acquisition, VortexError> {
        if credentials.is_registered() {
            return Ok(Acquisition::Resume(credentials));
        }

        if !self.pairing_code {
            return Ok(Acquisition::Qr(credentials));
        }

        if !self.prompter.is_interactive() {
            warn!("pairing code requested but no terminal is attached");
            return Err(VortexError::MissingCredentials);
        }

        let prompter = Arc::clone(&self.prompter);
        match run_prompt(move || prompter.read_phone()).await? {
            Some(phone) => Ok(Acquisition::PairingCode { credentials, phone }),
            None => Err(VortexError::MissingCredentials),
        }
    }
}

async fn run_prompt<T, F>(prompt: F) -> Result<T, VortexError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, VortexError> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| VortexError::Internal(format!("prompt task failed: {e}")))?
}
