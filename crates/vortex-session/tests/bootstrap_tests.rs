// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential resolution across token, file and interactive sources.

use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use vortex_core::VortexError;
use vortex_session::{Acquisition, CredentialStore, Prompter, SessionBootstrap, SessionCodec};

#[derive(Default)]
struct ScriptedPrompter {
    interactive: bool,
    token: Option<String>,
    phone: Option<String>,
    asked: Mutex<Vec<&'static str>>,
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn read_token(&self) -> Result<Option<SecretString>, VortexError> {
        self.asked.lock().unwrap().push("token");
        Ok(self.token.clone().map(SecretString::from))
    }

    fn read_phone(&self) -> Result<Option<String>, VortexError> {
        self.asked.lock().unwrap().push("phone");
        Ok(self.phone.clone())
    }
}

fn token_for(json: &str) -> String {
    format!("kc:~{}", STANDARD.encode(json))
}

fn bootstrap(
    dir: &std::path::Path,
    token: Option<&str>,
    pairing_code: bool,
    prompter: Arc<ScriptedPrompter>,
) -> SessionBootstrap {
    SessionBootstrap::new(
        SessionCodec::new("kc"),
        CredentialStore::new(dir),
        token.map(|t| SecretString::from(t.to_string())),
        pairing_code,
        prompter,
    )
}

#[tokio::test]
async fn configured_token_is_written_verbatim_and_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let json = "{\"registered\": true, \"me\": {\"id\": \"1:2@s.whatsapp.net\"}}";
    let mut boot = bootstrap(dir.path(), Some(&token_for(json)), false, Arc::default());

    let acquired = boot.acquire().await.unwrap();
    assert!(matches!(acquired, Acquisition::Resume(_)));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("creds.json")).unwrap(),
        json
    );
}

#[tokio::test]
async fn token_is_applied_once_then_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let mut boot = bootstrap(
        dir.path(),
        Some(&token_for(r#"{"registered":true,"gen":1}"#)),
        false,
        Arc::default(),
    );
    boot.acquire().await.unwrap();

    // Rotation persisted by the transport between attempts.
    boot.store()
        .write_raw(r#"{"registered":true,"gen":2}"#)
        .await
        .unwrap();

    let second = boot.acquire().await.unwrap();
    assert_eq!(second.credentials().document()["gen"], 2);
}

#[tokio::test]
async fn invalid_token_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut boot = bootstrap(dir.path(), Some("KC~garbage"), false, Arc::default());
    let err = boot.acquire().await.unwrap_err();
    assert!(matches!(err, VortexError::InvalidFormat(_)));
    assert!(err.is_fatal());
    assert!(!dir.path().join("creds.json").exists());
}

#[tokio::test]
async fn blank_token_resumes_from_the_credential_file() {
    let dir = tempfile::tempdir().unwrap();
    let stored = r#"{"registered":true,"me":{"id":"1:2@s.whatsapp.net"}}"#;
    CredentialStore::new(dir.path())
        .write_raw(stored)
        .await
        .unwrap();

    for blank in ["", "  "] {
        let mut boot = bootstrap(dir.path(), Some(blank), false, Arc::default());
        match boot.acquire().await.unwrap() {
            Acquisition::Resume(credentials) => assert!(credentials.is_registered()),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(
        std::fs::read_to_string(dir.path().join("creds.json")).unwrap(),
        stored
    );
}

#[tokio::test]
async fn nothing_available_non_interactive_is_missing_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let mut boot = bootstrap(dir.path(), None, false, Arc::default());
    assert!(matches!(
        boot.acquire().await,
        Err(VortexError::MissingCredentials)
    ));
}

#[tokio::test]
async fn stored_unregistered_credentials_pair_by_qr() {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path());
    store.write_raw(r#"{"registered":false}"#).await.unwrap();

    let mut boot = bootstrap(dir.path(), None, false, Arc::default());
    assert!(matches!(boot.acquire().await.unwrap(), Acquisition::Qr(_)));
}

#[tokio::test]
async fn interactive_token_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let prompter = Arc::new(ScriptedPrompter {
        interactive: true,
        token: Some(token_for(r#"{"registered":true}"#)),
        ..Default::default()
    });
    let mut boot = bootstrap(dir.path(), None, false, prompter.clone());

    let acquired = boot.acquire().await.unwrap();
    assert!(!acquired.needs_pairing());
    assert_eq!(*prompter.asked.lock().unwrap(), vec!["token"]);
    assert!(dir.path().join("creds.json").exists());
}

#[tokio::test]
async fn empty_interactive_token_falls_back_to_qr() {
    let dir = tempfile::tempdir().unwrap();
    let prompter = Arc::new(ScriptedPrompter {
        interactive: true,
        ..Default::default()
    });
    let mut boot = bootstrap(dir.path(), None, false, prompter);

    let acquired = boot.acquire().await.unwrap();
    assert!(matches!(acquired, Acquisition::Qr(ref c) if !c.is_registered()));
}

#[tokio::test]
async fn pairing_code_mode_asks_for_phone() {
    let dir = tempfile::tempdir().unwrap();
    let prompter = Arc::new(ScriptedPrompter {
        interactive: true,
        phone: Some("2349117525115".into()),
        ..Default::default()
    });
    let mut boot = bootstrap(dir.path(), None, true, prompter.clone());

    match boot.acquire().await.unwrap() {
        Acquisition::PairingCode { phone, credentials } => {
            assert_eq!(phone, "2349117525115");
            assert!(!credentials.is_registered());
        }
        other => panic!("expected pairing code, got {other:?}"),
    }
    assert_eq!(*prompter.asked.lock().unwrap(), vec!["phone"]);
}

#[tokio::test]
async fn pairing_code_without_terminal_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let json = r#"{"registered":false}"#;
    let mut boot = bootstrap(dir.path(), Some(&token_for(json)), true, Arc::default());
    assert!(matches!(
        boot.acquire().await,
        Err(VortexError::MissingCredentials)
    ));
}

#[tokio::test]
async fn registered_credentials_skip_pairing_even_in_pairing_mode() {
    let dir = tempfile::tempdir().unwrap();
    let json = r#"{"registered":true}"#;
    let mut boot = bootstrap(dir.path(), Some(&token_for(json)), true, Arc::default());
    assert!(matches!(boot.acquire().await.unwrap(), Acquisition::Resume(_)));
}
