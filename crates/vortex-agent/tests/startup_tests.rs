// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Open-time side effects.

mod common;

use std::sync::Arc;

use serde_json::json;
use vortex_agent::{FollowOutcome, StartupRoutine};
use vortex_config::model::VortexConfig;
use vortex_core::{NewsletterMetadata, PresenceKind};
use vortex_plugin::{BUILTIN_NAMES, PluginRegistry, SharedRegistry};
use vortex_test_utils::MockTransport;
use vortex_test_utils::fixtures::OWNER;

const OWN_CHAT: &str = "10000@s.whatsapp.net";

fn routine(config: &VortexConfig, mock: &Arc<MockTransport>) -> (StartupRoutine, SharedRegistry) {
    let registry = PluginRegistry::new().shared();
    let routine = StartupRoutine::new(
        config,
        mock.clone(),
        registry.clone(),
        common::bot(config),
    );
    (routine, registry)
}

#[tokio::test]
async fn first_open_loads_plugins_and_announces() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let mock = Arc::new(MockTransport::new());
    let (mut routine, registry) = routine(&config, &mock);

    let report = routine.on_open().await.unwrap();
    assert_eq!(report.plugins_loaded, Some(BUILTIN_NAMES.len()));
    assert!(report.notice_sent);
    assert_eq!(registry.read().await.len(), BUILTIN_NAMES.len());

    let sent = mock.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, OWN_CHAT);
    assert_eq!(
        mock.calls().presences,
        vec![(PresenceKind::Available, None)]
    );

    // A reconnect sends the notice again but neither registers plugins nor
    // announces presence twice.
    let again = routine.on_open().await.unwrap();
    assert_eq!(again.plugins_loaded, None);
    assert!(again.notice_sent);
    assert_eq!(registry.read().await.len(), BUILTIN_NAMES.len());
    assert_eq!(mock.calls().presences.len(), 1);
}

#[tokio::test]
async fn notice_failure_is_reported_but_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let mock = Arc::new(MockTransport::new());
    mock.set_fail_sends(true);
    let (mut routine, _) = routine(&config, &mock);

    let report = routine.on_open().await.unwrap();
    assert!(!report.notice_sent);
}

#[tokio::test]
async fn unknown_own_id_skips_the_notice() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let mock = Arc::new(MockTransport::new().with_own_id(None));
    let (mut routine, _) = routine(&config, &mock);

    let report = routine.on_open().await.unwrap();
    assert!(!report.notice_sent);
    assert!(mock.sent_messages().is_empty());
}

#[tokio::test]
async fn newsletters_are_followed_once_and_failures_reach_the_owner() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::config(dir.path());
    config.startup.announce = false;
    config.startup.newsletters = vec![
        "1@newsletter".to_string(),
        "2@newsletter".to_string(),
        "3@newsletter".to_string(),
    ];
    let mock = Arc::new(
        MockTransport::new()
            .with_newsletter(NewsletterMetadata {
                id: "2@newsletter".to_string(),
                viewer_metadata: Some(json!({"role": "SUBSCRIBER"})),
            })
            .failing_for("3@newsletter"),
    );
    let (mut routine, _) = routine(&config, &mock);

    let report = routine.on_open().await.unwrap();
    assert_eq!(report.newsletters[0], ("1@newsletter".to_string(), FollowOutcome::Followed));
    assert_eq!(
        report.newsletters[1],
        ("2@newsletter".to_string(), FollowOutcome::AlreadyFollowing)
    );
    assert!(matches!(report.newsletters[2].1, FollowOutcome::Failed(_)));
    assert_eq!(mock.calls().followed_newsletters, vec!["1@newsletter"]);

    let sent = mock.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, OWNER);
    assert!(mock.sent_texts()[0].contains("3@newsletter"));
}

#[tokio::test]
async fn group_invites_are_accepted_and_failures_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::config(dir.path());
    config.startup.announce = false;
    config.startup.group_invites = vec!["GOODCODE".to_string(), "BADCODE".to_string()];
    let mock = Arc::new(MockTransport::new().failing_for("BADCODE"));
    let (mut routine, _) = routine(&config, &mock);

    let report = routine.on_open().await.unwrap();
    assert_eq!(report.invites_accepted, vec!["GOODCODE"]);
    assert_eq!(report.invites_failed.len(), 1);
    assert_eq!(report.invites_failed[0].0, "BADCODE");
    assert_eq!(mock.calls().accepted_invites, vec!["GOODCODE"]);
    assert!(mock.sent_texts()[0].contains("BADCODE"));
}
