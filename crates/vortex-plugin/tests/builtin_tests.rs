// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in commands driven directly against a mock transport.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use vortex_access::DelegateStore;
use vortex_core::{AuthorizationTier, ContentType, NormalizedMessage, QuotedMessage, Transport};
use vortex_plugin::{
    BotProfile, CommandContext, PluginRegistry, SharedRegistry, parse, register_builtins,
};
use vortex_test_utils::MockTransport;
use vortex_test_utils::fixtures::{MEMBER, OWNER, key};

struct Harness {
    mock: Arc<MockTransport>,
    registry: SharedRegistry,
    delegates: Arc<DelegateStore>,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = PluginRegistry::new();
        register_builtins(&mut registry).unwrap();
        Self {
            mock: Arc::new(MockTransport::new()),
            registry: registry.shared(),
            delegates: Arc::new(DelegateStore::empty(dir.path().join("sudo.json"))),
            _dir: dir,
        }
    }

    fn context(&self, text: &str, quoted: Option<QuotedMessage>) -> CommandContext {
        let message = NormalizedMessage {
            id: "CMD1".to_string(),
            chat_id: OWNER.to_string(),
            sender_id: OWNER.to_string(),
            is_group: false,
            from_me: false,
            content_type: ContentType::Text,
            text: Some(text.to_string()),
            quoted,
            timestamp: Utc::now(),
            push_name: Some("Ada".to_string()),
            revoked_id: None,
            content: json!({ "conversation": text }),
            key: key(OWNER, "CMD1", None),
        };
        let transport: Arc<dyn Transport> = self.mock.clone();
        CommandContext {
            transport,
            invocation: parse(text, ".").unwrap(),
            message,
            tier: AuthorizationTier::Owner,
            registry: self.registry.clone(),
            delegates: self.delegates.clone(),
            bot: Arc::new(
                BotProfile::new("KC", "Kelvin", ".").with_contact(Some("2349117525115".into())),
            ),
        }
    }

    async fn run(&self, text: &str) -> Vec<String> {
        self.run_with(text, None).await
    }

    async fn run_with(&self, text: &str, quoted: Option<QuotedMessage>) -> Vec<String> {
        self.mock.clear_sent();
        let ctx = self.context(text, quoted);
        let descriptor = self
            .registry
            .read()
            .await
            .lookup(&ctx.invocation.command)
            .unwrap();
        descriptor.handler.handle(&ctx).await.unwrap();
        self.mock.sent_texts()
    }
}

#[tokio::test]
async fn ping_replies_twice_with_latency() {
    let harness = Harness::new();
    let texts = harness.run(".ping").await;
    assert_eq!(texts.len(), 2);
    assert!(texts[1].starts_with("*Pong!*"));
    assert!(texts[1].ends_with(" ms"));
    // Replies quote the invoking message.
    let sent = harness.mock.sent_messages();
    assert_eq!(sent[0].quoted.as_ref().map(|k| k.id.as_str()), Some("CMD1"));
}

#[tokio::test]
async fn dev_answers_through_every_alias() {
    let harness = Harness::new();
    for command in [".dev", ".developer", ".OWNER"] {
        let texts = harness.run(command).await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Hello, *Ada*"));
        assert!(texts[0].contains("Kelvin"));
        assert!(texts[0].contains("wa.me/+2349117525115"));
    }
}

#[tokio::test]
async fn menu_groups_commands_by_category() {
    let harness = Harness::new();
    let texts = harness.run(".help").await;
    let menu = &texts[0];
    assert!(menu.contains("*MAIN*"));
    assert!(menu.contains("*OWNER*"));
    assert!(menu.contains("• .ping - Check response latency"));
    assert!(menu.contains("Uptime: 0d 0h 0m"));
    let main = menu.find("*MAIN*").unwrap();
    let owner = menu.find("*OWNER*").unwrap();
    assert!(main < owner);
}

#[tokio::test]
async fn sudo_add_list_and_delete() {
    let harness = Harness::new();

    let texts = harness.run(".sudo add +234 805 555 5555").await;
    assert!(texts[0].contains("+2348055555555 can now use"));
    assert!(harness.delegates.contains("2348055555555@s.whatsapp.net").await);

    let texts = harness.run(".sudo add 2348055555555").await;
    assert!(texts[0].contains("already delegated"));

    let texts = harness.run(".sudo list").await;
    assert!(texts[0].contains("1. +2348055555555"));

    let texts = harness.run(".sudo del 2348055555555").await;
    assert!(texts[0].contains("no longer delegated"));
    assert!(harness.delegates.list().await.is_empty());
}

#[tokio::test]
async fn sudo_takes_number_from_quoted_message() {
    let harness = Harness::new();
    let quoted = QuotedMessage {
        id: Some("Q1".into()),
        sender_id: Some(MEMBER.to_string()),
        text: Some("hello".into()),
        content: json!({ "conversation": "hello" }),
    };
    harness.run_with(".sudo add", Some(quoted)).await;
    assert!(harness.delegates.contains(MEMBER).await);
}

#[tokio::test]
async fn sudo_without_target_prints_usage() {
    let harness = Harness::new();
    let texts = harness.run(".sudo add").await;
    assert!(texts[0].starts_with("Usage: .sudo add"));
    let texts = harness.run(".sudo").await;
    assert!(texts[0].starts_with("Usage:"));
}

#[tokio::test]
async fn plugin_remove_then_add_restores_command() {
    let harness = Harness::new();

    let texts = harness.run(".plugin remove ping").await;
    assert_eq!(texts[0], "Removed `ping`.");
    assert!(harness.registry.read().await.lookup("ping").is_none());

    let texts = harness.run(".plugin add ping").await;
    assert_eq!(texts[0], "Added `ping`.");
    assert!(harness.registry.read().await.lookup("ping").is_some());

    let texts = harness.run(".plugin add ping").await;
    assert!(texts[0].contains("already registered"));
}

#[tokio::test]
async fn plugin_manager_refuses_to_remove_itself() {
    let harness = Harness::new();
    let texts = harness.run(".plugin remove plugin").await;
    assert!(texts[0].contains("cannot remove itself"));
    assert!(harness.registry.read().await.lookup("plugin").is_some());
}

#[tokio::test]
async fn plugin_list_and_unknown_names() {
    let harness = Harness::new();
    let texts = harness.run(".plugin list").await;
    assert!(texts[0].starts_with("*5 plugins loaded*"));
    assert!(texts[0].contains("• dev (developer, owner) [member]"));
    assert!(texts[0].contains("• sudo [owner]"));

    let texts = harness.run(".plugin add weather").await;
    assert!(texts[0].starts_with("Unknown plugin `weather`"));

    let texts = harness.run(".plugin remove weather").await;
    assert_eq!(texts[0], "No plugin answers to `weather`.");
}
