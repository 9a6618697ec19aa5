// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridge transport against an in-process sidecar.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use vortex_bridge::{BridgeTransport, Frame};
use vortex_core::{
    ConnectionPhase, OutboundMessage, SessionCredentials, Transport, TransportEvent, VortexError,
};

/// One accepted sidecar connection.
struct Sidecar {
    socket: WebSocketStream<TcpStream>,
}

impl Sidecar {
    async fn next_request(&mut self) -> (u64, String, Value) {
        loop {
            let message = self.socket.next().await.unwrap().unwrap();
            if let Message::Text(text) = message {
                match serde_json::from_str::<Frame>(text.as_str()).unwrap() {
                    Frame::Req { id, method, params } => return (id, method, params),
                    other => panic!("expected a request, got {other:?}"),
                }
            }
        }
    }

    async fn next_response(&mut self) -> (u64, Value) {
        loop {
            let message = self.socket.next().await.unwrap().unwrap();
            if let Message::Text(text) = message {
                match serde_json::from_str::<Frame>(text.as_str()).unwrap() {
                    Frame::Res { id, result, .. } => return (id, result),
                    other => panic!("expected a response, got {other:?}"),
                }
            }
        }
    }

    async fn send(&mut self, frame: Value) {
        self.socket
            .send(Message::Text(frame.to_string().into()))
            .await
            .unwrap();
    }

    async fn reply(&mut self, id: u64, result: Value) {
        self.send(json!({"type": "res", "id": id, "ok": true, "result": result}))
            .await;
    }
}

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

async fn accept(listener: &TcpListener) -> Sidecar {
    let (stream, _) = listener.accept().await.unwrap();
    Sidecar {
        socket: accept_async(stream).await.unwrap(),
    }
}

fn registered() -> SessionCredentials {
    SessionCredentials::from_json(r#"{"registered":true,"me":{"id":"10000:7@s.whatsapp.net"}}"#)
        .unwrap()
}

/// Opens the bridge while the sidecar acknowledges `connect`.
async fn connected(
    timeout: Duration,
) -> (BridgeTransport, vortex_core::EventStream, Sidecar, TcpListener) {
    let (listener, url) = listen().await;
    let bridge = BridgeTransport::new(url, timeout);
    let sidecar = async {
        let mut sidecar = accept(&listener).await;
        let (id, method, params) = sidecar.next_request().await;
        assert_eq!(method, "connect");
        assert_eq!(params["credentials"]["registered"], true);
        sidecar.reply(id, json!(null)).await;
        sidecar
    };
    let (opened, sidecar) = tokio::join!(bridge.open(registered()), sidecar);
    (bridge, opened.unwrap(), sidecar, listener)
}

#[tokio::test]
async fn requests_are_correlated_with_responses() {
    let (bridge, _events, mut sidecar, _listener) = connected(Duration::from_secs(5)).await;
    assert_eq!(bridge.own_id().as_deref(), Some("10000:7@s.whatsapp.net"));

    let send = bridge.send_message(OutboundMessage::text("1@s.whatsapp.net", "hi"));
    let serve = async {
        let (id, method, params) = sidecar.next_request().await;
        assert_eq!(method, "sendMessage");
        assert_eq!(params["jid"], "1@s.whatsapp.net");
        assert_eq!(params["content"]["text"], "hi");
        sidecar
            .reply(
                id,
                json!({"key": {"remoteJid": "1@s.whatsapp.net", "fromMe": true, "id": "OUT1"}}),
            )
            .await;
    };
    let (key, ()) = tokio::join!(send, serve);
    let key = key.unwrap();
    assert_eq!(key.id, "OUT1");
    assert!(key.from_me);
}

#[tokio::test]
async fn rejected_requests_surface_the_sidecar_error() {
    let (bridge, _events, mut sidecar, _listener) = connected(Duration::from_secs(5)).await;

    let lookup = bridge.group_metadata("120363025000000000@g.us");
    let serve = async {
        let (id, method, _) = sidecar.next_request().await;
        assert_eq!(method, "groupMetadata");
        sidecar
            .send(json!({"type": "res", "id": id, "ok": false, "error": {"message": "forbidden"}}))
            .await;
    };
    let (result, ()) = tokio::join!(lookup, serve);
    match result {
        Err(VortexError::Transport { message, .. }) => assert!(message.contains("forbidden")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn unanswered_requests_time_out() {
    let (bridge, _events, mut sidecar, _listener) = connected(Duration::from_millis(100)).await;

    let follow = bridge.follow_newsletter("1@newsletter");
    let (result, request) = tokio::join!(follow, sidecar.next_request());
    assert_eq!(request.1, "newsletterFollow");
    assert!(matches!(result, Err(VortexError::Timeout { .. })));
}

#[tokio::test]
async fn events_are_typed_and_credentials_update_identity() {
    let (bridge, mut events, mut sidecar, _listener) = connected(Duration::from_secs(5)).await;

    sidecar
        .send(json!({"type": "event", "event": "connection.update", "data": {"connection": "open"}}))
        .await;
    sidecar
        .send(json!({"type": "event", "event": "chats.upsert", "data": []}))
        .await;
    sidecar
        .send(json!({
            "type": "event",
            "event": "creds.update",
            "data": {"registered": true, "me": {"id": "20000:1@s.whatsapp.net"}}
        }))
        .await;

    match events.recv().await {
        Some(TransportEvent::ConnectionUpdate(update)) => {
            assert_eq!(update.connection, Some(ConnectionPhase::Open));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        events.recv().await,
        Some(TransportEvent::CredentialsUpdate(_))
    ));
    assert_eq!(bridge.own_id().as_deref(), Some("20000:1@s.whatsapp.net"));
}

#[tokio::test]
async fn get_message_requests_are_answered_from_the_agent() {
    let (_bridge, mut events, mut sidecar, _listener) = connected(Duration::from_secs(5)).await;

    sidecar
        .send(json!({
            "type": "req",
            "id": 41,
            "method": "getMessage",
            "params": {"key": {"remoteJid": "1@s.whatsapp.net", "id": "M1"}}
        }))
        .await;

    match events.recv().await {
        Some(TransportEvent::MessageLookup(lookup)) => {
            assert_eq!(lookup.key.id, "M1");
            lookup
                .reply
                .send(Some(json!({"conversation": "again"})))
                .unwrap();
        }
        other => panic!("unexpected {other:?}"),
    }
    let (id, result) = sidecar.next_response().await;
    assert_eq!(id, 41);
    assert_eq!(result, json!({"conversation": "again"}));
}

#[tokio::test]
async fn a_dropped_socket_is_a_transient_close() {
    let (bridge, mut events, sidecar, _listener) = connected(Duration::from_secs(5)).await;
    drop(sidecar);

    match events.recv().await {
        Some(TransportEvent::ConnectionUpdate(update)) => {
            assert_eq!(update.connection, Some(ConnectionPhase::Close));
            assert_eq!(update.last_disconnect.unwrap().status_code, None);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(events.recv().await.is_none());

    bridge.close().await.unwrap();
    assert!(matches!(
        bridge.read_messages(&[]).await,
        Err(VortexError::Transport { .. })
    ));
}

#[tokio::test]
async fn unreachable_sidecar_fails_to_open() {
    let (listener, url) = listen().await;
    drop(listener);
    let bridge = BridgeTransport::new(url, Duration::from_secs(1));
    assert!(matches!(
        bridge.open(SessionCredentials::fresh()).await,
        Err(VortexError::Transport { .. })
    ));
}
