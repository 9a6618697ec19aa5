// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`Transport`] implementation over a sidecar WebSocket.
//!
//! Each `open` dials the sidecar, spawns a writer task draining an outbound
//! frame queue and a reader task that routes responses to waiting requests
//! and events to the returned stream. Requests are correlated by a numeric
//! id through a [`DashMap`] of oneshot senders.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use vortex_config::model::TransportConfig;
use vortex_core::{
    ConnectionUpdate, EventStream, GroupMetadata, MessageKey, MessageLookup, NewsletterMetadata,
    OutboundMessage, PresenceKind, SessionCredentials, Transport, TransportEvent, VortexError,
};

use crate::protocol::{self, Frame, GET_MESSAGE};

type Pending = Arc<DashMap<u64, oneshot::Sender<Result<Value, String>>>>;

const EVENT_BUFFER: usize = 256;
const OUTBOUND_BUFFER: usize = 64;

/// The live socket of one `open`.
struct Link {
    outbound: mpsc::Sender<String>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

pub struct BridgeTransport {
    url: String,
    request_timeout: Duration,
    next_id: AtomicU64,
    pending: Pending,
    link: Mutex<Option<Link>>,
    own_id: Arc<RwLock<Option<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn set_own_id(slot: &RwLock<Option<String>>, id: Option<&str>) {
    let mut guard = slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = id.map(String::from);
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, VortexError> {
    serde_json::from_value(value).map_err(|e| VortexError::Transport {
        message: format!("unexpected `{method}` result"),
        source: Some(Box::new(e)),
    })
}

impl BridgeTransport {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            request_timeout,
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
            link: Mutex::new(None),
            own_id: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(
            config.url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn outbound(&self) -> Result<mpsc::Sender<String>, VortexError> {
        lock(&self.link)
            .as_ref()
            .map(|link| link.outbound.clone())
            .ok_or_else(|| VortexError::transport("not connected to the sidecar"))
    }

    /// Sends one request and waits for its response.
    async fn request(&self, method: &str, params: Value) -> Result<Value, VortexError> {
        let outbound = self.outbound()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let frame = serde_json::to_string(&Frame::request(id, method, params))
            .map_err(|e| VortexError::Internal(format!("failed to encode `{method}`: {e}")))?;
        if outbound.send(frame).await.is_err() {
            self.pending.remove(&id);
            return Err(VortexError::transport("sidecar connection closed"));
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(message))) => Err(VortexError::transport(format!(
                "`{method}` failed: {message}"
            ))),
            Ok(Err(_)) => Err(VortexError::transport(format!(
                "sidecar connection lost during `{method}`"
            ))),
            Err(_) => {
                self.pending.remove(&id);
                debug!(%method, id, "sidecar request timed out");
                Err(VortexError::Timeout {
                    duration: self.request_timeout,
                })
            }
        }
    }

    fn teardown(&self) {
        if let Some(link) = lock(&self.link).take() {
            link.reader.abort();
            // Dropping the queue lets the writer flush a close frame and exit.
            drop(link.outbound);
            drop(link.writer);
        }
        self.pending.clear();
    }
}

/// Routes inbound frames until the socket ends, then reports the drop.
async fn read_loop<S>(
    mut read: S,
    pending: Pending,
    events: mpsc::Sender<TransportEvent>,
    outbound: mpsc::Sender<String>,
    own_id: Arc<RwLock<Option<String>>>,
) where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(message) = read.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "sidecar socket error");
                break;
            }
        };
        let frame: Frame = match serde_json::from_str(text.as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "invalid frame from sidecar");
                continue;
            }
        };

        match frame {
            Frame::Res { .. } => {
                if let Some((id, outcome)) = frame.into_outcome() {
                    match pending.remove(&id) {
                        Some((_, waiter)) => {
                            let _ = waiter.send(outcome);
                        }
                        None => debug!(id, "response for unknown or expired request"),
                    }
                }
            }
            Frame::Event { event, data } => match protocol::decode_event(&event, data) {
                Ok(Some(event)) => {
                    if let TransportEvent::CredentialsUpdate(creds) = &event {
                        if let Some(id) = creds.me_id() {
                            set_own_id(&own_id, Some(id));
                        }
                    }
                    if events.send(event).await.is_err() {
                        debug!("event stream dropped, stopping reader");
                        return;
                    }
                }
                Ok(None) => debug!(%event, "ignoring sidecar event"),
                Err(e) => warn!(%event, error = %e, "malformed sidecar event"),
            },
            Frame::Req { id, method, params } if method == GET_MESSAGE => {
                let key = match serde_json::from_value::<MessageKey>(
                    params.get("key").cloned().unwrap_or_default(),
                ) {
                    Ok(key) => key,
                    Err(e) => {
                        warn!(error = %e, "getMessage without a usable key");
                        answer(&outbound, id, Value::Null).await;
                        continue;
                    }
                };
                let (reply, found) = oneshot::channel();
                let lookup = TransportEvent::MessageLookup(MessageLookup { key, reply });
                if events.send(lookup).await.is_err() {
                    return;
                }
                let outbound = outbound.clone();
                tokio::spawn(async move {
                    let content = found.await.ok().flatten().unwrap_or(Value::Null);
                    answer(&outbound, id, content).await;
                });
            }
            Frame::Req { method, .. } => debug!(%method, "ignoring sidecar request"),
        }
    }

    info!("sidecar connection ended");
    pending.clear();
    let _ = events
        .send(TransportEvent::ConnectionUpdate(ConnectionUpdate::closed(
            None,
        )))
        .await;
}

async fn answer(outbound: &mpsc::Sender<String>, id: u64, result: Value) {
    match serde_json::to_string(&Frame::success(id, result)) {
        Ok(frame) => {
            let _ = outbound.send(frame).await;
        }
        Err(e) => warn!(id, error = %e, "failed to encode sidecar response"),
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    fn name(&self) -> &str {
        "bridge"
    }

    async fn open(&self, credentials: SessionCredentials) -> Result<EventStream, VortexError> {
        self.teardown();

        let (socket, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| VortexError::Transport {
                message: format!("failed to reach sidecar at {}", self.url),
                source: Some(Box::new(e)),
            })?;
        info!(url = %self.url, "connected to sidecar");

        let (mut write, read) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    warn!(error = %e, "failed to write to sidecar");
                    break;
                }
            }
            let _ = write.close().await;
        });
        let reader = tokio::spawn(read_loop(
            read,
            Arc::clone(&self.pending),
            events_tx,
            outbound_tx.clone(),
            Arc::clone(&self.own_id),
        ));

        *lock(&self.link) = Some(Link {
            outbound: outbound_tx,
            reader,
            writer,
        });
        set_own_id(&self.own_id, credentials.me_id());

        if let Err(e) = self
            .request("connect", json!({ "credentials": credentials }))
            .await
        {
            self.teardown();
            return Err(e);
        }
        Ok(events_rx)
    }

    async fn close(&self) -> Result<(), VortexError> {
        self.teardown();
        debug!("sidecar connection closed");
        Ok(())
    }

    fn own_id(&self) -> Option<String> {
        self.own_id
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn request_pairing_code(&self, phone: &str) -> Result<String, VortexError> {
        let result = self
            .request("requestPairingCode", json!({ "phone": phone }))
            .await?;
        decode("requestPairingCode", result)
    }

    async fn send_message(&self, message: OutboundMessage) -> Result<MessageKey, VortexError> {
        let result = self
            .request("sendMessage", protocol::send_message_params(&message))
            .await?;
        let key = match result {
            Value::Object(mut sent) if sent.contains_key("key") => {
                sent.remove("key").unwrap_or_default()
            }
            other => other,
        };
        decode("sendMessage", key)
    }

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, VortexError> {
        let result = self
            .request("groupMetadata", json!({ "jid": group_id }))
            .await?;
        decode("groupMetadata", result)
    }

    async fn accept_group_invite(&self, code: &str) -> Result<String, VortexError> {
        let result = self
            .request("groupAcceptInvite", json!({ "code": code }))
            .await?;
        match result {
            Value::String(group) => Ok(group),
            other => other
                .get("gid")
                .or_else(|| other.get("id"))
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| VortexError::transport("invite accepted without a group id")),
        }
    }

    async fn newsletter_metadata(
        &self,
        newsletter_id: &str,
    ) -> Result<NewsletterMetadata, VortexError> {
        let result = self
            .request("newsletterMetadata", json!({ "jid": newsletter_id }))
            .await?;
        decode("newsletterMetadata", result)
    }

    async fn follow_newsletter(&self, newsletter_id: &str) -> Result<(), VortexError> {
        self.request("newsletterFollow", json!({ "jid": newsletter_id }))
            .await?;
        Ok(())
    }

    async fn react_to_newsletter(
        &self,
        newsletter_id: &str,
        server_id: &str,
        emoji: &str,
    ) -> Result<(), VortexError> {
        self.request(
            "newsletterReactMessage",
            json!({ "jid": newsletter_id, "serverId": server_id, "emoji": emoji }),
        )
        .await?;
        Ok(())
    }

    async fn reject_call(&self, call_id: &str, caller: &str) -> Result<(), VortexError> {
        self.request("rejectCall", json!({ "id": call_id, "from": caller }))
            .await?;
        Ok(())
    }

    async fn read_messages(&self, keys: &[MessageKey]) -> Result<(), VortexError> {
        self.request("readMessages", json!({ "keys": keys })).await?;
        Ok(())
    }

    async fn send_presence(
        &self,
        presence: PresenceKind,
        chat_id: Option<&str>,
    ) -> Result<(), VortexError> {
        self.request(
            "sendPresenceUpdate",
            json!({ "presence": presence, "jid": chat_id }),
        )
        .await?;
        Ok(())
    }
}

impl Drop for BridgeTransport {
    fn drop(&mut self) {
        self.teardown();
    }
}
