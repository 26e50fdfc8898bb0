//! One participant's WebSocket connection.
//!
//! A connection runs two tasks:
//!
//! - the **inbound pump** reads frames with an idle deadline, applies
//!   `location_update` frames to the store and asks the hub for a broadcast,
//!   and answers `ping` frames on this connection only;
//! - the **outbound pump** drains the bounded outbound queue with a write
//!   deadline and sends keepalive pings.
//!
//! The hub holds the only strong sender of the outbound queue. The inbound
//! pump keeps a weak one for pong replies, so once the hub lets go (unregister
//! or eviction) the queue closes and the outbound pump finishes with a Close
//! frame.

use std::{sync::Arc, time::Duration};

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, WeakSender, error::TrySendError},
    time::{self, Instant},
};

use crate::{
    domain::{ParticipantId, SessionId, SessionStore, Timestamp},
    infrastructure::dto::websocket::{ClientFrame, LocationDto, MessageType, PongMessage},
    realtime::hub::{ConnectionId, HubHandle, Registration},
};

pub const DEFAULT_MAX_FRAME_BYTES: usize = 512;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Keepalive pings go out a bit more often than the peer's idle deadline
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(54);
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Per-connection limits and deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub max_frame_bytes: usize,
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
    pub keepalive_interval: Duration,
    pub outbound_capacity: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

/// Why a pump stopped
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },
    #[error("no frame received within {0:?}")]
    IdleTimeout(Duration),
    #[error("write did not complete within {0:?}")]
    WriteTimeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("outbound queue is full")]
    QueueFull,
    #[error("outbound queue is closed")]
    QueueClosed,
}

/// What the inbound pump did with one text frame
#[derive(Debug, Clone, PartialEq)]
enum FrameOutcome {
    Applied,
    Reply(String),
    Ignored,
}

pub struct Connection {
    id: ConnectionId,
    session_id: SessionId,
    participant_id: Option<ParticipantId>,
    store: Arc<dyn SessionStore>,
    hub: HubHandle,
    settings: ConnectionSettings,
}

impl Connection {
    pub fn new(
        session_id: SessionId,
        store: Arc<dyn SessionStore>,
        hub: HubHandle,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            session_id,
            participant_id: None,
            store,
            hub,
            settings,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Register with the hub, run both pumps, then unregister exactly once
    pub async fn serve(self, socket: WebSocket) {
        let connection_id = self.id;
        let session_id = self.session_id.clone();
        let hub = self.hub.clone();
        let settings = self.settings;

        let (outbound_tx, outbound_rx) = mpsc::channel(settings.outbound_capacity);
        let reply_tx = outbound_tx.downgrade();

        let registration = Registration {
            connection_id,
            session_id: session_id.clone(),
            outbound: outbound_tx,
        };
        if let Err(e) = hub.register(registration).await {
            tracing::error!(
                session_id = %session_id,
                connection_id = %connection_id,
                error = %e,
                "Failed to register connection"
            );
            return;
        }

        let (sink, stream) = socket.split();

        let mut write_task = tokio::spawn(write_pump(sink, outbound_rx, settings));
        let mut read_task = tokio::spawn(self.read_pump(stream, reply_tx));

        // Whichever side finishes first ends the inbound side
        let outcome = tokio::select! {
            result = &mut read_task => result,
            result = &mut write_task => {
                read_task.abort();
                result
            }
        };

        match outcome {
            Ok(Ok(())) => {
                tracing::info!(
                    session_id = %session_id,
                    connection_id = %connection_id,
                    "Connection closed"
                );
            }
            Ok(Err(reason)) => {
                tracing::warn!(
                    session_id = %session_id,
                    connection_id = %connection_id,
                    reason = %reason,
                    "Connection terminated"
                );
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    connection_id = %connection_id,
                    error = %e,
                    "Connection task failed"
                );
            }
        }

        if let Err(e) = hub.unregister(session_id.clone(), connection_id).await {
            tracing::warn!(
                connection_id = %connection_id,
                error = %e,
                "Failed to unregister connection"
            );
        }

        // Once unregistered the queue closes; let the outbound pump flush and send Close
        if !write_task.is_finished() {
            let grace = settings.write_timeout.saturating_mul(2);
            if time::timeout(grace, &mut write_task).await.is_err() {
                write_task.abort();
            }
        }
    }

    async fn read_pump(
        mut self,
        mut stream: SplitStream<WebSocket>,
        reply_tx: WeakSender<String>,
    ) -> Result<(), ConnectionError> {
        loop {
            let message = match time::timeout(self.settings.idle_timeout, stream.next()).await {
                Err(_) => return Err(ConnectionError::IdleTimeout(self.settings.idle_timeout)),
                Ok(None) => return Ok(()),
                Ok(Some(Err(e))) => return Err(ConnectionError::Transport(e.to_string())),
                Ok(Some(Ok(message))) => message,
            };

            let outcome = match message {
                Message::Text(text) => {
                    self.check_frame_size(text.len())?;
                    self.handle_text(text.as_str()).await
                }
                Message::Binary(bytes) => {
                    self.check_frame_size(bytes.len())?;
                    match std::str::from_utf8(&bytes) {
                        Ok(text) => self.handle_text(text).await,
                        Err(_) => {
                            tracing::warn!(
                                connection_id = %self.id,
                                "Dropping non UTF-8 binary frame"
                            );
                            FrameOutcome::Ignored
                        }
                    }
                }
                Message::Ping(_) => FrameOutcome::Ignored,
                Message::Pong(_) => {
                    tracing::trace!(connection_id = %self.id, "Keepalive acknowledged");
                    FrameOutcome::Ignored
                }
                Message::Close(_) => return Ok(()),
            };

            if let FrameOutcome::Reply(reply) = outcome {
                enqueue_reply(&reply_tx, reply)?;
            }
        }
    }

    fn check_frame_size(&self, size: usize) -> Result<(), ConnectionError> {
        let max = self.settings.max_frame_bytes;
        if size > max {
            return Err(ConnectionError::FrameTooLarge { size, max });
        }
        Ok(())
    }

    async fn handle_text(&mut self, text: &str) -> FrameOutcome {
        let frame: ClientFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(connection_id = %self.id, error = %e, "Dropping malformed frame");
                return FrameOutcome::Ignored;
            }
        };

        match MessageType::parse(&frame.r#type) {
            Some(MessageType::LocationUpdate) => self.handle_location_update(frame.data).await,
            Some(MessageType::Ping) => {
                let pong = PongMessage::new(Timestamp::new(mapshare_shared::time::now_millis()));
                match serde_json::to_string(&pong) {
                    Ok(reply) => FrameOutcome::Reply(reply),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize pong");
                        FrameOutcome::Ignored
                    }
                }
            }
            _ => {
                tracing::warn!(
                    connection_id = %self.id,
                    frame_type = %frame.r#type,
                    "Dropping frame of unsupported type"
                );
                FrameOutcome::Ignored
            }
        }
    }

    async fn handle_location_update(&mut self, data: serde_json::Value) -> FrameOutcome {
        let dto: LocationDto = match serde_json::from_value(data) {
            Ok(dto) => dto,
            Err(e) => {
                tracing::warn!(
                    connection_id = %self.id,
                    error = %e,
                    "Dropping location_update with invalid payload"
                );
                return FrameOutcome::Ignored;
            }
        };
        let now = Timestamp::new(mapshare_shared::time::now_millis());
        let location = match dto.into_location(now) {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!(
                    connection_id = %self.id,
                    error = %e,
                    "Dropping invalid location_update"
                );
                return FrameOutcome::Ignored;
            }
        };

        if self.participant_id.as_ref() != Some(&location.participant_id) {
            tracing::info!(
                session_id = %self.session_id,
                connection_id = %self.id,
                participant_id = %location.participant_id,
                "Connection bound to participant"
            );
            self.participant_id = Some(location.participant_id.clone());
        }

        if let Err(e) = self.store.update_location(&self.session_id, location).await {
            tracing::error!(session_id = %self.session_id, error = %e, "Failed to store location");
        }

        if let Err(e) = self.hub.request_broadcast(self.session_id.clone()).await {
            tracing::warn!(
                session_id = %self.session_id,
                error = %e,
                "Failed to request broadcast"
            );
        }

        FrameOutcome::Applied
    }
}

fn enqueue_reply(reply_tx: &WeakSender<String>, reply: String) -> Result<(), ConnectionError> {
    let Some(tx) = reply_tx.upgrade() else {
        return Err(ConnectionError::QueueClosed);
    };
    match tx.try_send(reply) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => Err(ConnectionError::QueueFull),
        Err(TrySendError::Closed(_)) => Err(ConnectionError::QueueClosed),
    }
}

async fn write_pump(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<String>,
    settings: ConnectionSettings,
) -> Result<(), ConnectionError> {
    let mut keepalive = time::interval_at(
        Instant::now() + settings.keepalive_interval,
        settings.keepalive_interval,
    );

    loop {
        tokio::select! {
            frame = outbound_rx.recv() => match frame {
                Some(text) => {
                    let frame = Message::Text(text.into());
                    send_with_deadline(&mut sink, frame, settings.write_timeout).await?;
                }
                None => {
                    let close = Message::Close(Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: "".into(),
                    }));
                    // the peer may already be gone
                    let _ = send_with_deadline(&mut sink, close, settings.write_timeout).await;
                    return Ok(());
                }
            },
            _ = keepalive.tick() => {
                let ping = Message::Ping(Default::default());
                send_with_deadline(&mut sink, ping, settings.write_timeout).await?;
            }
        }
    }
}

async fn send_with_deadline(
    sink: &mut SplitSink<WebSocket, Message>,
    message: Message,
    deadline: Duration,
) -> Result<(), ConnectionError> {
    match time::timeout(deadline, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ConnectionError::Transport(e.to_string())),
        Err(_) => Err(ConnectionError::WriteTimeout(deadline)),
    }
}
