//! Session-scoped fan-out hub.
//!
//! The hub is an actor: one task owns the `session -> connections` registry
//! and every mutation reaches it as a message on one of three channels
//! (register, unregister, broadcast request). Nothing else can touch the
//! registry, so it needs no lock.
//!
//! Every broadcast re-reads the full location set from the store and pushes
//! the complete snapshot, so all members of a session converge on the same
//! state regardless of how updates interleave.

use std::{collections::HashMap, fmt, sync::Arc};

use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    domain::{SessionId, SessionStore, StoreError},
    infrastructure::dto::websocket::AllLocationsMessage,
};

/// Default capacity of each of the hub's input channels
pub const DEFAULT_HUB_CHANNEL_CAPACITY: usize = 1024;

/// Sending half of a connection's outbound queue
pub type OutboundSender = mpsc::Sender<String>;

/// Identifier of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connection asking to join its session's fan-out set.
///
/// The hub keeps `outbound` as the only strong sender of the connection's
/// queue; dropping it on unregister or eviction closes the queue.
#[derive(Debug)]
pub struct Registration {
    pub connection_id: ConnectionId,
    pub session_id: SessionId,
    pub outbound: OutboundSender,
}

#[derive(Debug)]
struct Unregistration {
    connection_id: ConnectionId,
    session_id: SessionId,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    #[error("hub control loop is no longer running")]
    Closed,
}

/// Cloneable handle to the hub's control loop
#[derive(Debug, Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<Registration>,
    unregister_tx: mpsc::Sender<Unregistration>,
    broadcast_tx: mpsc::Sender<SessionId>,
}

impl HubHandle {
    /// Add a connection to its session and push the current snapshot to the session
    pub async fn register(&self, registration: Registration) -> Result<(), HubError> {
        self.register_tx
            .send(registration)
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Remove a connection from its session. Unknown connections are ignored.
    pub async fn unregister(
        &self,
        session_id: SessionId,
        connection_id: ConnectionId,
    ) -> Result<(), HubError> {
        self.unregister_tx
            .send(Unregistration {
                connection_id,
                session_id,
            })
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Ask the hub to push a fresh snapshot to every member of `session_id`
    pub async fn request_broadcast(&self, session_id: SessionId) -> Result<(), HubError> {
        self.broadcast_tx
            .send(session_id)
            .await
            .map_err(|_| HubError::Closed)
    }
}

/// Registry of live connections, grouped by session
pub struct Hub {
    store: Arc<dyn SessionStore>,
    sessions: HashMap<SessionId, HashMap<ConnectionId, OutboundSender>>,
    register_rx: mpsc::Receiver<Registration>,
    unregister_rx: mpsc::Receiver<Unregistration>,
    broadcast_rx: mpsc::Receiver<SessionId>,
}

impl Hub {
    /// Create the hub and its handle without starting the control loop
    pub fn new(store: Arc<dyn SessionStore>, channel_capacity: usize) -> (Self, HubHandle) {
        let (register_tx, register_rx) = mpsc::channel(channel_capacity);
        let (unregister_tx, unregister_rx) = mpsc::channel(channel_capacity);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(channel_capacity);

        let hub = Self {
            store,
            sessions: HashMap::new(),
            register_rx,
            unregister_rx,
            broadcast_rx,
        };
        let handle = HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
        };
        (hub, handle)
    }

    /// Create the hub and run its control loop on the current runtime
    pub fn spawn(
        store: Arc<dyn SessionStore>,
        channel_capacity: usize,
    ) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(store, channel_capacity);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Control loop. Returns once every [`HubHandle`] has been dropped.
    pub async fn run(mut self) {
        tracing::info!("Hub control loop started");

        loop {
            // biased: a connection's registration is always enqueued before its
            // unregistration, so draining registrations first never lets an
            // unregister overtake the register it belongs to.
            tokio::select! {
                biased;
                Some(registration) = self.register_rx.recv() => {
                    self.handle_register(registration).await;
                }
                Some(unregistration) = self.unregister_rx.recv() => {
                    self.handle_unregister(unregistration);
                }
                Some(session_id) = self.broadcast_rx.recv() => {
                    self.broadcast_snapshot(&session_id).await;
                }
                else => break,
            }
        }

        tracing::info!("Hub control loop stopped");
    }

    async fn handle_register(&mut self, registration: Registration) {
        let Registration {
            connection_id,
            session_id,
            outbound,
        } = registration;

        let members = self.sessions.entry(session_id.clone()).or_default();
        members.insert(connection_id, outbound);
        tracing::info!(
            session_id = %session_id,
            connection_id = %connection_id,
            members = members.len(),
            "Connection registered"
        );

        self.broadcast_snapshot(&session_id).await;
    }

    fn handle_unregister(&mut self, unregistration: Unregistration) {
        let Unregistration {
            connection_id,
            session_id,
        } = unregistration;

        if self.remove_member(&session_id, connection_id) {
            tracing::info!(
                session_id = %session_id,
                connection_id = %connection_id,
                "Connection unregistered"
            );
        } else {
            tracing::debug!(
                session_id = %session_id,
                connection_id = %connection_id,
                "Unregister for unknown connection ignored"
            );
        }
    }

    /// Drop a member (and thereby its queue sender). Removes the session entry once empty.
    fn remove_member(&mut self, session_id: &SessionId, connection_id: ConnectionId) -> bool {
        let Some(members) = self.sessions.get_mut(session_id) else {
            return false;
        };
        let removed = members.remove(&connection_id).is_some();
        if members.is_empty() {
            self.sessions.remove(session_id);
        }
        removed
    }

    async fn broadcast_snapshot(&mut self, session_id: &SessionId) {
        if !self.sessions.contains_key(session_id) {
            tracing::debug!(session_id = %session_id, "No live connections, broadcast skipped");
            return;
        }

        let locations = match self.store.get_all_locations(session_id).await {
            Ok(locations) => locations,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(
                    session_id = %session_id,
                    "Session not in store, sending empty snapshot"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to load locations for broadcast"
                );
                return;
            }
        };

        let frame = match serde_json::to_string(&AllLocationsMessage::new(session_id, &locations)) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to serialize snapshot"
                );
                return;
            }
        };

        let Some(members) = self.sessions.get(session_id) else {
            return;
        };

        let mut evicted = Vec::new();
        for (connection_id, outbound) in members {
            match outbound.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        session_id = %session_id,
                        connection_id = %connection_id,
                        "Outbound queue full, dropping connection"
                    );
                    evicted.push(*connection_id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        session_id = %session_id,
                        connection_id = %connection_id,
                        "Outbound queue closed, dropping connection"
                    );
                    evicted.push(*connection_id);
                }
            }
        }

        tracing::debug!(
            session_id = %session_id,
            locations = locations.len(),
            recipients = members.len() - evicted.len(),
            "Broadcasted all_locations"
        );

        for connection_id in evicted {
            self.remove_member(session_id, connection_id);
        }
    }

    #[cfg(test)]
    fn member_count(&self, session_id: &SessionId) -> usize {
        self.sessions.get(session_id).map_or(0, HashMap::len)
    }
}
