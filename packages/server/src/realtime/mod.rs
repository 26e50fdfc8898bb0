//! Realtime fan-out: the hub control loop and per-connection pumps.

pub mod connection;
pub mod hub;

pub use connection::{Connection, ConnectionError, ConnectionSettings};
pub use hub::{ConnectionId, Hub, HubError, HubHandle, Registration};
