//! Data transfer objects for the WebSocket protocol and the HTTP API.
//!
//! Domain types carry no serde derives; conversion happens here.

pub mod http;
pub mod websocket;

pub use websocket::LocationDto;
