//! Realtime location sharing server.
//!
//! Participants join a session over WebSocket and every accepted location
//! update is fanned out as the full location set to everyone in that
//! session. Sessions live in memory and expire after a period of inactivity.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod realtime;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::{ServerArgs, ServerConfig};
pub use ui::{run, serve};
