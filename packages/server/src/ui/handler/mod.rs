//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{create_session, get_session, health_check, submit_location};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
