//! HTTP and WebSocket surface of the location sharing server.

mod handler;
pub mod router;
mod runner;
mod signal;
pub mod state;

pub use runner::{ServerError, run, serve};
