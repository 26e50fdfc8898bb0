//! SessionStore implementations.
//!
//! The usecase and realtime layers depend on the `SessionStore` trait from the
//! domain layer, never on these types directly (dependency inversion).

pub mod inmemory;

pub use inmemory::{ExpirySweeper, InMemorySessionStore, SweepReport};
