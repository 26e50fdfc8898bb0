//! Domain layer for location sharing.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod clock;
pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub use clock::ManualClock;
pub use entity::{Location, Session};
pub use error::{StoreError, ValueObjectError};
pub use factory::SessionIdFactory;
pub use repository::SessionStore;
#[cfg(test)]
pub use repository::MockSessionStore;
pub use value_object::{Coordinates, ParticipantId, SessionId, Timestamp};
