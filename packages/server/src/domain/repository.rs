//! Storage contract for sessions and their location sets.
//!
//! The domain layer defines the trait; implementations live in the
//! infrastructure layer (dependency inversion). Every operation must be safe
//! to call concurrently from the HTTP handlers, the hub and the sweeper.

use async_trait::async_trait;

use super::{Location, Session, SessionId, StoreError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create (or overwrite) a session seeded with one location.
    ///
    /// An existing session with the same id is replaced, including its
    /// location set.
    async fn create_session(
        &self,
        session_id: &SessionId,
        initial_location: Location,
    ) -> Result<(), StoreError>;

    /// Snapshot of the session metadata. Slides the expiration forward.
    async fn get_session(&self, session_id: &SessionId) -> Result<Session, StoreError>;

    /// Membership check without touching the expiration.
    async fn session_exists(&self, session_id: &SessionId) -> bool;

    /// Upsert the participant's location and slide the expiration forward.
    ///
    /// A missing session is created on the fly with default metadata. Callers
    /// that must not materialize sessions check [`session_exists`] first.
    ///
    /// [`session_exists`]: SessionStore::session_exists
    async fn update_location(
        &self,
        session_id: &SessionId,
        location: Location,
    ) -> Result<(), StoreError>;

    /// Every current location of the session, sorted by participant id.
    ///
    /// Slides the expiration forward. Returns `NotFound` only when the
    /// session record itself is absent.
    async fn get_all_locations(&self, session_id: &SessionId)
    -> Result<Vec<Location>, StoreError>;
}
