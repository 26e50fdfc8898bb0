//! UseCase: open a new session
//!
//! Generates a fresh session id and stores the creator's initial location.

use std::sync::Arc;

use crate::domain::{Location, SessionId, SessionIdFactory, SessionStore};

use super::error::CreateSessionError;

pub struct CreateSessionUseCase {
    store: Arc<dyn SessionStore>,
}

impl CreateSessionUseCase {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Create a session seeded with `initial` and return its id
    pub async fn execute(&self, initial: Location) -> Result<SessionId, CreateSessionError> {
        let session_id = SessionIdFactory::generate();
        let participant_id = initial.participant_id.clone();

        self.store.create_session(&session_id, initial).await?;

        tracing::info!(
            session_id = %session_id,
            participant_id = %participant_id,
            "Session created"
        );
        Ok(session_id)
    }
}
