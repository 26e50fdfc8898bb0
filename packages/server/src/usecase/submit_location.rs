//! UseCase: one-shot location submission over HTTP
//!
//! Unlike the WebSocket path, this never creates a session: the session has
//! to exist already.

use std::sync::Arc;

use crate::domain::{Location, SessionId, SessionStore};

use super::error::SubmitLocationError;

pub struct SubmitLocationUseCase {
    store: Arc<dyn SessionStore>,
}

impl SubmitLocationUseCase {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        session_id: &SessionId,
        location: Location,
    ) -> Result<(), SubmitLocationError> {
        if !self.store.session_exists(session_id).await {
            return Err(SubmitLocationError::SessionNotFound(
                session_id.as_str().to_string(),
            ));
        }

        let participant_id = location.participant_id.clone();
        self.store.update_location(session_id, location).await?;

        tracing::debug!(
            session_id = %session_id,
            participant_id = %participant_id,
            "Location submitted"
        );
        Ok(())
    }
}
