//! UseCase: look up session metadata

use std::sync::Arc;

use crate::domain::{Session, SessionId, SessionStore};

use super::error::GetSessionError;

pub struct GetSessionUseCase {
    store: Arc<dyn SessionStore>,
}

impl GetSessionUseCase {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Fetch the session. Counts as activity, so expiration slides forward.
    pub async fn execute(&self, session_id: &SessionId) -> Result<Session, GetSessionError> {
        Ok(self.store.get_session(session_id).await?)
    }
}
