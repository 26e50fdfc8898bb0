//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::SessionId;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueObjectError {
    /// ParticipantId validation error
    #[error("ParticipantId cannot be empty")]
    ParticipantIdEmpty,

    /// ParticipantId too long error
    #[error("ParticipantId cannot exceed {max} characters (got {actual})")]
    ParticipantIdTooLong { max: usize, actual: usize },

    /// SessionId validation error
    #[error("SessionId cannot be empty")]
    SessionIdEmpty,

    /// SessionId too long error
    #[error("SessionId cannot exceed {max} characters (got {actual})")]
    SessionIdTooLong { max: usize, actual: usize },

    #[error("latitude must be a finite value within [-90, 90] (got {0})")]
    LatitudeOutOfRange(f64),

    #[error("longitude must be a finite value within [-180, 180] (got {0})")]
    LongitudeOutOfRange(f64),
}

/// Errors returned by a [`SessionStore`](super::repository::SessionStore)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The session record does not exist. An expected outcome, not a fault.
    #[error("session '{0}' not found")]
    NotFound(SessionId),

    /// The backing store failed to complete the operation.
    #[error("storage backend failure: {0}")]
    Storage(String),
}
