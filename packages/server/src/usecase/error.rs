//! UseCase error types

use thiserror::Error;

use crate::domain::StoreError;

/// Error while creating a session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreateSessionError {
    #[error("failed to create session: {0}")]
    Storage(String),
}

/// Error while looking a session up
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GetSessionError {
    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("failed to load session: {0}")]
    Storage(String),
}

/// Error while submitting a one-shot location over HTTP
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitLocationError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("failed to update location: {0}")]
    Storage(String),
}

impl From<StoreError> for CreateSessionError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<StoreError> for GetSessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id.into_string()),
            StoreError::Storage(msg) => Self::Storage(msg),
        }
    }
}

impl From<StoreError> for SubmitLocationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::SessionNotFound(id.into_string()),
            StoreError::Storage(msg) => Self::Storage(msg),
        }
    }
}
