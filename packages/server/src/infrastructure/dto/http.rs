//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

use mapshare_shared::time::millis_to_rfc3339;

use crate::domain::Session;

/// Body of `POST /api/session`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Response of `POST /api/session`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub message: String,
}

/// Body of `POST /api/location`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub session_id: String,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Session metadata returned by `GET /api/session/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub session_id: String,
    pub created_at: String, // RFC 3339
    pub expires_at: String, // RFC 3339
    pub user_count: usize,
}

impl From<&Session> for SessionDto {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.as_str().to_string(),
            created_at: millis_to_rfc3339(session.created_at.value()),
            expires_at: millis_to_rfc3339(session.expires_at.value()),
            user_count: session.participant_count,
        }
    }
}

/// Generic `{ "message": ... }` / `{ "error": ... }` bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            error: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            message: None,
            error: Some(text.into()),
        }
    }
}
