//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use mapshare_shared::time::now_millis;

use crate::{
    domain::{SessionId, Timestamp},
    infrastructure::dto::{
        LocationDto,
        http::{
            CreateSessionRequest, CreateSessionResponse, MessageResponse, SessionDto,
            UpdateLocationRequest,
        },
    },
    ui::state::AppState,
    usecase::{
        CreateSessionUseCase, GetSessionError, GetSessionUseCase, SubmitLocationError,
        SubmitLocationUseCase,
    },
};

type ApiError = (StatusCode, Json<MessageResponse>);

fn api_error(status: StatusCode, text: &str) -> ApiError {
    (status, Json(MessageResponse::error(text)))
}

fn bad_request(rejection: impl std::fmt::Display) -> ApiError {
    tracing::warn!(error = %rejection, "Rejected request body");
    api_error(StatusCode::BAD_REQUEST, "invalid request body")
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Open a session seeded with the creator's location
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let Json(req) = body.map_err(bad_request)?;

    let dto = LocationDto {
        user_id: req.user_id,
        latitude: req.latitude,
        longitude: req.longitude,
        timestamp: None,
    };
    let initial = dto
        .into_location(Timestamp::new(now_millis()))
        .map_err(bad_request)?;

    let usecase = CreateSessionUseCase::new(state.store.clone());
    match usecase.execute(initial).await {
        Ok(session_id) => Ok(Json(CreateSessionResponse {
            session_id: session_id.into_string(),
            message: "session created".to_string(),
        })),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create session");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create session",
            ))
        }
    }
}

/// Session metadata by id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDto>, ApiError> {
    // an id that cannot be valid cannot exist either
    let Ok(session_id) = SessionId::try_from(session_id) else {
        return Err(api_error(StatusCode::NOT_FOUND, "session not found"));
    };

    let usecase = GetSessionUseCase::new(state.store.clone());
    match usecase.execute(&session_id).await {
        Ok(session) => Ok(Json(SessionDto::from(&session))),
        Err(GetSessionError::NotFound(_)) => {
            Err(api_error(StatusCode::NOT_FOUND, "session not found"))
        }
        Err(e @ GetSessionError::Storage(_)) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed to load session");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to load session",
            ))
        }
    }
}

/// One-shot location update for an existing session.
///
/// Live members of the session get the new snapshot just like after a
/// WebSocket update.
pub async fn submit_location(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateLocationRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body.map_err(bad_request)?;

    let session_id = SessionId::try_from(req.session_id).map_err(bad_request)?;
    let dto = LocationDto {
        user_id: req.user_id,
        latitude: req.latitude,
        longitude: req.longitude,
        timestamp: None,
    };
    let location = dto
        .into_location(Timestamp::new(now_millis()))
        .map_err(bad_request)?;

    let usecase = SubmitLocationUseCase::new(state.store.clone());
    match usecase.execute(&session_id, location).await {
        Ok(()) => {
            if let Err(e) = state.hub.request_broadcast(session_id.clone()).await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to request broadcast");
            }
            Ok(Json(MessageResponse::message("location updated")))
        }
        Err(SubmitLocationError::SessionNotFound(_)) => {
            Err(api_error(StatusCode::NOT_FOUND, "session not found"))
        }
        Err(e @ SubmitLocationError::Storage(_)) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed to update location");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to update location",
            ))
        }
    }
}
