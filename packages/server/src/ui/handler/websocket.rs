//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::{
    extract::{Path, State, ws::WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{domain::SessionId, realtime::Connection, ui::state::AppState};

/// Upgrade `GET /ws/{session_id}` into a live connection.
///
/// The session does not have to exist yet: the first `location_update`
/// creates it.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let session_id = match SessionId::try_from(session_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting WebSocket upgrade with invalid session id");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let settings = state.connection;
    let connection = Connection::new(
        session_id.clone(),
        state.store.clone(),
        state.hub.clone(),
        settings,
    );
    tracing::info!(
        session_id = %session_id,
        connection_id = %connection.id(),
        "WebSocket upgrade accepted"
    );

    Ok(ws
        .max_message_size(settings.max_frame_bytes)
        .max_frame_size(settings.max_frame_bytes)
        .on_upgrade(move |socket| connection.serve(socket)))
}
