//! Route table.

use std::{path::Path, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::{handler, state::AppState};

/// Build the application router.
///
/// With `static_dir`, unknown paths are served from that directory and fall
/// back to its `index.html` so client-side routes resolve.
pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/health", get(handler::health_check))
        .route("/api/session", post(handler::create_session))
        .route("/api/session/{session_id}", get(handler::get_session))
        .route("/api/location", post(handler::submit_location))
        .route("/ws/{session_id}", get(handler::websocket_handler));

    let app = match static_dir {
        Some(dir) => {
            let spa = ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
            api.fallback_service(spa)
        }
        None => api,
    };

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
