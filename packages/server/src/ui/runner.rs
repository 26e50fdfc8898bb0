//! Server wiring: store, sweeper, hub and the axum server.

use std::{future::Future, io, sync::Arc};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::{
    config::ServerConfig,
    domain::SessionStore,
    infrastructure::repository::{ExpirySweeper, InMemorySessionStore},
    realtime::Hub,
};

use super::{router::build_router, signal::shutdown_signal, state::AppState};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(addr = %addr, "Listening");

    serve(listener, config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = Arc::new(InMemorySessionStore::new(config.session_ttl));
    let sweeper = ExpirySweeper::spawn(&store, config.sweep_interval);

    let store: Arc<dyn SessionStore> = store;
    let (hub, hub_task) = Hub::spawn(store.clone(), config.hub_capacity);

    let state = Arc::new(AppState {
        store,
        hub,
        connection: config.connection,
    });
    let app = build_router(state, config.static_dir.as_deref());

    tracing::info!(
        session_ttl_secs = config.session_ttl.as_secs(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        static_dir = ?config.static_dir,
        "Server started"
    );

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    sweeper.shutdown();
    // upgraded connections may still hold hub handles
    hub_task.abort();
    tracing::info!("Server stopped");

    Ok(result?)
}
