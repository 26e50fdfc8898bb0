//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{
    domain::SessionStore,
    realtime::{ConnectionSettings, HubHandle},
};

pub struct AppState {
    /// SessionStore (abstraction over the data access layer)
    pub store: Arc<dyn SessionStore>,
    /// Handle to the fan-out hub
    pub hub: HubHandle,
    /// Limits applied to every new WebSocket connection
    pub connection: ConnectionSettings,
}
