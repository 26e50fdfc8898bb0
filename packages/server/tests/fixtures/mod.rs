//! Shared helpers for integration tests.
//!
//! The server runs in-process on an ephemeral port, one instance per test.

#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use mapshare_server::ServerConfig;
use serde_json::Value;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for a frame it expects
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = mapshare_server::serve(listener, config, shutdown).await {
                panic!("test server failed: {e}");
            }
        });

        Self {
            addr,
            shutdown: Some(shutdown),
            task,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, session_id: &str) -> String {
        format!("ws://{}/ws/{}", self.addr, session_id)
    }

    /// Create a session over HTTP and return its id
    pub async fn create_session(&self, user_id: &str, latitude: f64, longitude: f64) -> String {
        let response = reqwest::Client::new()
            .post(format!("{}/api/session", self.base_url()))
            .json(&serde_json::json!({
                "userId": user_id,
                "latitude": latitude,
                "longitude": longitude,
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["sessionId"]
            .as_str()
            .expect("sessionId missing")
            .to_string()
    }

    pub async fn connect(&self, session_id: &str) -> WsClient {
        let (ws, _) = connect_async(self.ws_url(session_id))
            .await
            .expect("Failed to connect WebSocket");
        ws
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.task.abort();
    }
}

pub async fn send_json(ws: &mut WsClient, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("Failed to send frame");
}

pub async fn send_location(ws: &mut WsClient, user_id: &str, latitude: f64, longitude: f64) {
    send_json(
        ws,
        serde_json::json!({
            "type": "location_update",
            "data": {
                "userId": user_id,
                "latitude": latitude,
                "longitude": longitude,
                "timestamp": 1_700_000_000_000i64,
            }
        }),
    )
    .await;
}

/// Next JSON text frame, skipping control frames
pub async fn next_json(ws: &mut WsClient) -> Value {
    try_next_json(ws, RECV_TIMEOUT)
        .await
        .expect("Timed out waiting for a frame")
}

/// Like [`next_json`] but returns `None` if nothing arrives within `wait`
pub async fn try_next_json(ws: &mut WsClient, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let frame = tokio::time::timeout_at(deadline, ws.next()).await.ok()??;
        match frame.expect("WebSocket error") {
            Message::Text(text) => {
                return Some(serde_json::from_str(text.as_str()).expect("Frame is not JSON"));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// User ids of an `all_locations` frame, in order
pub fn user_ids(frame: &Value) -> Vec<String> {
    assert_eq!(frame["type"], "all_locations", "unexpected frame: {frame}");
    frame["data"]
        .as_array()
        .expect("data is not an array")
        .iter()
        .map(|l| l["userId"].as_str().expect("userId missing").to_string())
        .collect()
}
