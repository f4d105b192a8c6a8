use crate::backend::Gateway;
use crate::config::Config;
use crate::error::Result;
use crate::mcp::protocol::{MCP_PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::mcp::{Dispatcher, Session, ToolRegistry};
use crate::transport::{run_duplex, run_status_push, SseTransport, WsTransport};
use axum::{
    body::Bytes,
    extract::{ws::WebSocketUpgrade, State},
    http::{header, HeaderName, StatusCode},
    response::{sse::Sse, Html, IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Events buffered per `/events` client before the push loop waits
const EVENT_BUFFER: usize = 16;

const MCP_PROTOCOL_VERSION_HEADER: &str = "x-mcp-protocol-version";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, config: Config) -> Self {
        Self {
            dispatcher,
            config: Arc::new(config),
        }
    }

    /// Build the registry and the reqwest-backed gateway from configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let registry = Arc::new(ToolRegistry::new());
        let gateway = Gateway::from_config(&config.backend)?;
        Ok(Self::new(Dispatcher::new(registry, gateway), config))
    }
}

/// Upgrade to the duplex MCP transport
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("WebSocket upgrade for MCP session");
    let dispatcher = state.dispatcher.clone();
    ws.on_upgrade(move |socket| run_duplex(WsTransport::new(socket), dispatcher))
}

/// Server-push fallback stream: announcement, then periodic status
pub async fn events_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (transport, stream) = SseTransport::channel(EVENT_BUFFER);
    let interval = state.config.events.status_interval();

    tokio::spawn(run_status_push(
        transport,
        state.dispatcher.clone(),
        interval,
    ));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (
                HeaderName::from_static(MCP_PROTOCOL_VERSION_HEADER),
                MCP_PROTOCOL_VERSION,
            ),
        ],
        Sse::new(stream),
    )
}

/// One JSON-RPC request per HTTP body. Notifications are acknowledged with 202.
pub async fn message_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let mut session = Session::new();

    match state.dispatcher.handle_frame(&mut session, &body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let backend = state.dispatcher.gateway().health().await;

    Json(json!({
        "status": backend.status(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "protocol": "MCP",
        "version": MCP_PROTOCOL_VERSION,
        "backend": backend.body,
        "tools_available": state.dispatcher.registry().len(),
        "websocket_url": state.config.server.websocket_url()
    }))
}

/// Informational landing page
pub async fn root(State(state): State<Arc<AppState>>) -> Html<String> {
    let tools: String = state
        .dispatcher
        .registry()
        .list_tools()
        .iter()
        .map(|tool| format!("            <li>{}</li>\n", tool.name))
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <title>{name}</title>
    </head>
    <body>
        <h1>{name}</h1>
        <p><strong>Protocol:</strong> Model Context Protocol ({protocol})</p>
        <p><strong>Version:</strong> {version}</p>
        <p><strong>WebSocket URL:</strong> {ws_url}</p>
        <p><strong>Event stream:</strong> <a href="/events">/events</a></p>
        <p><strong>Health Check:</strong> <a href="/health">/health</a></p>
        <p><strong>Tools Available:</strong> {count}</p>
        <ul>
{tools}        </ul>
    </body>
</html>
"#,
        name = SERVER_NAME,
        protocol = MCP_PROTOCOL_VERSION,
        version = SERVER_VERSION,
        ws_url = state.config.server.websocket_url(),
        count = state.dispatcher.registry().len(),
        tools = tools,
    ))
}
