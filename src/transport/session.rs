use super::Transport;
use crate::error::Result;
use crate::mcp::protocol::{
    server_capabilities, server_info, JsonRpcNotification, MCP_PROTOCOL_VERSION,
};
use crate::mcp::{Dispatcher, Session};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest frame excerpt written to the logs
const LOG_PREVIEW_CHARS: usize = 200;

/// Sent unsolicited as the first frame of every duplex session
pub fn duplex_announcement() -> JsonRpcNotification {
    JsonRpcNotification::new(
        "notifications/initialized",
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": server_capabilities(),
            "serverInfo": server_info()
        }),
    )
}

/// First event of the `/events` stream
pub fn events_announcement(dispatcher: &Dispatcher) -> JsonRpcNotification {
    JsonRpcNotification::new(
        "notifications/initialized",
        json!({
            "serverInfo": server_info(),
            "capabilities": server_capabilities(),
            "tools": dispatcher.registry().wire_tools()
        }),
    )
}

/// Periodic `/events` status carrying the backend health probe
pub async fn status_notification(dispatcher: &Dispatcher) -> JsonRpcNotification {
    let health = dispatcher.gateway().health().await;

    JsonRpcNotification::new(
        "notifications/status",
        json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "status": health.status(),
            "backend": health.body,
            "capabilities": server_capabilities(),
            "tools_count": dispatcher.registry().len()
        }),
    )
}

/// Receive a frame, dispatch it, send the reply; repeat until the peer leaves.
///
/// Frames are handled one at a time, so replies go out in request order.
pub async fn run_duplex<T: Transport>(mut transport: T, dispatcher: Dispatcher) {
    let mut session = Session::new();
    info!(session_id = %session.id(), "MCP session opened");

    if let Err(e) = send_json(&mut transport, &duplex_announcement()).await {
        warn!(session_id = %session.id(), "Failed to send announcement: {}", e);
        transport.close().await;
        return;
    }

    loop {
        let frame = match transport.receive().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!(session_id = %session.id(), "Client disconnected");
                break;
            }
            Err(e) => {
                error!(session_id = %session.id(), "Transport error: {}", e);
                break;
            }
        };

        debug!(
            session_id = %session.id(),
            "Received MCP message: {}",
            preview(&String::from_utf8_lossy(&frame))
        );

        let Some(response) = dispatcher.handle_frame(&mut session, &frame).await else {
            continue;
        };

        if let Err(e) = send_json(&mut transport, &response).await {
            warn!(session_id = %session.id(), "Failed to send response: {}", e);
            break;
        }
    }

    transport.close().await;
    info!(
        session_id = %session.id(),
        initialized = session.is_initialized(),
        "MCP session closed"
    );
}

/// Push the announcement, then a status frame every `interval`, until the
/// client disconnects.
pub async fn run_status_push<T: Transport>(
    mut transport: T,
    dispatcher: Dispatcher,
    interval: Duration,
) {
    info!("Event stream opened");

    if let Err(e) = send_json(&mut transport, &events_announcement(&dispatcher)).await {
        debug!("Event stream closed before announcement: {}", e);
        return;
    }

    loop {
        let status = status_notification(&dispatcher).await;
        if let Err(e) = send_json(&mut transport, &status).await {
            debug!("Event stream send failed: {}", e);
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            closed = transport.receive() => {
                if let Err(e) = closed {
                    debug!("Event stream transport error: {}", e);
                }
                break;
            }
        }
    }

    transport.close().await;
    info!("Event stream closed");
}

async fn send_json<T, M>(transport: &mut T, message: &M) -> Result<()>
where
    T: Transport,
    M: serde::Serialize,
{
    let text = serde_json::to_string(message)?;
    debug!("Sending MCP frame: {}", preview(&text));
    transport.send(text).await
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
