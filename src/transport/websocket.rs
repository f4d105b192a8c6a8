use super::Transport;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use tracing::debug;

/// Duplex transport over an upgraded axum WebSocket
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        while let Some(msg_result) = self.socket.recv().await {
            let msg = msg_result.map_err(|e| AppError::WebSocket(e.to_string()))?;

            match msg {
                Message::Text(text) => return Ok(Some(text.as_str().as_bytes().to_vec())),
                // Decoded by the dispatcher; invalid UTF-8 gets a parse error reply
                Message::Binary(bytes) => return Ok(Some(bytes.to_vec())),
                Message::Close(frame) => {
                    debug!("Client sent close frame: {:?}", frame);
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Axum handles ping/pong automatically
                }
            }
        }

        Ok(None)
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.socket
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| AppError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.send(Message::Close(None)).await {
            debug!("Close frame not delivered: {}", e);
        }
    }
}
