use super::Transport;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use axum::response::sse::Event;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Push-only transport feeding an axum `Sse` response.
///
/// Frames are queued on a bounded channel whose receiving end is the response
/// body stream. When the client disconnects axum drops that stream, which
/// closes the channel and ends the push loop.
pub struct SseTransport {
    tx: mpsc::Sender<std::result::Result<Event, Infallible>>,
}

pub type SseStream = ReceiverStream<std::result::Result<Event, Infallible>>;

impl SseTransport {
    pub fn channel(buffer: usize) -> (Self, SseStream) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, ReceiverStream::new(rx))
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        self.tx.closed().await;
        Ok(None)
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.tx
            .send(Ok(Event::default().data(frame)))
            .await
            .map_err(|_| AppError::TransportClosed)
    }

    async fn close(&mut self) {}
}
