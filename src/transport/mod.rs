//! Transports carrying JSON-RPC frames between a client and the dispatcher.
//!
//! Both the WebSocket and the SSE endpoint are driven through [`Transport`], so
//! the session loops in [`session`] never know which wire they are on.

pub mod session;
pub mod sse;
pub mod websocket;

use crate::error::Result;
use async_trait::async_trait;

pub use session::{run_duplex, run_status_push};
pub use sse::SseTransport;
pub use websocket::WsTransport;

#[async_trait]
pub trait Transport: Send {
    /// Next inbound frame as raw bytes, or `Ok(None)` once the peer has gone
    /// away. Push-only transports resolve only on disconnect.
    async fn receive(&mut self) -> Result<Option<Vec<u8>>>;

    async fn send(&mut self, frame: String) -> Result<()>;

    async fn close(&mut self);
}
