pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod mcp;
pub mod transport;

// Re-export commonly used items
pub use api::{create_router, AppState};
pub use backend::{Backend, BackendError, Gateway, HttpBackend};
pub use config::Config;
pub use error::{AppError, Result};
pub use mcp::{Dispatcher, Session, ToolRegistry};
