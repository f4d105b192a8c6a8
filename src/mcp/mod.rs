pub mod arguments;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod registry;

pub use arguments::{ArgumentError, ToolCall};
pub use dispatcher::{Dispatcher, Session};
pub use error::McpError;
pub use protocol::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
pub use registry::{ToolDefinition, ToolKind, ToolRegistry};
