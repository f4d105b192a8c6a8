use super::arguments::{ArgumentError, ToolCall};
use super::error::McpError;
use super::protocol::{
    initialize_result, JsonRpcRequest, JsonRpcResponse, McpMethod, ToolCallParams, ToolResult,
    JSONRPC_VERSION,
};
use super::registry::ToolRegistry;
use crate::backend::Gateway;
use futures::FutureExt;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Per-connection protocol state
#[derive(Debug)]
pub struct Session {
    id: String,
    initialized: bool,
    client_info: Option<Value>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            initialized: false,
            client_info: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn client_info(&self) -> Option<&Value> {
        self.client_info.as_ref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes JSON-RPC requests to their handlers.
///
/// Every failure is folded into a JSON-RPC error object here; callers only
/// ever see `Some(response)` or `None` for notifications.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    gateway: Gateway,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, gateway: Gateway) -> Self {
        Self { registry, gateway }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Decode one inbound frame and dispatch it. Bytes that are not valid
    /// UTF-8 JSON are answered with a parse error.
    pub async fn handle_frame(
        &self,
        session: &mut Session,
        frame: impl AsRef<[u8]>,
    ) -> Option<JsonRpcResponse> {
        match parse_frame(frame) {
            Ok(request) => self.dispatch(session, request).await,
            Err(err) => {
                warn!(session_id = %session.id(), "Rejecting frame: {}", err);
                Some(JsonRpcResponse::error(Value::Null, err.into()))
            }
        }
    }

    pub async fn dispatch(
        &self,
        session: &mut Session,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        let method = McpMethod::from(request.method.as_str());
        // notifications/initialized never gets a reply, even when sent with an id
        let reply_id = match method {
            McpMethod::Initialized => None,
            _ => request.id.clone(),
        };

        info!(
            session_id = %session.id(),
            method = %request.method,
            id = ?request.id,
            "Handling MCP message"
        );

        let outcome = if request.jsonrpc != JSONRPC_VERSION {
            Err(McpError::InvalidRequest(format!(
                "jsonrpc must be \"{}\", got \"{}\"",
                JSONRPC_VERSION, request.jsonrpc
            )))
        } else {
            AssertUnwindSafe(self.route(session, method, request.params.as_ref()))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    error!(method = %request.method, "Handler panicked");
                    Err(McpError::Internal(panic_message(panic.as_ref())))
                })
        };

        let Some(id) = reply_id else {
            if let Err(err) = outcome {
                debug!(method = %request.method, "Notification not handled: {}", err);
            }
            return None;
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::ok(id, result),
            Err(err) => {
                warn!(method = %request.method, code = err.code(), "Request failed: {}", err);
                JsonRpcResponse::error(id, err.into())
            }
        })
    }

    async fn route(
        &self,
        session: &mut Session,
        method: McpMethod<'_>,
        params: Option<&Value>,
    ) -> Result<Value, McpError> {
        match method {
            McpMethod::Initialize => {
                session.client_info = params.and_then(|p| p.get("clientInfo")).cloned();
                Ok(initialize_result())
            }
            McpMethod::Initialized => {
                session.initialized = true;
                info!(session_id = %session.id(), "Client initialization complete");
                Ok(Value::Null)
            }
            McpMethod::ToolsList => Ok(self.registry.listing().clone()),
            McpMethod::ToolsCall => {
                if !session.initialized {
                    debug!(session_id = %session.id(), "tools/call before initialization");
                }
                self.call_tool(params).await
            }
            McpMethod::Ping => Ok(json!({})),
            McpMethod::Unknown(name) => Err(McpError::MethodNotFound(name.to_string())),
        }
    }

    async fn call_tool(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let params = params
            .ok_or_else(|| McpError::InvalidParams("tools/call requires params".to_string()))?;
        let params: ToolCallParams = serde_json::from_value(params.clone())
            .map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let tool = self.registry.lookup(&params.name)?;

        let call = match ToolCall::parse(tool, &params.arguments) {
            Ok(call) => call,
            Err(ArgumentError::Missing(name)) => {
                return Err(McpError::MissingArgument(name.to_string()))
            }
            Err(ArgumentError::NotAnObject) => {
                return Err(McpError::InvalidParams(
                    ArgumentError::NotAnObject.to_string(),
                ))
            }
            Err(err) => {
                warn!(tool = tool.name, "Invalid arguments: {}", err);
                return Ok(serde_json::to_value(ToolResult::error_payload(
                    err.to_string(),
                ))?);
            }
        };

        let payload = self.gateway.call(&call).await?;
        let text = serde_json::to_string_pretty(&payload)?;

        Ok(serde_json::to_value(ToolResult::text(text))?)
    }
}

/// Parse a raw frame into a request. Anything that is not a UTF-8 JSON object
/// with `jsonrpc` and `method` is a parse error.
pub fn parse_frame(frame: impl AsRef<[u8]>) -> Result<JsonRpcRequest, McpError> {
    serde_json::from_slice(frame.as_ref()).map_err(|e| McpError::Parse(e.to_string()))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
