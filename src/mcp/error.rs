//! Error taxonomy of the message dispatcher and its single translation into
//! JSON-RPC error objects.

use super::protocol::{error_codes, JsonRpcError};
use crate::backend::BackendError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        match self {
            McpError::Parse(_) => error_codes::PARSE_ERROR,
            McpError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            McpError::MethodNotFound(_)
            | McpError::ToolNotFound(_)
            | McpError::MissingArgument(_) => error_codes::METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            McpError::Backend(_) | McpError::Internal(_) | McpError::Serialization(_) => {
                error_codes::INTERNAL_ERROR
            }
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        let error = JsonRpcError::new(err.code(), err.to_string());
        match err {
            McpError::ToolNotFound(tool) => error.with_data(json!({ "tool": tool })),
            _ => error,
        }
    }
}
