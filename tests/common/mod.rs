#![allow(dead_code)]

use async_trait::async_trait;
use healthcare_mcp::backend::{Backend, BackendError, Gateway, Outcome};
use healthcare_mcp::config::BackendPaths;
use healthcare_mcp::mcp::{Dispatcher, ToolRegistry};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

/// Backend double that records every request and answers with a fixed outcome
pub struct RecordingBackend {
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
    outcome: Outcome,
}

impl RecordingBackend {
    pub fn answering(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            outcome,
        })
    }

    pub fn ok(body: Value) -> Arc<Self> {
        Self::answering(Ok(body))
    }

    pub fn failing(error: BackendError) -> Arc<Self> {
        Self::answering(Err(error))
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn get(&self, path: &str, query: &Map<String, Value>) -> Outcome {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), query.clone()));
        self.outcome.clone()
    }
}

pub fn dispatcher_with(backend: Arc<RecordingBackend>) -> Dispatcher {
    let gateway = Gateway::new(backend, BackendPaths::default(), "/health");
    Dispatcher::new(Arc::new(ToolRegistry::new()), gateway)
}

pub fn request(id: Value, method: &str, params: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
    .to_string()
}

pub fn tool_call(id: i64, name: &str, arguments: Value) -> String {
    request(
        json!(id),
        "tools/call",
        json!({ "name": name, "arguments": arguments }),
    )
}

/// Turn `query` maps into plain JSON for comparisons
pub fn query_json(query: &Map<String, Value>) -> Value {
    Value::Object(query.clone())
}
