use crate::config::{BackendConfig, BackendPaths};
use crate::error::Result;
use crate::mcp::arguments::ToolCall;
use crate::mcp::registry::ToolKind;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::http::HttpBackend;

/// Result of one backend round trip. Failures are values, never panics.
pub type Outcome = std::result::Result<Value, BackendError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Backend service timeout")]
    Timeout,

    #[error("Backend service unavailable: {0}")]
    Unreachable(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid JSON from backend: {0}")]
    InvalidBody(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl BackendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout)
    }
}

/// Snapshot of the backend health probe
#[derive(Debug, Clone, PartialEq)]
pub struct BackendHealth {
    pub healthy: bool,
    /// Backend `/health` document, or `{"error": ...}` when the probe failed
    pub body: Value,
}

impl BackendHealth {
    pub fn status(&self) -> &'static str {
        if self.healthy {
            "healthy"
        } else {
            "unhealthy"
        }
    }
}

impl From<Outcome> for BackendHealth {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            // Backends report soft failures as a 200 carrying an "error" member
            Ok(body) => Self {
                healthy: body.get("error").is_none(),
                body,
            },
            Err(e) => Self {
                healthy: false,
                body: json!({ "error": e.to_string() }),
            },
        }
    }
}

/// Something that can answer a GET with a JSON document.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, path: &str, query: &Map<String, Value>) -> Outcome;
}

/// Maps typed tool calls onto backend paths and forwards them, one attempt each.
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn Backend>,
    paths: Arc<BackendPaths>,
    health_path: Arc<str>,
}

impl Gateway {
    pub fn new(backend: Arc<dyn Backend>, paths: BackendPaths, health_path: &str) -> Self {
        Self {
            backend,
            paths: Arc::new(paths),
            health_path: Arc::from(health_path),
        }
    }

    /// Build a gateway backed by the reqwest client described in `config`
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let backend = HttpBackend::new(&config.base_url, config.timeout(), &config.user_agent)?;
        Ok(Self::new(
            Arc::new(backend),
            config.paths.clone(),
            &config.health_path,
        ))
    }

    pub fn path_for(&self, kind: ToolKind) -> &str {
        match kind {
            ToolKind::FdaDrugLookup => &self.paths.fda,
            ToolKind::PubmedSearch => &self.paths.pubmed,
            ToolKind::HealthTopics => &self.paths.health_topics,
            ToolKind::ClinicalTrialsSearch => &self.paths.clinical_trials,
            ToolKind::LookupIcdCode => &self.paths.icd,
        }
    }

    pub async fn call(&self, call: &ToolCall) -> Outcome {
        let path = self.path_for(call.kind());
        let query = call.query();

        info!(tool = call.kind().name(), path, "Calling backend");
        let outcome = self.backend.get(path, &query).await;

        if let Err(e) = &outcome {
            warn!(
                tool = call.kind().name(),
                path,
                timeout = e.is_timeout(),
                "Backend call failed: {}",
                e
            );
        }

        outcome
    }

    /// Probe the backend health endpoint
    pub async fn health(&self) -> BackendHealth {
        let outcome = self.backend.get(&self.health_path, &Map::new()).await;
        if let Err(e) = &outcome {
            debug!("Backend health probe failed: {}", e);
        }
        outcome.into()
    }
}
