use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// WebSocket URL advertised by `/` and `/health`
    #[serde(default)]
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default)]
    pub paths: BackendPaths,
}

/// Backend path per tool. Health topics and ICD lookups have two spellings in
/// deployed backends (`/api/health-topics`, `/api/icd`), so both are overridable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPaths {
    #[serde(default = "default_fda_path")]
    pub fda: String,
    #[serde(default = "default_pubmed_path")]
    pub pubmed: String,
    #[serde(default = "default_health_topics_path")]
    pub health_topics: String,
    #[serde(default = "default_clinical_trials_path")]
    pub clinical_trials: String,
    #[serde(default = "default_icd_path")]
    pub icd: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    4000
}

fn default_base_url() -> String {
    "http://localhost:3002".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "healthcare-mcp/1.0".into()
}

fn default_health_path() -> String {
    "/health".into()
}

fn default_fda_path() -> String {
    "/api/fda".into()
}

fn default_pubmed_path() -> String {
    "/api/pubmed".into()
}

fn default_health_topics_path() -> String {
    "/api/health_finder".into()
}

fn default_clinical_trials_path() -> String {
    "/api/clinical_trials".into()
}

fn default_icd_path() -> String {
    "/api/medical_terminology".into()
}

fn default_status_interval_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            health_path: default_health_path(),
            paths: BackendPaths::default(),
        }
    }
}

impl Default for BackendPaths {
    fn default() -> Self {
        Self {
            fda: default_fda_path(),
            pubmed: default_pubmed_path(),
            health_topics: default_health_topics_path(),
            clinical_trials: default_clinical_trials_path(),
            icd: default_icd_path(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: default_status_interval_secs(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn websocket_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("ws://{}:{}/sse", self.host, self.port))
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EventsConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }
}

impl Config {
    /// Load configuration from a YAML file with environment variable
    /// substitution, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let mut config = Self::parse_yaml(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Like [`Config::load`], but starts from the built-in defaults when the
    /// file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        info!(
            "No configuration file at {}, using defaults",
            path.display()
        );
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse YAML text after placeholder expansion. Not yet validated.
    fn parse_yaml(content: &str) -> Result<Self> {
        // Expand environment variables in the format $(VAR_NAME)
        let expanded = expand_env_vars(content)?;

        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Apply MCP_HOST, MCP_PORT, BACKEND_URL and HTTP_TIMEOUT_SECONDS
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("MCP_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("MCP_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("MCP_PORT is not a valid port: {}", port)))?;
        }

        if let Ok(url) = std::env::var("BACKEND_URL") {
            self.backend.base_url = url;
        }

        if let Ok(timeout) = std::env::var("HTTP_TIMEOUT_SECONDS") {
            // Accept "30" as well as "30.0"
            let secs: f64 = timeout.parse().map_err(|_| {
                AppError::Config(format!(
                    "HTTP_TIMEOUT_SECONDS is not a number: {}",
                    timeout
                ))
            })?;
            if !secs.is_finite() || secs < 1.0 {
                return Err(AppError::Config(format!(
                    "HTTP_TIMEOUT_SECONDS must be at least 1: {}",
                    timeout
                )));
            }
            self.backend.timeout_secs = secs.round() as u64;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(AppError::Config("Server host cannot be empty".to_string()));
        }

        if self.server.port == 0 {
            return Err(AppError::Config("Server port cannot be 0".to_string()));
        }

        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            return Err(AppError::Config(
                "Backend base_url cannot be empty".to_string(),
            ));
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "Backend base_url must be an http(s) URL: {}",
                base_url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(AppError::Config(
                "Backend timeout_secs cannot be 0".to_string(),
            ));
        }

        if self.events.status_interval_secs == 0 {
            return Err(AppError::Config(
                "Events status_interval_secs cannot be 0".to_string(),
            ));
        }

        let paths = &self.backend.paths;
        for (name, path) in [
            ("health_path", &self.backend.health_path),
            ("paths.fda", &paths.fda),
            ("paths.pubmed", &paths.pubmed),
            ("paths.health_topics", &paths.health_topics),
            ("paths.clinical_trials", &paths.clinical_trials),
            ("paths.icd", &paths.icd),
        ] {
            if !path.starts_with('/') {
                return Err(AppError::Config(format!(
                    "Backend {} must start with '/': {}",
                    name, path
                )));
            }
        }

        Ok(())
    }
}

/// Expand environment variables in the format $(VAR_NAME)
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();

    // Find all $(VAR_NAME) patterns
    let re = regex::Regex::new(r"\$\(([A-Z_][A-Z0-9_]*)\)")
        .map_err(|e| AppError::Config(format!("Invalid placeholder pattern: {}", e)))?;

    for cap in re.captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    Ok(result)
}
