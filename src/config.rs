use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ResearchError, Result};

/// Environment variable holding the Gemini credential.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Optional path to a TOML file layered underneath the environment.
pub const CONFIG_PATH_VAR: &str = "RESEARCH_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// When false, failed requests report a generic detail instead of the error text.
    #[serde(default = "default_expose_error_details")]
    pub expose_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            expose_error_details: default_expose_error_details(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

fn default_expose_error_details() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-call timeout for provider requests. Zero disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            endpoint: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".into()
}

fn default_model() -> String {
    "gemini-1.5-pro".into()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

fn default_max_steps() -> usize {
    15
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Fallback filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "research_assistant=info,tower_http=info".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&raw)
            .map_err(|err| ResearchError::Config(format!("Failed to parse configuration: {err}")))?;
        Ok(cfg)
    }

    /// Loads the process configuration. Fails if no API key is available.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the file named by `RESEARCH_CONFIG` (if any) and layers the
    /// values from `lookup` on top.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup(CONFIG_PATH_VAR) {
            Some(path) if !path.trim().is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };
        base.with_overrides(lookup)
    }

    /// Applies overrides from `lookup` and validates the result.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_VAR) {
            self.model.api_key = Some(key);
        }
        if let Some(host) = lookup("RESEARCH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("RESEARCH_PORT") {
            self.server.port = parse_var("RESEARCH_PORT", &port)?;
        }
        if let Some(expose) = lookup("RESEARCH_EXPOSE_ERRORS") {
            self.server.expose_error_details = parse_var("RESEARCH_EXPOSE_ERRORS", &expose)?;
        }
        if let Some(model) = lookup("RESEARCH_MODEL") {
            self.model.model = model;
        }
        if let Some(endpoint) = lookup("RESEARCH_GEMINI_ENDPOINT") {
            self.model.endpoint = Some(endpoint);
        }
        if let Some(temperature) = lookup("RESEARCH_TEMPERATURE") {
            self.model.temperature = parse_var("RESEARCH_TEMPERATURE", &temperature)?;
        }
        if let Some(timeout) = lookup("RESEARCH_TIMEOUT_SECS") {
            self.model.timeout_secs = parse_var("RESEARCH_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(steps) = lookup("RESEARCH_MAX_STEPS") {
            self.agent.max_steps = parse_var("RESEARCH_MAX_STEPS", &steps)?;
        }
        if let Some(format) = lookup("RESEARCH_LOG_FORMAT") {
            self.telemetry.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" => LogFormat::Text,
                other => {
                    return Err(ResearchError::Config(format!(
                        "RESEARCH_LOG_FORMAT must be `text` or `json`, got `{other}`"
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let has_key = self
            .model
            .api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false);
        if !has_key {
            return Err(ResearchError::Config(format!(
                "{API_KEY_VAR} environment variable is not set"
            )));
        }
        if self.model.provider != "gemini" {
            return Err(ResearchError::Config(format!(
                "unsupported model provider `{}`",
                self.model.provider
            )));
        }
        if self.agent.max_steps == 0 {
            return Err(ResearchError::Config("agent.max_steps must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ResearchError::Config(format!("{name} has an invalid value `{raw}`")))
}
