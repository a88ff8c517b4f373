//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use crate::protocol::ThinkingSupport;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Supported configuration schema version
pub const CONFIG_VERSION: &str = "0.1";

/// Base URL of the chat completion API
pub const DEFAULT_BASE_URL: &str = "https://api.minimax.io/v1";

/// Root configuration structure for chatwire
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatwireConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Base URL of the chat completion API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (supports environment variable interpolation); the host key
    /// store is consulted when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Request defaults
    #[serde(default)]
    pub defaults: DefaultConfig,

    /// How the host displays reasoning
    #[serde(default)]
    pub thinking: ThinkingSupport,

    /// Models offered to the host
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
}

impl Default for ChatwireConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            base_url: default_base_url(),
            api_key: None,
            connection: ConnectionConfig::default(),
            defaults: DefaultConfig::default(),
            thinking: ThinkingSupport::default(),
            models: default_models(),
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model identifier sent upstream (e.g., "MiniMax-M2")
    pub id: String,

    /// Display name; defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Model family reported to the host
    #[serde(default = "default_family")]
    pub family: String,

    /// Maximum context tokens
    pub max_input_tokens: u32,

    /// Maximum output tokens
    pub max_output_tokens: u32,

    /// Whether this model supports tool calling
    #[serde(default = "default_true")]
    pub tool_calling: bool,
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,

    /// User agent override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            max_idle_per_host: default_max_idle(),
            user_agent: None,
        }
    }
}

/// Default request parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultConfig {
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token limit when neither the host nor the model sets one
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Ask the upstream to stream reasoning separately
    #[serde(default = "default_true")]
    pub reasoning_split: bool,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            reasoning_split: true,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool { true }
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_family() -> String { "minimax".to_string() }
fn default_temperature() -> f32 { 1.0 }
fn default_max_tokens() -> u32 { 8192 }
fn default_connect_timeout() -> u64 { 10000 }
fn default_max_idle() -> usize { 10 }

fn default_models() -> Vec<ModelConfig> {
    vec![ModelConfig {
        id: "MiniMax-M2".to_string(),
        name: Some("MiniMax M2".to_string()),
        family: default_family(),
        max_input_tokens: 204_800,
        max_output_tokens: 8192,
        tool_calling: true,
    }]
}

impl ChatwireConfig {
    /// Look up a configured model by id
    pub fn model(&self, id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|model| model.id == id)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        // Currently support only version 0.1
        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        if self.base_url.is_empty() {
            return Err(ValidationError::required("base_url"));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::new(
                        "base_url",
                        ValidationErrorKind::InvalidUrl {
                            message: format!("URL scheme must be http or https, got: {}", url.scheme()),
                        },
                    ));
                }
            }
            Err(e) => {
                return Err(ValidationError::new(
                    "base_url",
                    ValidationErrorKind::InvalidUrl {
                        message: e.to_string(),
                    },
                ));
            }
        }

        self.defaults.validate("defaults")?;

        if self.models.is_empty() {
            return Err(ValidationError::required("models")
                .with_context("At least one model must be configured"));
        }

        let mut seen_ids = HashSet::new();
        for (i, model) in self.models.iter().enumerate() {
            let model_path = format!("models[{}]", i);
            if !seen_ids.insert(&model.id) {
                return Err(ValidationError::new(
                    format!("{}.id", model_path),
                    ValidationErrorKind::DuplicateValue {
                        value: model.id.clone(),
                    },
                ));
            }
            model.validate(&model_path)?;
        }

        Ok(())
    }
}

impl DefaultConfig {
    /// Validate request defaults
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                format!("{}.temperature", path),
                "Must be between 0.0 and 2.0",
            ));
        }

        if self.max_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_tokens", path),
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl ModelConfig {
    /// Display name, falling back to the id when unset or blank
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.id)
    }

    /// Validate model configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.id", path)));
        }

        if self.max_input_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_input_tokens", path),
                "Must be greater than 0",
            ));
        }

        if self.max_output_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_output_tokens", path),
                "Must be greater than 0",
            ));
        }

        if self.max_output_tokens > self.max_input_tokens {
            return Err(ValidationError::new(
                format!("{}.max_output_tokens", path),
                ValidationErrorKind::Incompatible {
                    message: "Cannot exceed max_input_tokens".to_string(),
                },
            ));
        }

        Ok(())
    }
}
