//! Configuration module for chatwire
//!
//! Endpoint, request defaults and the model list, loaded from YAML or JSON
//! with `${VAR}` environment interpolation and validated before use.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use error::{
    ConfigError, ConfigFormat, ConfigResult, Location, ValidationError, ValidationErrorKind,
};
pub use schema::{
    ChatwireConfig, ConnectionConfig, DefaultConfig, ModelConfig, CONFIG_VERSION,
    DEFAULT_BASE_URL,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ChatwireConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: ChatwireConfig = serde_yaml::from_str(&interpolated).map_err(|e| {
        let location = e.location().map(|l| Location {
            line: l.line(),
            column: l.column(),
        });
        ConfigError::parse(path, ConfigFormat::Yaml, location, e.to_string())
    })?;

    finish_loading(path, config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ChatwireConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: ChatwireConfig = serde_json::from_str(&interpolated).map_err(|e| {
        let location = Location {
            line: e.line(),
            column: e.column(),
        };
        ConfigError::parse(path, ConfigFormat::Json, Some(location), e.to_string())
    })?;

    finish_loading(path, config)
}

/// Load a configuration, picking the format from the file extension
pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ChatwireConfig> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_from_json(path),
        _ => load_from_yaml(path),
    }
}

fn read_interpolated(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

    // Interpolate environment variables before parsing
    env::interpolate_env_vars(&content)
}

fn finish_loading(path: &Path, config: ChatwireConfig) -> ConfigResult<ChatwireConfig> {
    ConfigValidator::new().validate(&config)?;
    debug!(
        "Loaded config from {}: base_url={} models={}",
        path.display(),
        config.base_url,
        config.models.len()
    );
    Ok(config)
}
