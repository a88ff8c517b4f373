//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::ChatwireConfig;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Any `${...}` left after interpolation, including names the
/// interpolator does not accept
static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").expect("placeholder pattern is valid"));

/// Configuration validator with rules beyond the schema checks
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &ChatwireConfig) -> Result<(), ValidationError> {
        // First run the built-in validation
        config.validate()?;

        self.validate_placeholders(config)?;
        self.validate_models(config);

        Ok(())
    }

    /// Reject placeholders that survived interpolation
    fn validate_placeholders(&self, config: &ChatwireConfig) -> Result<(), ValidationError> {
        let fields = [
            ("base_url", Some(config.base_url.as_str())),
            ("api_key", config.api_key.as_ref().map(|key| key.expose_secret())),
            ("connection.user_agent", config.connection.user_agent.as_deref()),
        ];

        for (path, value) in fields {
            if let Some(found) = value.and_then(|v| PLACEHOLDER_PATTERN.find(v)) {
                return Err(ValidationError::new(
                    path,
                    ValidationErrorKind::UnresolvedPlaceholder {
                        placeholder: found.as_str().to_string(),
                    },
                )
                .with_context("Environment variable names must be upper-case"));
            }
        }

        Ok(())
    }

    /// Warn about settings that are legal but probably unintended
    fn validate_models(&self, config: &ChatwireConfig) {
        for model in &config.models {
            if !model.tool_calling {
                warn!("Model {} has tool calling disabled; tools will not be offered", model.id);
            }
            if model.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
                warn!("Model {} has a blank display name; the id will be shown", model.id);
            }
        }
    }
}
