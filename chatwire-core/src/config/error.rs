//! Configuration error types

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Source format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        })
    }
}

/// Line and column of a parse failure, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Failure to load a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {format} in '{path}'{}: {message}", fmt_location(.location))]
    ParseError {
        path: String,
        format: ConfigFormat,
        location: Option<Location>,
        message: String,
    },

    #[error(transparent)]
    ValidationError(#[from] ValidationError),

    #[error("environment variable '{var}' is not set")]
    EnvVarNotFound { var: String },
}

fn fmt_location(location: &Option<Location>) -> String {
    location
        .map(|l| format!(" at {}:{}", l.line, l.column))
        .unwrap_or_default()
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn parse(
        path: &Path,
        format: ConfigFormat,
        location: Option<Location>,
        message: impl Into<String>,
    ) -> Self {
        Self::ParseError {
            path: path.display().to_string(),
            format,
            location,
            message: message.into(),
        }
    }
}

/// A config value that failed validation, with the path of the field
#[derive(Debug, Error)]
pub struct ValidationError {
    /// Path to the offending field, such as `models[0].id`
    pub field_path: String,
    pub kind: ValidationErrorKind,
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

/// What was wrong with a validated field
#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("required field is missing")]
    RequiredFieldMissing,

    #[error("value out of range: {message}")]
    OutOfRange { message: String },

    #[error("duplicate value: {value}")]
    DuplicateValue { value: String },

    #[error("incompatible configuration: {message}")]
    Incompatible { message: String },

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("unsupported version {actual} (expected {expected})")]
    InvalidVersion { expected: String, actual: String },

    #[error("unresolved placeholder {placeholder}")]
    UnresolvedPlaceholder { placeholder: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
