use thiserror::Error;
use crate::validation::ValidationError;
use std::fmt;

/// All possible errors that can occur while loading an inputs document
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document could not be read
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Errors that occur during YAML parsing
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Errors that occur during JSON processing
    #[error("JSON processing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A single validation error
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// Multiple validation errors
    #[error("{}", MultipleErrorsFormat(.0))]
    MultipleValidationErrors(Vec<ValidationError>),

    /// Unsupported config version
    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

// Helper struct to format multiple errors
struct MultipleErrorsFormat<'a>(&'a [ValidationError]);

impl fmt::Display for MultipleErrorsFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multiple validation errors ({} issues):", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, err)?;
        }
        Ok(())
    }
}

impl ConfigError {
    /// Create a ConfigError from one or more validation errors
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        let mut errors = errors;
        match errors.len() {
            0 => ConfigError::InternalError(
                "Called from_validation_errors with empty vector".to_string(),
            ),
            1 => match errors.pop() {
                Some(err) => ConfigError::ValidationError(err),
                None => ConfigError::InternalError("Validation error vanished".to_string()),
            },
            _ => ConfigError::MultipleValidationErrors(errors),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::IoError(_) => "ERR_CONFIG_IO",
            ConfigError::YamlError(_) => "ERR_CONFIG_YAML_PARSE",
            ConfigError::JsonError(_) => "ERR_CONFIG_JSON_PARSE",
            ConfigError::ValidationError(err) => err.code,
            ConfigError::MultipleValidationErrors(_) => "ERR_CONFIG_VALIDATION_MULTIPLE",
            ConfigError::UnsupportedVersion(_) => "ERR_CONFIG_UNSUPPORTED_VERSION",
            ConfigError::InternalError(_) => "ERR_CONFIG_INTERNAL",
        }
    }

    /// Validation errors carried by this error, if any
    pub fn validation_errors(&self) -> Vec<&ValidationError> {
        match self {
            ConfigError::ValidationError(err) => vec![err],
            ConfigError::MultipleValidationErrors(errors) => errors.iter().collect(),
            _ => Vec::new(),
        }
    }
}
