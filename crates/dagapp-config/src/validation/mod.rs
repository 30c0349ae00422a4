use std::error::Error;
use std::fmt;

use crate::error::ConfigError;
use crate::inputs::InputsDocument;

mod coverage;
mod input_validator;

pub use coverage::{check_coverage, required_roots};

/// Represents a validation error found in an inputs document
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error code (should be a constant identifier)
    pub code: &'static str,

    /// Human-readable error message
    pub message: String,

    /// Optional path to the location of the error (e.g., "inputs[2].range")
    pub path: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl Error for ValidationError {}

/// Validation error codes
pub mod error_codes {
    /// Two inputs share a name
    pub const DUPLICATE_NAME: &str = "ERR_CONFIG_VALIDATION_DUPLICATE_NAME";

    /// A slider without a range
    pub const MISSING_RANGE: &str = "ERR_CONFIG_VALIDATION_MISSING_RANGE";

    /// Range lower bound above its upper bound
    pub const INVALID_RANGE: &str = "ERR_CONFIG_VALIDATION_INVALID_RANGE";

    /// Default value of the wrong kind
    pub const INVALID_DEFAULT: &str = "ERR_CONFIG_VALIDATION_INVALID_DEFAULT";

    /// Default value outside the range
    pub const DEFAULT_OUT_OF_RANGE: &str = "ERR_CONFIG_VALIDATION_DEFAULT_OUT_OF_RANGE";

    /// Empty input name
    pub const MISSING_REQUIRED_FIELD: &str = "ERR_CONFIG_VALIDATION_MISSING_REQUIRED_FIELD";

    /// A root input the declarations need is not declared
    pub const MISSING_INPUT: &str = "ERR_CONFIG_VALIDATION_MISSING_INPUT";
}

/// A trait for validators that check specific aspects of an inputs document
pub trait Validator {
    /// Validate the document and return a list of validation errors (if any)
    fn validate(&self, document: &InputsDocument) -> Vec<ValidationError>;
}

/// Validate a parsed inputs document
pub fn validate_document(document: &InputsDocument) -> Result<(), ConfigError> {
    let validators: Vec<Box<dyn Validator>> = vec![
        Box::new(input_validator::UniqueNameValidator::new()),
        Box::new(input_validator::InputValidator::new()),
    ];

    let mut errors = Vec::new();
    for validator in validators {
        errors.extend(validator.validate(document));
    }

    if !errors.is_empty() {
        return Err(ConfigError::from_validation_errors(errors));
    }

    Ok(())
}
