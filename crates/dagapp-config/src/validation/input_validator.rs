use std::collections::HashSet;

use dagapp_core::types::kind_name;
use dagapp_core::InputKind;

use crate::inputs::{InputDefinition, InputsDocument};
use crate::validation::{error_codes, ValidationError, Validator};

/// Rejects inputs that share a name
pub struct UniqueNameValidator {}

impl UniqueNameValidator {
    /// Create a new unique name validator
    pub fn new() -> Self {
        UniqueNameValidator {}
    }
}

impl Validator for UniqueNameValidator {
    fn validate(&self, document: &InputsDocument) -> Vec<ValidationError> {
        let mut seen = HashSet::with_capacity(document.inputs.len());
        let mut errors = Vec::new();

        for (i, input) in document.inputs.iter().enumerate() {
            if input.name.trim().is_empty() {
                errors.push(ValidationError {
                    code: error_codes::MISSING_REQUIRED_FIELD,
                    message: "Input name must not be empty".to_string(),
                    path: Some(format!("inputs[{}].name", i)),
                });
            } else if !seen.insert(input.name.as_str()) {
                errors.push(ValidationError {
                    code: error_codes::DUPLICATE_NAME,
                    message: format!("Duplicate input name: '{}'", input.name),
                    path: Some(format!("inputs[{}]", i)),
                });
            }
        }

        errors
    }
}

/// Checks each input's kind, range and default
pub struct InputValidator {}

impl InputValidator {
    /// Create a new input validator
    pub fn new() -> Self {
        InputValidator {}
    }

    fn validate_input(&self, input: &InputDefinition, path: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if input.arg_type == InputKind::Slider && input.range.is_none() {
            errors.push(ValidationError {
                code: error_codes::MISSING_RANGE,
                message: format!("Slider input '{}' needs a range", input.name),
                path: Some(path.to_string()),
            });
        }

        if let Some([min, max]) = input.range {
            if min > max {
                errors.push(ValidationError {
                    code: error_codes::INVALID_RANGE,
                    message: format!("Range [{}, {}] of input '{}' is empty", min, max, input.name),
                    path: Some(format!("{}.range", path)),
                });
            }
        }

        if let Some(default) = &input.default {
            if !input.arg_type.accepts(default) {
                errors.push(ValidationError {
                    code: error_codes::INVALID_DEFAULT,
                    message: format!(
                        "Default of input '{}' should be {}, found {}",
                        input.name,
                        input.arg_type.expected(),
                        kind_name(default)
                    ),
                    path: Some(format!("{}.default", path)),
                });
            } else if let Some([min, max]) = input.range {
                let numbers = input.arg_type.bounded_numbers(default);
                if let Some(bad) = numbers.into_iter().find(|n| *n < min || *n > max) {
                    errors.push(ValidationError {
                        code: error_codes::DEFAULT_OUT_OF_RANGE,
                        message: format!(
                            "Default {} of input '{}' is outside [{}, {}]",
                            bad, input.name, min, max
                        ),
                        path: Some(format!("{}.default", path)),
                    });
                }
            }
        }

        errors
    }
}

impl Validator for InputValidator {
    fn validate(&self, document: &InputsDocument) -> Vec<ValidationError> {
        document
            .inputs
            .iter()
            .enumerate()
            .flat_map(|(i, input)| self.validate_input(input, &format!("inputs[{}]", i)))
            .collect()
    }
}
