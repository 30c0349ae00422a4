use std::collections::HashSet;

use dagapp_core::Declarations;

use crate::error::ConfigError;
use crate::infer::free_parameters;
use crate::inputs::InputsDocument;
use crate::validation::{error_codes, ValidationError};

/// Root inputs the declarations cannot run without
///
/// A free parameter with a default can fall back to it, so only
/// parameters without one (and vector group sources) are required.
pub fn required_roots(declarations: &Declarations) -> Vec<String> {
    let sources: HashSet<&str> = declarations
        .vector_groups
        .iter()
        .flat_map(|g| g.sources().map(|(source, _)| source))
        .collect();
    free_parameters(declarations)
        .into_iter()
        .filter(|(name, default)| default.is_none() || sources.contains(name.as_str()))
        .map(|(name, _)| name)
        .collect()
}

/// Check that a document declares every root input the declarations need
pub fn check_coverage(
    document: &InputsDocument,
    declarations: &Declarations,
) -> Result<(), ConfigError> {
    let declared: HashSet<&str> = document.inputs.iter().map(|i| i.name.as_str()).collect();

    let errors: Vec<ValidationError> = required_roots(declarations)
        .into_iter()
        .filter(|name| !declared.contains(name.as_str()))
        .map(|name| ValidationError {
            code: error_codes::MISSING_INPUT,
            message: format!("You need to define an argument type for root input '{}'", name),
            path: Some("inputs".to_string()),
        })
        .collect();

    if !errors.is_empty() {
        return Err(ConfigError::from_validation_errors(errors));
    }
    Ok(())
}
