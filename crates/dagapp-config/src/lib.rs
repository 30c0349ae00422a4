//! # Dagapp Config
//!
//! Root inputs are declared in a small YAML (or JSON) document: one entry
//! per input with its widget kind, default and optional range. This crate
//! parses and validates that document and turns it into the engine's
//! [`RootInputSpec`] list.
//!
//! ## Example
//!
//! ```
//! use dagapp_config::parse_and_validate_inputs;
//!
//! let yaml = r#"
//! config_version: "1.0"
//! inputs:
//!   - name: max_partners
//!     arg_type: slider
//!     default: 1000
//!     range: [0, 2000]
//!   - name: cost_per_click
//!     default: 0.2
//! "#;
//!
//! let document = parse_and_validate_inputs(yaml).unwrap();
//! assert_eq!(document.input_specs().len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod infer;
mod inputs;
mod parser;

pub mod validation;

use std::path::Path;

pub use dagapp_core::RootInputSpec;
pub use error::ConfigError;
pub use infer::infer_inputs;
pub use inputs::{InputDefinition, InputsDocument};
pub use parser::{parse_inputs_document, parse_inputs_json, CONFIG_VERSION};
pub use validation::{check_coverage, required_roots, ValidationError};

/// Parse and validate a YAML inputs document.
///
/// # Errors
///
/// * Invalid YAML syntax
/// * Unsupported config version
/// * Validation errors (duplicate names, sliders without a range, defaults
///   of the wrong kind or outside their range)
pub fn parse_and_validate_inputs(yaml_str: &str) -> Result<InputsDocument, ConfigError> {
    let document = parser::parse_inputs_document(yaml_str)?;
    validation::validate_document(&document)?;
    Ok(document)
}

/// Parse and validate a JSON inputs document.
pub fn parse_and_validate_inputs_json(json_str: &str) -> Result<InputsDocument, ConfigError> {
    let document = parser::parse_inputs_json(json_str)?;
    validation::validate_document(&document)?;
    Ok(document)
}

/// Read, parse and validate an inputs document from disk
///
/// Files ending in `.json` are read as JSON, anything else as YAML.
pub fn load_inputs_file(path: impl AsRef<Path>) -> Result<InputsDocument, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_and_validate_inputs_json(&contents),
        _ => parse_and_validate_inputs(&contents),
    }
}

/// Returns a version string for the dagapp config crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
