use tracing::debug;

use crate::error::ConfigError;
use crate::inputs::InputsDocument;

/// Supported document version
pub const CONFIG_VERSION: &str = "1.0";

/// Parse a YAML string into an InputsDocument.
///
/// Only the syntax and the version are checked here; the validation
/// module checks the declarations themselves.
pub fn parse_inputs_document(yaml_str: &str) -> Result<InputsDocument, ConfigError> {
    let document: InputsDocument = serde_yaml::from_str(yaml_str)?;
    check_version(document)
}

/// Parse a JSON string into an InputsDocument.
pub fn parse_inputs_json(json_str: &str) -> Result<InputsDocument, ConfigError> {
    let document: InputsDocument = serde_json::from_str(json_str)?;
    check_version(document)
}

fn check_version(document: InputsDocument) -> Result<InputsDocument, ConfigError> {
    if document.config_version != CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(document.config_version));
    }
    debug!(inputs = document.inputs.len(), "Parsed inputs document");
    Ok(document)
}
