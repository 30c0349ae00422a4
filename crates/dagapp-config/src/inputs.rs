use dagapp_core::{InputKind, RootInputSpec, Value};
use serde::{Deserialize, Serialize};

/// Top-level inputs document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputsDocument {
    /// Document format version, currently "1.0"
    pub config_version: String,

    /// Root input declarations
    #[serde(default)]
    pub inputs: Vec<InputDefinition>,
}

/// One root input as written in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDefinition {
    /// Input name, matched against node parameter names
    pub name: String,

    /// Widget kind: num, slider, text, bool, list, dict or double_slider
    #[serde(default)]
    pub arg_type: InputKind,

    /// Default value; falls back per kind when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Inclusive `[min, max]` bound pair, required for sliders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,

    /// Text shown next to the widget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl InputDefinition {
    /// The default value, or the kind's fallback
    pub fn effective_default(&self) -> Value {
        self.default.clone().unwrap_or_else(|| self.arg_type.default_value())
    }

    /// Convert to the engine's root input declaration
    pub fn to_spec(&self) -> RootInputSpec {
        let mut spec = RootInputSpec::new(self.name.clone(), self.effective_default())
            .with_kind(self.arg_type);
        if let Some([min, max]) = self.range {
            spec = spec.with_range(min, max);
        }
        if let Some(description) = &self.description {
            spec = spec.with_description(description.clone());
        }
        spec
    }
}

impl InputsDocument {
    /// Root input declarations for the engine, in document order
    pub fn input_specs(&self) -> Vec<RootInputSpec> {
        self.inputs.iter().map(InputDefinition::to_spec).collect()
    }

    /// Render the document as YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl From<&RootInputSpec> for InputDefinition {
    fn from(spec: &RootInputSpec) -> Self {
        Self {
            name: spec.name.clone(),
            arg_type: spec.kind,
            default: Some(spec.default.clone()),
            range: spec.range.map(|(min, max)| [min, max]),
            description: spec.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_to_spec_with_fallback_default() {
        let definition = InputDefinition {
            name: "vax_rate".to_string(),
            arg_type: InputKind::Slider,
            default: None,
            range: Some([0.0, 1.0]),
            description: Some("Share of the population vaccinated".to_string()),
        };

        let spec = definition.to_spec();
        assert_eq!(spec.default, json!(0.0));
        assert_eq!(spec.kind, InputKind::Slider);
        assert_eq!(spec.range, Some((0.0, 1.0)));
        assert_eq!(spec.description.as_deref(), Some("Share of the population vaccinated"));
    }

    #[test]
    fn test_from_spec() {
        let spec = RootInputSpec::new("xs", json!([1, 2]));
        let definition = InputDefinition::from(&spec);

        assert_eq!(definition.arg_type, InputKind::List);
        assert_eq!(definition.default, Some(json!([1, 2])));
        assert_eq!(definition.range, None);
    }
}
