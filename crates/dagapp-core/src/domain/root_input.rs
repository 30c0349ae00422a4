use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{kind_name, Value};
use crate::CoreError;

/// Kind of a root input, as rendered by the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Free numeric input
    #[default]
    Num,
    /// Numeric input constrained by a range
    Slider,
    /// Text input
    Text,
    /// Boolean toggle
    Bool,
    /// Sequence of values
    List,
    /// Mapping of named values
    Dict,
    /// A `[start, stop]` range plus a count, read by nodes as the evenly
    /// spaced sequence it spans
    DoubleSlider,
}

impl InputKind {
    /// Whether a value is acceptable for this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            InputKind::Num | InputKind::Slider => value.is_number(),
            InputKind::Text => value.is_string(),
            InputKind::Bool => value.is_boolean(),
            InputKind::List => value.is_array(),
            InputKind::Dict => value.is_object(),
            InputKind::DoubleSlider => DoubleSliderSetting::from_value(value).is_some(),
        }
    }

    /// Fallback default when a declaration does not provide one
    pub fn default_value(&self) -> Value {
        match self {
            InputKind::Num | InputKind::Slider => json!(0.0),
            InputKind::Text => json!(""),
            InputKind::Bool => json!(false),
            InputKind::List => json!([]),
            InputKind::Dict => json!({}),
            InputKind::DoubleSlider => json!({"range": [10.0, 90.0], "num": 5}),
        }
    }

    /// Infer the kind from a default value
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => InputKind::Bool,
            Value::String(_) => InputKind::Text,
            Value::Array(_) => InputKind::List,
            Value::Object(_) => InputKind::Dict,
            Value::Null | Value::Number(_) => InputKind::Num,
        }
    }

    /// Human readable name of the expected value kind
    pub fn expected(&self) -> &'static str {
        match self {
            InputKind::Num | InputKind::Slider => "number",
            InputKind::Text => "text",
            InputKind::Bool => "bool",
            InputKind::List => "list",
            InputKind::Dict => "dict",
            InputKind::DoubleSlider => "double slider setting",
        }
    }

    /// Numbers a range constraint applies to
    ///
    /// List elements are checked one by one; a double slider is checked on
    /// its two endpoints.
    pub fn bounded_numbers(&self, value: &Value) -> Vec<f64> {
        match (self, value) {
            (InputKind::DoubleSlider, _) => DoubleSliderSetting::from_value(value)
                .map(|setting| vec![setting.range.0, setting.range.1])
                .unwrap_or_default(),
            (_, Value::Array(items)) => items.iter().filter_map(Value::as_f64).collect(),
            (_, other) => other.as_f64().into_iter().collect(),
        }
    }

    /// Value nodes read for a setting of this kind
    pub fn expand(&self, setting: &Value) -> Value {
        match self {
            InputKind::DoubleSlider => match DoubleSliderSetting::from_value(setting) {
                Some(setting) => {
                    Value::Array(setting.expand().into_iter().map(|x| json!(x)).collect())
                }
                None => setting.clone(),
            },
            _ => setting.clone(),
        }
    }
}

/// Widget state of a double slider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DoubleSliderSetting {
    /// Selected `[start, stop]` interval
    pub range: (f64, f64),

    /// Number of evenly spaced points, at least one
    pub num: usize,
}

impl DoubleSliderSetting {
    /// Parse a setting, rejecting a zero count
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value::<Self>(value.clone())
            .ok()
            .filter(|setting| setting.num >= 1)
    }

    /// `num` evenly spaced points from start to stop, both included
    pub fn expand(&self) -> Vec<f64> {
        let (start, stop) = self.range;
        if self.num == 1 {
            return vec![start];
        }
        let step = (stop - start) / (self.num - 1) as f64;
        (0..self.num)
            .map(|i| if i + 1 == self.num { stop } else { start + step * i as f64 })
            .collect()
    }
}

/// Declaration of a root input, as supplied by the configuration collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootInputSpec {
    /// Name matched against parameter names
    pub name: String,

    /// Default value
    pub default: Value,

    /// Kind of the input
    #[serde(default)]
    pub kind: InputKind,

    /// Optional inclusive numeric bound pair
    #[serde(default)]
    pub range: Option<(f64, f64)>,

    /// Optional description shown next to the widget
    #[serde(default)]
    pub description: Option<String>,
}

impl RootInputSpec {
    /// Create a spec whose kind is inferred from the default value
    pub fn new(name: impl Into<String>, default: Value) -> Self {
        let kind = InputKind::infer(&default);
        Self {
            name: name.into(),
            default,
            kind,
            range: None,
            description: None,
        }
    }

    /// Override the kind
    pub fn with_kind(mut self, kind: InputKind) -> Self {
        self.kind = kind;
        self
    }

    /// Constrain the input to `[min, max]`
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named, externally supplied leaf value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootInput {
    /// Input name
    pub name: String,

    /// Current value, as nodes read it
    pub value: Value,

    /// Current widget state; differs from `value` only for double sliders
    pub setting: Value,

    /// Declared default value
    pub default: Value,

    /// Kind constraint
    pub kind: InputKind,

    /// Inclusive range constraint
    pub range: Option<(f64, f64)>,

    /// Description
    pub description: Option<String>,
}

impl RootInput {
    /// Build a root input from its declaration, validating the default
    pub fn from_spec(spec: &RootInputSpec) -> Result<Self, CoreError> {
        if let Some((min, max)) = spec.range {
            if min > max {
                return Err(CoreError::InvalidDeclaration(format!(
                    "Root input '{}' has an empty range [{}, {}]",
                    spec.name, min, max
                )));
            }
        }

        let input = Self {
            name: spec.name.clone(),
            value: spec.kind.expand(&spec.default),
            setting: spec.default.clone(),
            default: spec.default.clone(),
            kind: spec.kind,
            range: spec.range,
            description: spec.description.clone(),
        };
        input.validate(&spec.default)?;
        Ok(input)
    }

    /// Check a candidate setting against the kind and range constraints
    ///
    /// For list inputs the range applies to every numeric element, for
    /// double sliders to both endpoints.
    pub fn validate(&self, value: &Value) -> Result<(), CoreError> {
        if !self.kind.accepts(value) {
            return Err(CoreError::TypeMismatch {
                name: self.name.clone(),
                expected: self.kind.expected().to_string(),
                found: kind_name(value).to_string(),
            });
        }

        if let Some((min, max)) = self.range {
            let numbers = self.kind.bounded_numbers(value);
            if let Some(bad) = numbers.into_iter().find(|n| *n < min || *n > max) {
                return Err(CoreError::RangeViolation {
                    name: self.name.clone(),
                    value: bad,
                    min,
                    max,
                });
            }
        }

        Ok(())
    }

    /// Replace the current setting, returning the previous one
    pub(crate) fn replace_value(&mut self, setting: Value) -> Value {
        self.value = self.kind.expand(&setting);
        std::mem::replace(&mut self.setting, setting)
    }
}
