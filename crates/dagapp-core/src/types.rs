use serde::de::DeserializeOwned;

use crate::CoreError;

/// Values flowing through the graph
pub use serde_json::Value;

/// Name of the kind of a JSON value, used in type mismatch reports
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Arguments handed to a node's callable
///
/// Entries keep the declaration order of the node's parameters, so
/// callables may read them either by name or by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    /// Create an empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument (builder style)
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    /// Get an argument by name
    pub fn get(&self, name: &str) -> Result<&Value, CoreError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| CoreError::MissingArgument(name.to_string()))
    }

    /// Get an argument by position
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|(_, v)| v)
    }

    /// Get a numeric argument
    pub fn f64(&self, name: &str) -> Result<f64, CoreError> {
        let value = self.get(name)?;
        value.as_f64().ok_or_else(|| mismatch(name, "number", value))
    }

    /// Get an integer argument; floats with no fractional part are accepted
    pub fn i64(&self, name: &str) -> Result<i64, CoreError> {
        let value = self.get(name)?;
        if let Some(i) = value.as_i64() {
            return Ok(i);
        }
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 => Ok(f as i64),
            _ => Err(mismatch(name, "integer", value)),
        }
    }

    /// Get a boolean argument
    pub fn bool(&self, name: &str) -> Result<bool, CoreError> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", value))
    }

    /// Get a text argument
    pub fn str(&self, name: &str) -> Result<&str, CoreError> {
        let value = self.get(name)?;
        value.as_str().ok_or_else(|| mismatch(name, "text", value))
    }

    /// Get a list argument
    pub fn list(&self, name: &str) -> Result<&Vec<Value>, CoreError> {
        let value = self.get(name)?;
        value.as_array().ok_or_else(|| mismatch(name, "list", value))
    }

    /// Deserialize an argument into a concrete type
    pub fn get_as<T>(&self, name: &str) -> Result<T, CoreError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(self.get(name)?.clone())?)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

fn mismatch(name: &str, expected: &str, found: &Value) -> CoreError {
    CoreError::TypeMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        found: kind_name(found).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_args_lookup() {
        let args = Args::new()
            .with("clicks", json!(120))
            .with("cost_per_click", json!(0.2))
            .with("label", json!("north"));

        assert_eq!(args.len(), 3);
        assert_eq!(args.i64("clicks").unwrap(), 120);
        assert_eq!(args.f64("clicks").unwrap(), 120.0);
        assert_eq!(args.f64("cost_per_click").unwrap(), 0.2);
        assert_eq!(args.str("label").unwrap(), "north");
        assert_eq!(args.at(1), Some(&json!(0.2)));
    }

    #[test]
    fn test_args_integer_from_whole_float() {
        let args = Args::new().with("n", json!(4.0)).with("x", json!(4.5));
        assert_eq!(args.i64("n").unwrap(), 4);
        assert!(matches!(args.i64("x"), Err(CoreError::TypeMismatch { .. })));
    }

    #[test]
    fn test_args_missing_and_mismatch() {
        let args = Args::new().with("flag", json!(true));

        assert_eq!(
            args.get("nope").unwrap_err(),
            CoreError::MissingArgument("nope".to_string())
        );

        match args.f64("flag") {
            Err(CoreError::TypeMismatch { name, expected, found }) => {
                assert_eq!(name, "flag");
                assert_eq!(expected, "number");
                assert_eq!(found, "bool");
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_args_get_as() {
        let args = Args::new().with("counts", json!({"tp": 3, "fn": 1}));
        let counts: std::collections::HashMap<String, u32> = args.get_as("counts").unwrap();
        assert_eq!(counts["tp"], 3);
        assert_eq!(counts["fn"], 1);
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(kind_name(&json!(null)), "null");
        assert_eq!(kind_name(&json!([1, 2])), "list");
        assert_eq!(kind_name(&json!({"a": 1})), "dict");
    }
}
