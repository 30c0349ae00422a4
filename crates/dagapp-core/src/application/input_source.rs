use std::collections::{BTreeMap, HashMap};

use crate::types::Value;

/// Front-end capability that reports the current value of each root input
///
/// Widgets, form posts and config reloads all look the same to the engine:
/// something that can be asked for a value by name.
pub trait InputSource {
    /// Current value of the named input, or `None` when the source has no opinion
    fn current_value(&self, name: &str) -> Option<Value>;
}

impl InputSource for HashMap<String, Value> {
    fn current_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl InputSource for BTreeMap<String, Value> {
    fn current_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl InputSource for serde_json::Map<String, Value> {
    fn current_value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}
