//! Settings and driver for the `dagapp-demo` binary

use std::collections::BTreeMap;
use std::path::PathBuf;

use dagapp_config::load_inputs_file;
use dagapp_core::{GraphContext, Value};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{CatalogError, Calculator};

/// What the demo builds and which updates it applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Calculator to build
    #[serde(default = "default_calculator")]
    pub calculator: Calculator,

    /// Inputs document replacing the bundled one
    #[serde(default)]
    pub inputs_file: Option<PathBuf>,

    /// Nodes to pin after the graph is built
    #[serde(default)]
    pub pinned: Vec<String>,

    /// Root input updates, applied in order
    #[serde(default)]
    pub updates: Vec<(String, Value)>,
}

fn default_calculator() -> Calculator {
    Calculator::Marketing
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            calculator: default_calculator(),
            inputs_file: None,
            pinned: Vec::new(),
            updates: Vec::new(),
        }
    }
}

impl DemoConfig {
    /// Load settings from `DAGAPP_CALCULATOR`, `DAGAPP_INPUTS_FILE`,
    /// `DAGAPP_STATIC` (comma separated) and `DAGAPP_UPDATES`
    /// (`;` separated `name=value` pairs)
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DemoConfig::load`] with a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("DAGAPP_CALCULATOR") {
            match name.parse() {
                Ok(calculator) => config.calculator = calculator,
                Err(_) => warn!("Invalid DAGAPP_CALCULATOR value: {}", name),
            }
        }

        if let Some(path) = lookup("DAGAPP_INPUTS_FILE") {
            config.inputs_file = Some(PathBuf::from(path));
        }

        if let Some(pinned) = lookup("DAGAPP_STATIC") {
            config.pinned = pinned
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(updates) = lookup("DAGAPP_UPDATES") {
            for update in updates.split(';').map(str::trim).filter(|u| !u.is_empty()) {
                match parse_update(update) {
                    Ok(update) => config.updates.push(update),
                    Err(err) => warn!("Skipping DAGAPP_UPDATES entry: {}", err),
                }
            }
        }

        config
    }

    /// Apply command line arguments: an optional calculator name followed
    /// by `name=value` updates
    pub fn with_args<I>(mut self, args: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = String>,
    {
        for (position, arg) in args.into_iter().enumerate() {
            if position == 0 && !arg.contains('=') {
                self.calculator = arg.parse()?;
            } else {
                self.updates.push(parse_update(&arg)?);
            }
        }
        Ok(self)
    }
}

/// Parse `name=value`; the value is read as JSON, falling back to text
pub fn parse_update(update: &str) -> Result<(String, Value), CatalogError> {
    let (name, raw) = update
        .split_once('=')
        .ok_or_else(|| CatalogError::InvalidUpdate(update.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::InvalidUpdate(update.to_string()));
    }
    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

/// Leaf values at one point of the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// What changed before the values were read
    pub label: String,
    /// Leaf name to value
    pub values: BTreeMap<String, Value>,
}

/// Result of a demo run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoReport {
    /// Page title of the calculator
    pub title: Option<String>,
    /// Nodes pinned at startup, including the ones pinned along with them
    pub pinned: Vec<String>,
    /// Leaf values before and after each update
    pub snapshots: Vec<Snapshot>,
}

/// Build the configured calculator, then apply every update in turn
pub fn run(config: &DemoConfig) -> Result<DemoReport, CatalogError> {
    let declarations = match &config.inputs_file {
        Some(path) => config.calculator.declarations_with(&load_inputs_file(path)?)?,
        None => config.calculator.declarations()?,
    };
    let mut context = GraphContext::new(declarations)?;

    let pinned = context.mark_static_many(&config.pinned)?;

    let leaves = context.leaves()?;
    let title = context.title();
    info!(
        calculator = %config.calculator,
        session = %context.session_id(),
        title = ?title,
        "Calculator ready"
    );

    let mut snapshots = vec![snapshot(&mut context, &leaves, "initial".to_string())?];
    for (name, value) in &config.updates {
        context.set_root_input(name, value.clone())?;
        snapshots.push(snapshot(&mut context, &leaves, format!("{}={}", name, value))?);
    }

    Ok(DemoReport {
        title,
        pinned,
        snapshots,
    })
}

fn snapshot(
    context: &mut GraphContext,
    leaves: &[String],
    label: String,
) -> Result<Snapshot, CatalogError> {
    let values = context.get_values(leaves)?;
    Ok(Snapshot {
        label,
        values: leaves.iter().cloned().zip(values).collect(),
    })
}
