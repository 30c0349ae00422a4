//! # Dagapp Catalog
//!
//! A handful of ready-made calculators built on the dagapp engine. Each
//! one pairs a set of node declarations with an inputs document kept
//! under `configs/`.
//!
//! ```
//! use dagapp_catalog::Calculator;
//! use dagapp_core::GraphContext;
//!
//! let declarations = Calculator::UserFunnel.declarations().unwrap();
//! let context = GraphContext::new(declarations).unwrap();
//! assert_eq!(context.title().as_deref(), Some("Profit Calculator"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;
use std::str::FromStr;

use dagapp_config::{check_coverage, parse_and_validate_inputs, InputsDocument};
use dagapp_core::Declarations;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod error;

pub mod consulting;
pub mod demo;
pub mod infection;
pub mod marketing;
pub mod user_funnel;
pub mod vectorized;

pub use error::CatalogError;

/// The calculators shipped with the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calculator {
    /// Partner marketing revenue
    Marketing,
    /// Paid acquisition profit
    UserFunnel,
    /// Deaths under partial vaccination
    Infection,
    /// Per-element results and their sum
    Vectorized,
    /// Monthly consulting fee
    Consulting,
}

impl Calculator {
    /// Every calculator, in catalog order
    pub const ALL: [Calculator; 5] = [
        Calculator::Marketing,
        Calculator::UserFunnel,
        Calculator::Infection,
        Calculator::Vectorized,
        Calculator::Consulting,
    ];

    /// Catalog name, as accepted by [`FromStr`]
    pub fn name(&self) -> &'static str {
        match self {
            Calculator::Marketing => "marketing",
            Calculator::UserFunnel => "user_funnel",
            Calculator::Infection => "infection",
            Calculator::Vectorized => "vectorized",
            Calculator::Consulting => "consulting",
        }
    }

    /// The bundled inputs document
    pub fn inputs_yaml(&self) -> &'static str {
        match self {
            Calculator::Marketing => marketing::INPUTS,
            Calculator::UserFunnel => user_funnel::INPUTS,
            Calculator::Infection => infection::INPUTS,
            Calculator::Vectorized => vectorized::INPUTS,
            Calculator::Consulting => consulting::INPUTS,
        }
    }

    /// Node and vector group declarations, without root inputs
    pub fn nodes(&self) -> Declarations {
        match self {
            Calculator::Marketing => marketing::nodes(),
            Calculator::UserFunnel => user_funnel::nodes(),
            Calculator::Infection => infection::nodes(),
            Calculator::Vectorized => vectorized::nodes(),
            Calculator::Consulting => consulting::nodes(),
        }
    }

    /// Full declarations using the bundled inputs document
    pub fn declarations(&self) -> Result<Declarations, CatalogError> {
        let document = parse_and_validate_inputs(self.inputs_yaml())?;
        self.declarations_with(&document)
    }

    /// Full declarations using another inputs document
    ///
    /// Fails when the document leaves a required root input undeclared.
    pub fn declarations_with(
        &self,
        document: &InputsDocument,
    ) -> Result<Declarations, CatalogError> {
        let mut declarations = self.nodes();
        check_coverage(document, &declarations)?;
        declarations.inputs = document.input_specs();
        debug!(
            calculator = self.name(),
            inputs = declarations.inputs.len(),
            nodes = declarations.nodes.len(),
            "Calculator declarations assembled"
        );
        Ok(declarations)
    }
}

impl fmt::Display for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Calculator {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_lowercase();
        Calculator::ALL
            .into_iter()
            .find(|calculator| calculator.name() == wanted)
            .ok_or_else(|| CatalogError::UnknownCalculator(s.to_string()))
    }
}

/// Returns a version string for the dagapp catalog crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
