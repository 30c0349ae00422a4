//! # Dagapp
//!
//! Declare plain functions whose parameter names refer to root inputs or
//! to other functions, and get back a graph that computes each value on
//! demand, caches it, and recomputes only what a changed input reaches.
//!
//! The pieces live in their own crates:
//!
//! * [`engine`]: registry, binding resolution, evaluation, caching, vector
//!   groups and static nodes
//! * [`config`]: YAML/JSON documents declaring root inputs
//! * [`monitoring`]: logging setup
//! * [`catalog`]: ready-made calculators and the demo binary
//!
//! ```
//! use dagapp::engine::{Declarations, GraphContext, NodeDeclaration, RootInputSpec};
//! use serde_json::json;
//!
//! let declarations = Declarations::new()
//!     .input(RootInputSpec::new("price", json!(4.0)))
//!     .node(NodeDeclaration::new("doubled", ["price"], |args| {
//!         Ok(json!(args.f64("price")? * 2.0))
//!     }));
//!
//! let mut context = GraphContext::new(declarations).unwrap();
//! assert_eq!(context.get_value("doubled").unwrap(), json!(8.0));
//!
//! context.set_root_input("price", json!(5.0)).unwrap();
//! assert_eq!(context.get_value("doubled").unwrap(), json!(10.0));
//! ```

#![forbid(unsafe_code)]

pub use dagapp_catalog as catalog;
pub use dagapp_config as config;
pub use dagapp_core as engine;
pub use dagapp_monitoring as monitoring;

pub use dagapp_core::{CoreError, Declarations, GraphContext, NodeDeclaration, RootInputSpec, Value};
