//!
//! Dagapp Core - dependency graph engine for interactive calculators
//!
//! Callables are registered as nodes whose parameter names bind to root
//! inputs, other nodes or vector group elements. Values are computed on
//! demand, memoized, and invalidated downstream when a root input changes.
//! Nodes may be pinned as static, and sub-graphs may be replicated once per
//! element of a sequence-valued input.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - inputs, nodes, bindings, graph and cache
pub mod domain;

/// Application services - evaluation, static pinning and the session context
pub mod application;

/// Core types
pub mod types;

/// Error types
pub mod error;

pub use error::CoreError;
pub use types::{Args, Value};

pub use application::context::{
    Declarations, GraphContext, NodeDescription, ParameterDescription, SessionId,
};
pub use application::evaluator::Evaluator;
pub use application::input_source::InputSource;
pub use domain::binding::{Binding, KnownNames};
pub use domain::cache::{CacheStats, NodeCache};
pub use domain::node::{Callable, Node, NodeClass, NodeDeclaration, NodeKey, Parameter};
pub use domain::registry::NodeRegistry;
pub use domain::root_input::{DoubleSliderSetting, InputKind, RootInput, RootInputSpec};
pub use domain::vector::{Replica, VectorChange, VectorGroup, VectorGroupDeclaration, ZippedSource};
