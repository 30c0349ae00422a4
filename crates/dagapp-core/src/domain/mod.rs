/// Root inputs and their constraints
pub mod root_input;

/// Node declarations, registered nodes and cache keys
pub mod node;

/// Parameter bindings and the argument resolver
pub mod binding;

/// Vectorized sub-graphs
pub mod vector;

/// Node registry
pub mod registry;

/// Dependency graph queries
pub mod graph;

/// Value cache with downstream invalidation
pub mod cache;
