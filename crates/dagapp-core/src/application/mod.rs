/// Pull-based evaluation with memoization
pub mod evaluator;

/// Static node classification
pub mod static_factory;

/// Front-end collaborator supplying root values
pub mod input_source;

/// Session object owning one graph
pub mod context;
