use thiserror::Error;

/// Core error type for the dagapp engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A parameter name matches neither a root input nor a registered node
    #[error(
        "Unresolved binding: parameter '{parameter}' of node '{node}' matches no root input, \
         node or vector element"
    )]
    UnresolvedBinding {
        /// Node being registered or evaluated
        node: String,
        /// The parameter that could not be bound
        parameter: String,
    },

    /// Name collision outside of a reload pass
    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    /// Registration would create a cycle, or one was met during evaluation
    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Names along the cycle, first and last entries are the same node
        cycle: Vec<String>,
    },

    /// Update or read of a root input that was never declared
    #[error("Unknown root input: {0}")]
    UnknownRootInput(String),

    /// A new root value falls outside its declared bound pair
    #[error("Range violation: value {value} for root input '{name}' is outside [{min}, {max}]")]
    RangeViolation {
        /// Root input name
        name: String,
        /// Offending value
        value: f64,
        /// Lower bound (inclusive)
        min: f64,
        /// Upper bound (inclusive)
        max: f64,
    },

    /// A node cannot be pinned as static
    #[error("Invalid static declaration for node '{node}': {reason}")]
    InvalidStaticDeclaration {
        /// Node that was requested to be static
        node: String,
        /// Why the request was rejected
        reason: String,
    },

    /// Requested name is not a node, root input or vector group
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A value does not have the kind its input or argument expects
    #[error("Type mismatch for '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Input or argument name
        name: String,
        /// Expected kind
        expected: String,
        /// Kind actually found
        found: String,
    },

    /// A user callable returned an error
    #[error("Computation of node '{node}' failed: {message}")]
    ComputationFailed {
        /// Node (or replica) whose callable failed
        node: String,
        /// Error reported by the callable
        message: String,
    },

    /// The zipped sources of a vector group hold sequences of different lengths
    #[error("Vector group '{group}' has sources of different lengths: {lengths}")]
    VectorLengthMismatch {
        /// Vector group name
        group: String,
        /// Each source with its length, e.g. "a_values=4, c_values=3"
        lengths: String,
    },

    /// Malformed declaration (vector group, root input spec, ...)
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// Argument requested by a callable that is not part of its signature
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Get the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::UnresolvedBinding { .. } => "ERR_UNRESOLVED_BINDING",
            CoreError::DuplicateNode(_) => "ERR_DUPLICATE_NODE",
            CoreError::CyclicDependency { .. } => "ERR_CYCLIC_DEPENDENCY",
            CoreError::UnknownRootInput(_) => "ERR_UNKNOWN_ROOT_INPUT",
            CoreError::RangeViolation { .. } => "ERR_RANGE_VIOLATION",
            CoreError::InvalidStaticDeclaration { .. } => "ERR_INVALID_STATIC_DECLARATION",
            CoreError::UnknownNode(_) => "ERR_UNKNOWN_NODE",
            CoreError::TypeMismatch { .. } => "ERR_TYPE_MISMATCH",
            CoreError::ComputationFailed { .. } => "ERR_COMPUTATION_FAILED",
            CoreError::VectorLengthMismatch { .. } => "ERR_VECTOR_LENGTH_MISMATCH",
            CoreError::InvalidDeclaration(_) => "ERR_INVALID_DECLARATION",
            CoreError::MissingArgument(_) => "ERR_MISSING_ARGUMENT",
            CoreError::SerializationError(_) => "ERR_SERIALIZATION",
            CoreError::Other(_) => "ERR_OTHER",
        }
    }

    pub(crate) fn unresolved(node: impl Into<String>, parameter: impl Into<String>) -> Self {
        CoreError::UnresolvedBinding {
            node: node.into(),
            parameter: parameter.into(),
        }
    }

    pub(crate) fn invalid_static(node: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidStaticDeclaration {
            node: node.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                CoreError::unresolved("profit", "rev"),
                "Unresolved binding: parameter 'rev' of node 'profit' matches no root input, \
                 node or vector element",
            ),
            (CoreError::DuplicateNode("cost".to_string()), "Duplicate node: cost"),
            (
                CoreError::CyclicDependency {
                    cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
                },
                "Cyclic dependency: a -> b -> a",
            ),
            (CoreError::UnknownRootInput("vax".to_string()), "Unknown root input: vax"),
            (
                CoreError::RangeViolation {
                    name: "vax".to_string(),
                    value: 1.5,
                    min: 0.0,
                    max: 1.0,
                },
                "Range violation: value 1.5 for root input 'vax' is outside [0, 1]",
            ),
            (CoreError::UnknownNode("nope".to_string()), "Unknown node: nope"),
            (CoreError::Other("other_err".to_string()), "other_err"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            CoreError::unresolved("n", "p"),
            CoreError::DuplicateNode("n".to_string()),
            CoreError::CyclicDependency { cycle: vec![] },
            CoreError::UnknownRootInput("r".to_string()),
            CoreError::RangeViolation {
                name: "r".to_string(),
                value: 0.0,
                min: 0.0,
                max: 0.0,
            },
            CoreError::invalid_static("n", "reason"),
            CoreError::UnknownNode("n".to_string()),
            CoreError::VectorLengthMismatch {
                group: "g".to_string(),
                lengths: "a=1, b=2".to_string(),
            },
        ];

        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.error_code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: CoreError = json_error.into();

        match error {
            CoreError::SerializationError(msg) => assert!(msg.contains("expected value")),
            _ => panic!("Expected SerializationError variant"),
        }
    }

    #[test]
    fn test_from_str() {
        let error: CoreError = "division by zero".into();
        assert_eq!(error, CoreError::Other("division by zero".to_string()));
    }
}
