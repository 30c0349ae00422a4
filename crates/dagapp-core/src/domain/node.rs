use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::binding::Binding;
use crate::types::{Args, Value};
use crate::CoreError;

/// A computation that can be wrapped by a node
pub trait Callable: Send + Sync {
    /// Compute the node's value from its bound arguments
    fn call(&self, args: &Args) -> Result<Value, CoreError>;
}

impl<F> Callable for F
where
    F: Fn(&Args) -> Result<Value, CoreError> + Send + Sync,
{
    fn call(&self, args: &Args) -> Result<Value, CoreError> {
        self(args)
    }
}

/// A declared parameter of a callable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name, matched against root inputs and nodes
    pub name: String,

    /// Default used when nothing else binds the name
    #[serde(default)]
    pub default: Option<Value>,
}

impl Parameter {
    /// A parameter that must bind to a root input, node or element
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter with a fallback value
    pub fn with_default(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}

impl From<&str> for Parameter {
    fn from(name: &str) -> Self {
        Parameter::required(name)
    }
}

impl From<String> for Parameter {
    fn from(name: String) -> Self {
        Parameter::required(name)
    }
}

impl From<(&str, Value)> for Parameter {
    fn from((name, default): (&str, Value)) -> Self {
        Parameter::with_default(name, default)
    }
}

/// Classification of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeClass {
    /// Recomputed whenever an upstream root input changes
    #[default]
    Ordinary,
    /// Computed once and held fixed until a full reload
    Static,
    /// Template node replicated once per element of a vector group's source
    VectorElement {
        /// Owning vector group
        group: String,
    },
}

impl NodeClass {
    /// Whether invalidation propagation must stop at this node
    pub fn is_pinned(&self) -> bool {
        matches!(self, NodeClass::Static)
    }

    /// The vector group this node is a template of, if any
    pub fn vector_group(&self) -> Option<&str> {
        match self {
            NodeClass::VectorElement { group } => Some(group),
            _ => None,
        }
    }

    /// Short label for introspection
    pub fn label(&self) -> &'static str {
        match self {
            NodeClass::Ordinary => "ordinary",
            NodeClass::Static => "static",
            NodeClass::VectorElement { .. } => "vector_element",
        }
    }
}

/// A computation declared by the front-end, before its parameters are bound
#[derive(Clone)]
pub struct NodeDeclaration {
    /// Node name
    pub name: String,

    /// Ordered parameters of the callable
    pub parameters: Vec<Parameter>,

    /// The computation
    pub callable: Arc<dyn Callable>,

    /// Requested classification
    pub class: NodeClass,
}

impl NodeDeclaration {
    /// Declare an ordinary node backed by a closure
    pub fn new<P, F>(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = P>,
        callable: F,
    ) -> Self
    where
        P: Into<Parameter>,
        F: Fn(&Args) -> Result<Value, CoreError> + Send + Sync + 'static,
    {
        Self::from_callable(name, parameters, Arc::new(callable))
    }

    /// Declare an ordinary node backed by any [`Callable`]
    pub fn from_callable<P>(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = P>,
        callable: Arc<dyn Callable>,
    ) -> Self
    where
        P: Into<Parameter>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            callable,
            class: NodeClass::Ordinary,
        }
    }

    /// Set the classification
    pub fn with_class(mut self, class: NodeClass) -> Self {
        self.class = class;
        self
    }

    /// Declare the node static
    pub fn pinned(self) -> Self {
        self.with_class(NodeClass::Static)
    }

    /// Declare the node a template of the given vector group
    pub fn in_vector_group(self, group: impl Into<String>) -> Self {
        self.with_class(NodeClass::VectorElement {
            group: group.into(),
        })
    }
}

impl fmt::Debug for NodeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDeclaration")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("class", &self.class)
            .finish()
    }
}

/// A registered node with resolved bindings
#[derive(Clone)]
pub struct Node {
    /// Node name
    pub name: String,

    /// Ordered parameters
    pub parameters: Vec<Parameter>,

    /// One binding per parameter, index-aligned with `parameters`
    pub bindings: Vec<Binding>,

    /// Classification
    pub class: NodeClass,

    callable: Arc<dyn Callable>,
}

impl Node {
    pub(crate) fn new(declaration: NodeDeclaration, bindings: Vec<Binding>) -> Self {
        Self {
            name: declaration.name,
            parameters: declaration.parameters,
            bindings,
            class: declaration.class,
            callable: declaration.callable,
        }
    }

    /// Invoke the callable
    pub fn call(&self, args: &Args) -> Result<Value, CoreError> {
        self.callable.call(args)
    }

    /// Names of nodes this node reads directly
    pub fn node_dependencies(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().filter_map(Binding::node_target)
    }

    /// Names of root inputs this node reads directly
    pub fn root_dependencies(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().filter_map(Binding::root_target)
    }

    /// Names of vector groups this node aggregates
    pub fn group_dependencies(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().filter_map(Binding::group_target)
    }

    /// Whether the node reads the vector element named `element`
    pub fn reads_element(&self, element: &str) -> bool {
        self.bindings
            .iter()
            .any(|b| matches!(b, Binding::Element(name) if name == element))
    }

    /// Parameters paired with their bindings
    pub fn bound_parameters(&self) -> impl Iterator<Item = (&Parameter, &Binding)> {
        self.parameters.iter().zip(self.bindings.iter())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .field("class", &self.class)
            .finish()
    }
}

/// Address of one cache slot: a node, or one replica of a vector template node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKey {
    /// An ordinary or static node
    Node(String),
    /// One replica of a vector template node
    Replica {
        /// Vector group
        group: String,
        /// Element index in the source vector
        index: usize,
        /// Template node name
        node: String,
    },
}

impl NodeKey {
    /// Key of an ordinary or static node
    pub fn node(name: impl Into<String>) -> Self {
        NodeKey::Node(name.into())
    }

    /// Key of a replica
    pub fn replica(group: impl Into<String>, index: usize, node: impl Into<String>) -> Self {
        NodeKey::Replica {
            group: group.into(),
            index,
            node: node.into(),
        }
    }

    /// Name of the node (or template node) behind this key
    pub fn node_name(&self) -> &str {
        match self {
            NodeKey::Node(name) => name,
            NodeKey::Replica { node, .. } => node,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Node(name) => write!(f, "{}", name),
            NodeKey::Replica { group, index, node } => write!(f, "{}[{}].{}", group, index, node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declaration_builder() {
        let decl = NodeDeclaration::new(
            "revenue",
            [Parameter::required("clicks"), Parameter::with_default("cost_per_click", json!(0.2))],
            |args| Ok(json!(args.f64("clicks")? * args.f64("cost_per_click")?)),
        );

        assert_eq!(decl.name, "revenue");
        assert_eq!(decl.parameters.len(), 2);
        assert_eq!(decl.parameters[1].default, Some(json!(0.2)));
        assert_eq!(decl.class, NodeClass::Ordinary);

        let args = Args::new().with("clicks", json!(10)).with("cost_per_click", json!(0.5));
        assert_eq!(decl.callable.call(&args).unwrap(), json!(5.0));
    }

    #[test]
    fn test_class_helpers() {
        let decl = NodeDeclaration::new("b", ["a"], |_| Ok(json!(1)));
        assert!(decl.clone().pinned().class.is_pinned());

        let element = decl.in_vector_group("powers").class;
        assert!(!element.is_pinned());
        assert_eq!(element.vector_group(), Some("powers"));
        assert_eq!(element.label(), "vector_element");
    }

    #[test]
    fn test_node_key_display() {
        assert_eq!(NodeKey::node("profit").to_string(), "profit");
        assert_eq!(NodeKey::replica("squares", 2, "square").to_string(), "squares[2].square");
        assert_eq!(NodeKey::replica("squares", 2, "square").node_name(), "square");
    }

    #[test]
    fn test_class_serialization() {
        let class = NodeClass::VectorElement {
            group: "g".to_string(),
        };
        let value = serde_json::to_value(&class).unwrap();
        assert_eq!(value, json!({"kind": "vector_element", "group": "g"}));
    }
}
