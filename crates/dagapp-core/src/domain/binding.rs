//! Parameter binding and the argument resolver
//!
//! Binding happens in two phases. All names that will exist once a batch
//! is committed (root inputs, existing nodes, the batch's own nodes and the
//! vector groups) are first collected into [`KnownNames`]; each parameter
//! is then resolved against that table, which is what permits forward
//! references inside one batch.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::node::{NodeClass, NodeDeclaration, Parameter};
use crate::types::Value;
use crate::CoreError;

/// Resolution of one parameter name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Binding {
    /// Reads a root input's current value
    Root(String),
    /// Reads another node's value (a dependency edge)
    Node(String),
    /// Reads the replica's element of the named vector group source
    Element(String),
    /// Reads the outputs of every replica of a vector group, in index order
    Group(String),
    /// Falls back to the parameter's declared default
    Default(Value),
    /// Not bound; only ever transient
    Unresolved(String),
}

impl Binding {
    /// Whether this binding can be evaluated
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Binding::Unresolved(_))
    }

    /// Target node name for node bindings
    pub fn node_target(&self) -> Option<&str> {
        match self {
            Binding::Node(name) => Some(name),
            _ => None,
        }
    }

    /// Target input name for root bindings
    pub fn root_target(&self) -> Option<&str> {
        match self {
            Binding::Root(name) => Some(name),
            _ => None,
        }
    }

    /// Target group name for group bindings
    pub fn group_target(&self) -> Option<&str> {
        match self {
            Binding::Group(name) => Some(name),
            _ => None,
        }
    }
}

/// Every name a parameter may bind to
#[derive(Debug, Clone, Default)]
pub struct KnownNames {
    roots: BTreeSet<String>,
    nodes: BTreeMap<String, NodeClass>,
    /// Group name -> element parameter names
    groups: BTreeMap<String, Vec<String>>,
}

impl KnownNames {
    /// Create an empty name table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root input name
    pub fn add_root(&mut self, name: impl Into<String>) {
        self.roots.insert(name.into());
    }

    /// Add a node name with its classification
    pub fn add_node(&mut self, name: impl Into<String>, class: NodeClass) {
        self.nodes.insert(name.into(), class);
    }

    /// Add a vector group and its element parameter names
    pub fn add_group<I, S>(&mut self, name: impl Into<String>, elements: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .insert(name.into(), elements.into_iter().map(Into::into).collect());
    }

    /// Whether a name is already taken by a root, node or group
    pub fn contains(&self, name: &str) -> bool {
        self.roots.contains(name) || self.nodes.contains_key(name) || self.groups.contains_key(name)
    }

    /// Resolve one parameter of the node `node` (classified `class`)
    ///
    /// Precedence: root input, node, vector group, element placeholder,
    /// declared default. Matching is exact and case-sensitive.
    pub fn resolve(
        &self,
        node: &str,
        class: &NodeClass,
        parameter: &Parameter,
    ) -> Result<Binding, CoreError> {
        let name = parameter.name.as_str();
        let own_group = class.vector_group();

        if self.roots.contains(name) {
            return Ok(Binding::Root(name.to_string()));
        }

        if let Some(target_class) = self.nodes.get(name) {
            match target_class.vector_group() {
                // Template nodes are only visible from their own group
                Some(group) if Some(group) != own_group => {}
                _ => return Ok(Binding::Node(name.to_string())),
            }
        }

        if self.groups.contains_key(name) && own_group != Some(name) {
            return Ok(Binding::Group(name.to_string()));
        }

        if let Some(group) = own_group {
            if self.groups.get(group).is_some_and(|elements| elements.iter().any(|e| e == name)) {
                return Ok(Binding::Element(name.to_string()));
            }
        }

        if let Some(default) = &parameter.default {
            return Ok(Binding::Default(default.clone()));
        }

        Err(CoreError::unresolved(node, name))
    }

    /// Resolve every parameter of a declaration, failing on the first unresolved one
    pub fn resolve_all(&self, declaration: &NodeDeclaration) -> Result<Vec<Binding>, CoreError> {
        if let Some(group) = declaration.class.vector_group() {
            if !self.groups.contains_key(group) {
                return Err(CoreError::InvalidDeclaration(format!(
                    "Node '{}' is a template of undeclared vector group '{}'",
                    declaration.name, group
                )));
            }
        }

        declaration
            .parameters
            .iter()
            .map(|parameter| self.resolve(&declaration.name, &declaration.class, parameter))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names() -> KnownNames {
        let mut names = KnownNames::new();
        names.add_root("max_partners");
        names.add_root("xs");
        names.add_node("partners", NodeClass::Ordinary);
        names.add_node("baseline", NodeClass::Static);
        names.add_node(
            "square",
            NodeClass::VectorElement {
                group: "squares".to_string(),
            },
        );
        names.add_group("squares", ["x", "w"]);
        names
    }

    fn element_class() -> NodeClass {
        NodeClass::VectorElement {
            group: "squares".to_string(),
        }
    }

    #[test]
    fn test_resolve_root_and_node() {
        let names = names();
        let class = NodeClass::Ordinary;

        assert_eq!(
            names.resolve("n", &class, &"max_partners".into()).unwrap(),
            Binding::Root("max_partners".to_string())
        );
        assert_eq!(
            names.resolve("n", &class, &"partners".into()).unwrap(),
            Binding::Node("partners".to_string())
        );
        assert_eq!(
            names.resolve("n", &class, &"baseline".into()).unwrap(),
            Binding::Node("baseline".to_string())
        );
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let names = names();
        let err = names
            .resolve("clicks", &NodeClass::Ordinary, &"Partners".into())
            .unwrap_err();
        assert_eq!(err, CoreError::unresolved("clicks", "Partners"));
    }

    #[test]
    fn test_resolve_element_only_inside_group() {
        let names = names();

        assert_eq!(
            names.resolve("square", &element_class(), &"x".into()).unwrap(),
            Binding::Element("x".to_string())
        );
        assert_eq!(
            names.resolve("square", &element_class(), &"w".into()).unwrap(),
            Binding::Element("w".to_string())
        );
        assert!(matches!(
            names.resolve("total", &NodeClass::Ordinary, &"x".into()),
            Err(CoreError::UnresolvedBinding { .. })
        ));
    }

    #[test]
    fn test_template_nodes_hidden_outside_group() {
        let names = names();

        assert!(names.resolve("total", &NodeClass::Ordinary, &"square".into()).is_err());
        assert_eq!(
            names.resolve("cube", &element_class(), &"square".into()).unwrap(),
            Binding::Node("square".to_string())
        );
    }

    #[test]
    fn test_resolve_group_aggregate() {
        let names = names();
        assert_eq!(
            names.resolve("total", &NodeClass::Ordinary, &"squares".into()).unwrap(),
            Binding::Group("squares".to_string())
        );
    }

    #[test]
    fn test_resolve_default_fallback() {
        let names = names();
        let param = Parameter::with_default("price_elasticity", json!(120));
        assert_eq!(
            names.resolve("partners", &NodeClass::Ordinary, &param).unwrap(),
            Binding::Default(json!(120))
        );

        // A root input wins over the default
        let param = Parameter::with_default("max_partners", json!(5));
        assert_eq!(
            names.resolve("partners", &NodeClass::Ordinary, &param).unwrap(),
            Binding::Root("max_partners".to_string())
        );
    }

    #[test]
    fn test_resolve_all_requires_declared_group() {
        let names = names();
        let decl = NodeDeclaration::new("cube", ["x"], |_| Ok(json!(0))).in_vector_group("cubes");
        assert!(matches!(
            names.resolve_all(&decl),
            Err(CoreError::InvalidDeclaration(_))
        ));
    }
}
