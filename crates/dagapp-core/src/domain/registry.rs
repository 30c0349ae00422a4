use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::domain::binding::{Binding, KnownNames};
use crate::domain::graph;
use crate::domain::node::{Node, NodeClass, NodeDeclaration};
use crate::domain::root_input::{RootInput, RootInputSpec};
use crate::domain::vector::{source_items, VectorChange, VectorGroup, VectorGroupDeclaration};
use crate::types::Value;
use crate::CoreError;

/// Named nodes, root inputs and vector groups of one graph
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    roots: BTreeMap<String, RootInput>,
    nodes: HashMap<String, Node>,
    order: Vec<String>,
    groups: BTreeMap<String, VectorGroup>,
}

impl NodeRegistry {
    /// Create a registry holding the given root inputs
    pub fn with_inputs(specs: &[RootInputSpec]) -> Result<Self, CoreError> {
        let mut registry = Self::default();
        for spec in specs {
            if registry.roots.contains_key(&spec.name) {
                return Err(CoreError::InvalidDeclaration(format!(
                    "Root input '{}' is declared twice",
                    spec.name
                )));
            }
            registry.roots.insert(spec.name.clone(), RootInput::from_spec(spec)?);
        }
        Ok(registry)
    }

    /// Declare a vector group over a sequence-valued root input
    pub fn declare_group(&mut self, declaration: VectorGroupDeclaration) -> Result<(), CoreError> {
        if self.is_taken(&declaration.name) {
            return Err(CoreError::DuplicateNode(declaration.name));
        }
        let group = VectorGroup::materialize(declaration, &self.roots)?;
        debug!(group = %group.name(), replicas = group.len(), "Declared vector group");
        self.groups.insert(group.name().to_string(), group);
        Ok(())
    }

    /// Register a single node
    pub fn register(&mut self, declaration: NodeDeclaration) -> Result<(), CoreError> {
        self.register_batch(vec![declaration]).map(|_| ())
    }

    /// Register several nodes at once
    ///
    /// Every name in the batch is known before any parameter is bound, so
    /// nodes may reference nodes declared later in the same batch. Nothing
    /// is committed unless the whole batch binds and stays acyclic.
    pub fn register_batch(
        &mut self,
        declarations: Vec<NodeDeclaration>,
    ) -> Result<Vec<String>, CoreError> {
        let mut names = self.known_names();
        for declaration in &declarations {
            if names.contains(&declaration.name) {
                return Err(CoreError::DuplicateNode(declaration.name.clone()));
            }
            names.add_node(declaration.name.clone(), declaration.class.clone());
        }

        let mut staged = self.nodes.clone();
        let mut added = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let bindings = names.resolve_all(&declaration)?;
            let node = Node::new(declaration, bindings);
            added.push(node.name.clone());
            staged.insert(node.name.clone(), node);
        }

        for name in &added {
            if let Some(node) = staged.get(name) {
                self.check_group_bindings(node, &staged)?;
            }
        }

        if let Some(cycle) = graph::find_cycle(&staged, &self.groups) {
            return Err(CoreError::CyclicDependency { cycle });
        }

        for name in &added {
            if let Some(group) = staged.get(name).and_then(|n| n.class.vector_group()) {
                if let Some(group) = self.groups.get_mut(group) {
                    group.add_template(name.clone());
                }
            }
            debug!(node = %name, "Registered node");
        }
        self.nodes = staged;
        self.order.extend(added.iter().cloned());
        Ok(added)
    }

    fn check_group_bindings(
        &self,
        node: &Node,
        staged: &HashMap<String, Node>,
    ) -> Result<(), CoreError> {
        for group_name in node.group_dependencies() {
            let Some(group) = self.groups.get(group_name) else {
                continue;
            };
            let output = &group.declaration.output;
            match staged.get(output).map(|n| &n.class) {
                Some(NodeClass::VectorElement { group }) if group == group_name => {}
                Some(_) => {
                    return Err(CoreError::InvalidDeclaration(format!(
                        "Output '{}' of vector group '{}' is not a template node of that group",
                        output, group_name
                    )))
                }
                None => return Err(CoreError::unresolved(node.name.clone(), group_name)),
            }
        }
        Ok(())
    }

    /// Set a root input's value, returning the previous value
    ///
    /// The value is checked against the input's kind and range, and against
    /// the sequence requirement of any vector group it feeds, before
    /// anything is changed. Vector groups are not refreshed here.
    pub fn update_root_input(&mut self, name: &str, value: Value) -> Result<Value, CoreError> {
        let root = self
            .roots
            .get_mut(name)
            .ok_or_else(|| CoreError::UnknownRootInput(name.to_string()))?;
        root.validate(&value)?;
        if self.groups.values().any(|g| g.declaration.is_fed_by(name)) {
            source_items(name, &root.kind.expand(&value))?;
        }
        Ok(root.replace_value(value))
    }

    /// Names of the vector groups replicated over the root input `name`
    pub fn groups_fed_by(&self, name: &str) -> Vec<String> {
        self.groups
            .values()
            .filter(|g| g.declaration.is_fed_by(name))
            .map(|g| g.name().to_string())
            .collect()
    }

    /// Re-bind a vector group to the current values of its sources
    pub(crate) fn refresh_group(&mut self, name: &str) -> Result<VectorChange, CoreError> {
        let roots = &self.roots;
        match self.groups.get_mut(name) {
            Some(group) => group.refresh(roots),
            None => Ok(VectorChange::Unchanged),
        }
    }

    /// Keep root values from a previous registry where they are still valid
    pub(crate) fn carry_values_from(&mut self, previous: &NodeRegistry) {
        for (name, root) in self.roots.iter_mut() {
            if let Some(old) = previous.roots.get(name) {
                if root.validate(&old.setting).is_ok() {
                    root.replace_value(old.setting.clone());
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, node: Node) {
        self.order.push(node.name.clone());
        self.nodes.insert(node.name.clone(), node);
    }

    pub(crate) fn set_class(&mut self, name: &str, class: NodeClass) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.class = class;
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.roots.contains_key(name)
            || self.nodes.contains_key(name)
            || self.groups.contains_key(name)
    }

    /// Name table for binding new declarations against this registry
    pub fn known_names(&self) -> KnownNames {
        let mut names = KnownNames::new();
        for name in self.roots.keys() {
            names.add_root(name.clone());
        }
        for node in self.nodes.values() {
            names.add_node(node.name.clone(), node.class.clone());
        }
        for group in self.groups.values() {
            names.add_group(group.name().to_string(), group.declaration.elements());
        }
        names
    }

    /// A root input by name
    pub fn root(&self, name: &str) -> Option<&RootInput> {
        self.roots.get(name)
    }

    /// Root inputs in name order
    pub fn roots(&self) -> impl Iterator<Item = &RootInput> {
        self.roots.values()
    }

    /// A node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Nodes in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    /// Node names in registration order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub(crate) fn node_map(&self) -> &HashMap<String, Node> {
        &self.nodes
    }

    /// A vector group by name
    pub fn group(&self, name: &str) -> Option<&VectorGroup> {
        self.groups.get(name)
    }

    /// All vector groups by name
    pub fn groups(&self) -> &BTreeMap<String, VectorGroup> {
        &self.groups
    }

    /// Whether a binding target exists in this registry
    pub fn is_bound(&self, binding: &Binding) -> bool {
        match binding {
            Binding::Root(name) => self.roots.contains_key(name),
            Binding::Node(name) => self.nodes.contains_key(name),
            Binding::Group(name) => self.groups.contains_key(name),
            Binding::Element(_) | Binding::Default(_) => true,
            Binding::Unresolved(_) => false,
        }
    }
}
