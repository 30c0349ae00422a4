//! Dependency graph queries: cycle detection, ordering and the reverse index

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use crate::domain::binding::Binding;
use crate::domain::node::{Node, NodeKey};
use crate::domain::registry::NodeRegistry;
use crate::domain::vector::VectorGroup;
use crate::CoreError;

/// Names of the nodes `node` reads
///
/// A group binding depends on the group's output template node.
pub fn dependencies_of(node: &Node, groups: &BTreeMap<String, VectorGroup>) -> Vec<String> {
    node.bindings
        .iter()
        .filter_map(|binding| match binding {
            Binding::Node(name) => Some(name.clone()),
            Binding::Group(group) => groups.get(group).map(|g| g.declaration.output.clone()),
            _ => None,
        })
        .collect()
}

/// Find a dependency cycle, returning the path with the first node repeated at the end
pub fn find_cycle(
    nodes: &HashMap<String, Node>,
    groups: &BTreeMap<String, VectorGroup>,
) -> Option<Vec<String>> {
    let mut names: Vec<&String> = nodes.keys().collect();
    names.sort();

    let mut done = HashSet::new();
    let mut path = Vec::new();

    for name in names {
        if let Some(cycle) = visit(name, nodes, groups, &mut done, &mut path) {
            return Some(cycle);
        }
    }
    None
}

fn visit(
    name: &str,
    nodes: &HashMap<String, Node>,
    groups: &BTreeMap<String, VectorGroup>,
    done: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    if done.contains(name) {
        return None;
    }
    if let Some(start) = path.iter().position(|n| n == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name.to_string());
        return Some(cycle);
    }

    path.push(name.to_string());
    if let Some(node) = nodes.get(name) {
        for dep in dependencies_of(node, groups) {
            if let Some(cycle) = visit(&dep, nodes, groups, done, path) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    done.insert(name.to_string());
    None
}

/// Dependents of every node, by name
pub fn dependents_by_name(registry: &NodeRegistry) -> HashMap<String, Vec<String>> {
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
    for node in registry.nodes() {
        for dep in dependencies_of(node, registry.groups()) {
            dependents.entry(dep).or_default().push(node.name.clone());
        }
    }
    dependents
}

/// Order the nodes so that every node comes after its dependencies
///
/// Ties are broken by registration order, so the result is stable.
pub fn topological_order(registry: &NodeRegistry) -> Result<Vec<String>, CoreError> {
    let position: HashMap<&str, usize> = registry
        .order()
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut pending: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<String, Vec<&str>> = HashMap::new();
    for node in registry.nodes() {
        let deps = dependencies_of(node, registry.groups());
        pending.insert(node.name.as_str(), deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(node.name.as_str());
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| Reverse(position[name]))
        .collect();

    let mut ordered = Vec::with_capacity(pending.len());
    while let Some(Reverse(i)) = ready.pop() {
        let name = registry.order()[i].as_str();
        ordered.push(name.to_string());

        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.push(Reverse(position[dependent]));
                }
            }
        }
    }

    if ordered.len() != pending.len() {
        let cycle = find_cycle(registry.node_map(), registry.groups()).unwrap_or_default();
        return Err(CoreError::CyclicDependency { cycle });
    }
    Ok(ordered)
}

/// Nodes nothing else reads, in evaluation order
pub fn leaves(registry: &NodeRegistry) -> Result<Vec<String>, CoreError> {
    let dependents = dependents_by_name(registry);
    Ok(topological_order(registry)?
        .into_iter()
        .filter(|name| !dependents.contains_key(name))
        .collect())
}

/// Reverse dependency index over cache keys
///
/// Template nodes appear once per replica, so edges inside a vector group
/// connect replicas with the same index, and an aggregate depends on the
/// output replica of every index.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    dependents: HashMap<NodeKey, Vec<NodeKey>>,
    root_dependents: HashMap<String, Vec<NodeKey>>,
}

impl DependencyIndex {
    /// Build the index for the current registry and replica counts
    pub fn build(registry: &NodeRegistry) -> Self {
        let mut index = Self::default();

        for node in registry.nodes() {
            match node.class.vector_group() {
                None => index.add_node(NodeKey::node(node.name.clone()), node, None, registry),
                Some(group_name) => {
                    let Some(group) = registry.group(group_name) else {
                        continue;
                    };
                    for i in 0..group.len() {
                        let key = NodeKey::replica(group_name, i, node.name.clone());
                        index.add_node(key, node, Some((group, i)), registry);
                    }
                }
            }
        }

        index
    }

    fn add_node(
        &mut self,
        key: NodeKey,
        node: &Node,
        replica: Option<(&VectorGroup, usize)>,
        registry: &NodeRegistry,
    ) {
        for binding in &node.bindings {
            match binding {
                Binding::Root(root) => {
                    self.root_dependents.entry(root.clone()).or_default().push(key.clone());
                }
                Binding::Node(dep) => {
                    let dep_key = match replica {
                        Some((group, i)) if group.is_template(dep) => {
                            NodeKey::replica(group.name(), i, dep.clone())
                        }
                        _ => NodeKey::node(dep.clone()),
                    };
                    self.add_edge(dep_key, key.clone());
                }
                Binding::Group(group) => {
                    if let Some(group) = registry.group(group) {
                        for output in group.output_keys() {
                            self.add_edge(output, key.clone());
                        }
                    }
                }
                Binding::Element(_) | Binding::Default(_) | Binding::Unresolved(_) => {}
            }
        }
    }

    /// Record that `dependent` reads `dependency`
    pub fn add_edge(&mut self, dependency: NodeKey, dependent: NodeKey) {
        let entry = self.dependents.entry(dependency).or_default();
        if !entry.contains(&dependent) {
            entry.push(dependent);
        }
    }

    /// Keys reading `key` directly
    pub fn dependents(&self, key: &NodeKey) -> &[NodeKey] {
        self.dependents.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Keys reading the root input `name` directly
    pub fn root_dependents(&self, name: &str) -> &[NodeKey] {
        self.root_dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
