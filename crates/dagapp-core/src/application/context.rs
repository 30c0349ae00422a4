use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::evaluator::Evaluator;
use crate::application::input_source::InputSource;
use crate::application::static_factory;
use crate::domain::binding::Binding;
use crate::domain::cache::{CacheStats, NodeCache};
use crate::domain::graph::{self, DependencyIndex};
use crate::domain::node::{NodeClass, NodeDeclaration, NodeKey};
use crate::domain::registry::NodeRegistry;
use crate::domain::root_input::{RootInput, RootInputSpec};
use crate::domain::vector::{VectorChange, VectorGroup, VectorGroupDeclaration};
use crate::types::Value;
use crate::CoreError;

/// Identifier of one graph session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the front-end declares for one graph
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    /// Root inputs
    pub inputs: Vec<RootInputSpec>,
    /// Vector groups
    pub vector_groups: Vec<VectorGroupDeclaration>,
    /// Nodes, in declaration order
    pub nodes: Vec<NodeDeclaration>,
}

impl Declarations {
    /// Create an empty declaration set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root input
    pub fn input(mut self, spec: RootInputSpec) -> Self {
        self.inputs.push(spec);
        self
    }

    /// Add a vector group
    pub fn vector_group(mut self, declaration: VectorGroupDeclaration) -> Self {
        self.vector_groups.push(declaration);
        self
    }

    /// Add a node
    pub fn node(mut self, declaration: NodeDeclaration) -> Self {
        self.nodes.push(declaration);
        self
    }
}

/// A parameter and what it is bound to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescription {
    /// Parameter name
    pub name: String,
    /// Resolved binding
    pub binding: Binding,
}

/// Introspection view of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDescription {
    /// Node name
    pub name: String,
    /// Classification
    pub class: NodeClass,
    /// Parameters with their bindings
    pub parameters: Vec<ParameterDescription>,
    /// Nodes that read this node
    pub dependents: Vec<String>,
    /// Whether a valid value is cached (for templates: in every replica)
    pub cached: bool,
}

/// One session's graph: registry, cache and dependency index
///
/// The context is an owned value; callers hold one per session and every
/// operation goes through it, so nothing is shared between sessions.
pub struct GraphContext {
    session_id: SessionId,
    declarations: Declarations,
    registry: NodeRegistry,
    cache: NodeCache,
    index: DependencyIndex,
}

impl GraphContext {
    /// Build a graph from a declaration set
    pub fn new(declarations: Declarations) -> Result<Self, CoreError> {
        let session_id = SessionId::generate();
        let (registry, cache, index) = build(&declarations, None)?;
        info!(
            session = %session_id,
            nodes = registry.order().len(),
            inputs = declarations.inputs.len(),
            "Graph context created"
        );
        Ok(Self {
            session_id,
            declarations,
            registry,
            cache,
            index,
        })
    }

    /// Register one node
    pub fn register_node(&mut self, declaration: NodeDeclaration) -> Result<(), CoreError> {
        self.register_batch(vec![declaration]).map(|_| ())
    }

    /// Register several nodes; the batch may reference itself in any order
    ///
    /// Nothing changes unless every node binds, the graph stays acyclic and
    /// the batch's static nodes compute.
    pub fn register_batch(
        &mut self,
        declarations: Vec<NodeDeclaration>,
    ) -> Result<Vec<String>, CoreError> {
        let mut registry = self.registry.clone();
        let added = register_into(&mut registry, declarations.clone())?;

        let mut cache = self.cache.clone();
        compute_static(&registry, &mut cache)?;

        self.registry = registry;
        self.cache = cache;
        self.index = DependencyIndex::build(&self.registry);
        self.declarations.nodes.extend(declarations);
        debug!(session = %self.session_id, added = ?added, "Registered nodes");
        Ok(added)
    }

    /// Discard the graph and rebuild it from a new declaration set
    ///
    /// Root values that still exist and still satisfy their constraints
    /// are kept; static nodes are computed again.
    pub fn reload(&mut self, declarations: Declarations) -> Result<(), CoreError> {
        let (registry, cache, index) = build(&declarations, Some(&self.registry))?;
        self.registry = registry;
        self.cache = cache;
        self.index = index;
        self.declarations = declarations;
        info!(session = %self.session_id, nodes = self.registry.order().len(), "Graph reloaded");
        Ok(())
    }

    /// Rebuild the graph from the declarations it was built from
    pub fn reload_current(&mut self) -> Result<(), CoreError> {
        self.reload(self.declarations.clone())
    }

    /// Values for the requested names, in request order
    ///
    /// Names may be nodes, root inputs or vector groups.
    pub fn get_values<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Value>, CoreError> {
        Evaluator::new(&self.registry, &mut self.cache).evaluate(names)
    }

    /// Value of a single name
    pub fn get_value(&mut self, name: &str) -> Result<Value, CoreError> {
        Evaluator::new(&self.registry, &mut self.cache).resolve_name(name)
    }

    /// Update a root input and invalidate what depends on it
    ///
    /// Setting the current value again is a no-op. A rejected value leaves
    /// the graph untouched.
    pub fn set_root_input(&mut self, name: &str, value: Value) -> Result<(), CoreError> {
        let previous = match self.registry.update_root_input(name, value.clone()) {
            Ok(previous) => previous,
            Err(err) => {
                warn!(
                    session = %self.session_id,
                    input = %name,
                    error = %err,
                    "Rejected root input update"
                );
                return Err(err);
            }
        };
        if previous == value {
            return Ok(());
        }

        let mut seeds: Vec<NodeKey> = self.index.root_dependents(name).to_vec();
        let mut resized = false;

        for group_name in self.registry.groups_fed_by(name) {
            let old_keys = match self.registry.group(&group_name) {
                Some(group) => group.keys(),
                None => continue,
            };
            match self.registry.refresh_group(&group_name)? {
                VectorChange::Unchanged => {}
                VectorChange::Elements(changed) => {
                    for (i, element) in changed {
                        seeds.extend(
                            self.registry
                                .nodes()
                                .filter(|n| n.class.vector_group() == Some(group_name.as_str()))
                                .filter(|n| n.reads_element(&element))
                                .map(|n| NodeKey::replica(group_name.clone(), i, n.name.clone())),
                        );
                    }
                }
                VectorChange::Resized { from, to } => {
                    info!(
                        session = %self.session_id,
                        group = %group_name,
                        from,
                        to,
                        "Rebuilding vector group"
                    );
                    let registry = &self.registry;
                    self.cache.invalidate(old_keys.iter().cloned(), &self.index, |key| {
                        is_pinned(registry, key)
                    });
                    self.cache.evict(&old_keys);
                    // An empty group had no replica edges to walk
                    seeds.extend(
                        self.registry
                            .nodes()
                            .filter(|n| n.group_dependencies().any(|g| g == group_name))
                            .map(|n| NodeKey::node(n.name.clone())),
                    );
                    resized = true;
                }
            }
        }

        let registry = &self.registry;
        let invalidated = self.cache.invalidate(seeds, &self.index, |key| is_pinned(registry, key));
        debug!(
            session = %self.session_id,
            input = %name,
            invalidated = invalidated.len(),
            "Root input updated"
        );

        if resized {
            self.index = DependencyIndex::build(&self.registry);
        }
        Ok(())
    }

    /// Pull every root value from `source`, applying the ones that changed
    ///
    /// Returns the names of the inputs that were updated.
    pub fn sync_from(&mut self, source: &dyn InputSource) -> Result<Vec<String>, CoreError> {
        let updates: Vec<(String, Value)> = self
            .registry
            .roots()
            .filter_map(|root| {
                source
                    .current_value(&root.name)
                    .filter(|value| *value != root.setting)
                    .map(|value| (root.name.clone(), value))
            })
            .collect();

        let mut changed = Vec::with_capacity(updates.len());
        for (name, value) in updates {
            self.set_root_input(&name, value)?;
            changed.push(name);
        }
        Ok(changed)
    }

    /// Declare a node static, pinning it at its current value
    ///
    /// Returns every node that became static.
    pub fn mark_static(&mut self, name: &str) -> Result<Vec<String>, CoreError> {
        self.mark_static_many(&[name])
    }

    /// Declare several nodes static in one step
    ///
    /// Nodes that share an upstream node can only be pinned together.
    pub fn mark_static_many<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Result<Vec<String>, CoreError> {
        let mut registry = self.registry.clone();
        let pinned = static_factory::mark_static_all(&mut registry, names)?;

        let mut cache = self.cache.clone();
        compute_static(&registry, &mut cache)?;

        self.registry = registry;
        self.cache = cache;
        for declaration in self.declarations.nodes.iter_mut() {
            if names.iter().any(|name| name.as_ref() == declaration.name) {
                declaration.class = NodeClass::Static;
            }
        }
        Ok(pinned)
    }

    /// Introspection view of a node
    pub fn describe_node(&self, name: &str) -> Result<NodeDescription, CoreError> {
        let node = self
            .registry
            .node(name)
            .ok_or_else(|| CoreError::UnknownNode(name.to_string()))?;

        let dependents = graph::dependents_by_name(&self.registry).remove(name).unwrap_or_default();

        Ok(NodeDescription {
            name: node.name.clone(),
            class: node.class.clone(),
            parameters: node
                .bound_parameters()
                .map(|(parameter, binding)| ParameterDescription {
                    name: parameter.name.clone(),
                    binding: binding.clone(),
                })
                .collect(),
            dependents,
            cached: self.is_cached(name),
        })
    }

    /// A root input with its constraints and current value
    pub fn describe_input(&self, name: &str) -> Result<&RootInput, CoreError> {
        self.registry
            .root(name)
            .ok_or_else(|| CoreError::UnknownRootInput(name.to_string()))
    }

    /// Root inputs in name order
    pub fn inputs(&self) -> Vec<&RootInput> {
        self.registry.roots().collect()
    }

    /// Node names with every node after its dependencies
    pub fn evaluation_order(&self) -> Result<Vec<String>, CoreError> {
        graph::topological_order(&self.registry)
    }

    /// Nodes nothing else reads
    pub fn leaves(&self) -> Result<Vec<String>, CoreError> {
        graph::leaves(&self.registry)
    }

    /// Page title derived from the first leaf, e.g. "Profit Calculator"
    ///
    /// The leaf name is capitalized: first character upper-cased, the rest
    /// lower-cased, so `totalCost` reads "Totalcost Calculator".
    pub fn title(&self) -> Option<String> {
        let leaves = self.leaves().ok()?;
        let leaf = leaves.first()?;
        let mut chars = leaf.chars();
        let first = chars.next()?;
        Some(format!(
            "{}{} Calculator",
            first.to_uppercase(),
            chars.as_str().to_lowercase()
        ))
    }

    /// A vector group by name
    pub fn vector_group(&self, name: &str) -> Option<&VectorGroup> {
        self.registry.group(name)
    }

    /// How many times the callable of `name` ran, summed over replicas
    pub fn computation_count(&self, name: &str) -> u64 {
        self.keys_of(name).iter().map(|key| self.cache.computations(key)).sum()
    }

    /// Computation count of each key behind `name`, in replica order
    pub fn computation_counts(&self, name: &str) -> Vec<u64> {
        self.keys_of(name).iter().map(|key| self.cache.computations(key)).collect()
    }

    /// Whether `name` holds a valid cached value (every replica, for templates)
    pub fn is_cached(&self, name: &str) -> bool {
        let keys = self.keys_of(name);
        !keys.is_empty() && keys.iter().all(|key| self.cache.is_valid(key))
    }

    /// Cache hit/miss counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Identifier of this session
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The underlying registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The declarations the graph was last built from
    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    fn keys_of(&self, name: &str) -> Vec<NodeKey> {
        match self.registry.node(name) {
            None => Vec::new(),
            Some(node) => match node.class.vector_group().and_then(|g| self.registry.group(g)) {
                Some(group) => (0..group.len())
                    .map(|i| NodeKey::replica(group.name(), i, name))
                    .collect(),
                None => vec![NodeKey::node(name)],
            },
        }
    }
}

impl fmt::Debug for GraphContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphContext")
            .field("session_id", &self.session_id)
            .field("nodes", &self.registry.order())
            .field("cached", &self.cache.len())
            .finish()
    }
}

fn is_pinned(registry: &NodeRegistry, key: &NodeKey) -> bool {
    registry
        .node(key.node_name())
        .map(|node| node.class.is_pinned())
        .unwrap_or(false)
}

/// Build registry, cache and index from declarations
fn build(
    declarations: &Declarations,
    previous: Option<&NodeRegistry>,
) -> Result<(NodeRegistry, NodeCache, DependencyIndex), CoreError> {
    let mut registry = NodeRegistry::with_inputs(&declarations.inputs)?;
    if let Some(previous) = previous {
        registry.carry_values_from(previous);
    }
    for group in &declarations.vector_groups {
        registry.declare_group(group.clone())?;
    }
    register_into(&mut registry, declarations.nodes.clone())?;

    let mut cache = NodeCache::new();
    compute_static(&registry, &mut cache)?;
    let index = DependencyIndex::build(&registry);
    Ok((registry, cache, index))
}

/// Register a batch, routing static declarations through the static factory
fn register_into(
    registry: &mut NodeRegistry,
    declarations: Vec<NodeDeclaration>,
) -> Result<Vec<String>, CoreError> {
    let mut requested_static = Vec::new();
    let declarations = declarations
        .into_iter()
        .map(|declaration| {
            if declaration.class.is_pinned() {
                requested_static.push(declaration.name.clone());
                declaration.with_class(NodeClass::Ordinary)
            } else {
                declaration
            }
        })
        .collect();

    let added = registry.register_batch(declarations)?;
    static_factory::mark_static_all(registry, &requested_static)?;
    Ok(added)
}

/// Compute every static node that has no valid value yet
fn compute_static(registry: &NodeRegistry, cache: &mut NodeCache) -> Result<(), CoreError> {
    let pinned: Vec<&str> = registry
        .nodes()
        .filter(|node| node.class.is_pinned())
        .map(|node| node.name.as_str())
        .collect();
    Evaluator::new(registry, cache).evaluate(&pinned)?;
    Ok(())
}
