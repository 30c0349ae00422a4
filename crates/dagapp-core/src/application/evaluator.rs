use tracing::debug;

use crate::domain::binding::Binding;
use crate::domain::cache::NodeCache;
use crate::domain::node::NodeKey;
use crate::domain::registry::NodeRegistry;
use crate::types::{Args, Value};
use crate::CoreError;

/// Depth-first, pull-based evaluator
///
/// Each request computes only the sub-graph upstream of the requested
/// names, reusing every valid cache slot it meets. A value is stored only
/// after its callable succeeded, so a failure leaves the cache as it was
/// for the failing node and everything downstream of it.
pub struct Evaluator<'a> {
    registry: &'a NodeRegistry,
    cache: &'a mut NodeCache,
    visiting: Vec<NodeKey>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over a registry and its cache
    pub fn new(registry: &'a NodeRegistry, cache: &'a mut NodeCache) -> Self {
        Self {
            registry,
            cache,
            visiting: Vec::new(),
        }
    }

    /// Evaluate several names, returning values in request order
    pub fn evaluate<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Value>, CoreError> {
        names.iter().map(|name| self.resolve_name(name.as_ref())).collect()
    }

    /// Value of a node, root input, vector group or template node by name
    ///
    /// A vector group yields its aggregate; a template node yields the
    /// array of its replica values.
    pub fn resolve_name(&mut self, name: &str) -> Result<Value, CoreError> {
        let registry = self.registry;

        if let Some(node) = registry.node(name) {
            return match node.class.vector_group().and_then(|g| registry.group(g)) {
                Some(group) => {
                    group.check_aligned()?;
                    let keys: Vec<NodeKey> = (0..group.len())
                        .map(|i| NodeKey::replica(group.name(), i, name))
                        .collect();
                    self.resolve_all(&keys)
                }
                None => self.resolve(&NodeKey::node(name)),
            };
        }

        if let Some(root) = registry.root(name) {
            return Ok(root.value.clone());
        }

        if let Some(group) = registry.group(name) {
            group.check_aligned()?;
            return self.resolve_all(&group.output_keys());
        }

        Err(CoreError::UnknownNode(name.to_string()))
    }

    fn resolve_all(&mut self, keys: &[NodeKey]) -> Result<Value, CoreError> {
        let values = keys.iter().map(|key| self.resolve(key)).collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(values))
    }

    /// Value behind one cache key, computing it and its dependencies as needed
    pub fn resolve(&mut self, key: &NodeKey) -> Result<Value, CoreError> {
        if let Some(value) = self.cache.lookup(key) {
            debug!(node = %key, "Cache hit");
            return Ok(value);
        }

        if let Some(start) = self.visiting.iter().position(|k| k == key) {
            let mut cycle: Vec<String> =
                self.visiting[start..].iter().map(ToString::to_string).collect();
            cycle.push(key.to_string());
            return Err(CoreError::CyclicDependency { cycle });
        }

        debug!(node = %key, "Cache miss");
        self.visiting.push(key.clone());
        let result = self.compute(key);
        self.visiting.pop();

        let value = result?;
        self.cache.store(key.clone(), value.clone());
        Ok(value)
    }

    fn compute(&mut self, key: &NodeKey) -> Result<Value, CoreError> {
        let registry = self.registry;
        let node = registry
            .node(key.node_name())
            .ok_or_else(|| CoreError::UnknownNode(key.node_name().to_string()))?;

        let replica = match key {
            NodeKey::Replica { group, index, .. } => registry.group(group).map(|g| (g, *index)),
            NodeKey::Node(_) => None,
        };

        let mut args = Args::new();
        for (parameter, binding) in node.bound_parameters() {
            let value = match binding {
                Binding::Root(name) => registry
                    .root(name)
                    .map(|r| r.value.clone())
                    .ok_or_else(|| CoreError::UnknownRootInput(name.clone()))?,
                Binding::Node(dep) => {
                    let dep_key = match replica {
                        Some((group, index)) if group.is_template(dep) => {
                            NodeKey::replica(group.name(), index, dep.clone())
                        }
                        _ => NodeKey::node(dep.clone()),
                    };
                    if registry.node(dep).is_none() {
                        return Err(CoreError::unresolved(node.name.clone(), dep.clone()));
                    }
                    self.resolve(&dep_key)?
                }
                Binding::Element(element) => replica
                    .and_then(|(group, index)| group.element_named(index, element).cloned())
                    .ok_or_else(|| {
                        CoreError::unresolved(node.name.clone(), parameter.name.clone())
                    })?,
                Binding::Group(name) => {
                    let group = registry
                        .group(name)
                        .ok_or_else(|| CoreError::unresolved(node.name.clone(), name.clone()))?;
                    group.check_aligned()?;
                    self.resolve_all(&group.output_keys())?
                }
                Binding::Default(value) => value.clone(),
                Binding::Unresolved(name) => {
                    return Err(CoreError::unresolved(node.name.clone(), name.clone()))
                }
            };
            args.push(parameter.name.clone(), value);
        }

        node.call(&args).map_err(|err| match err {
            CoreError::ComputationFailed { .. } => err,
            other => CoreError::ComputationFailed {
                node: key.to_string(),
                message: other.to_string(),
            },
        })
    }
}
