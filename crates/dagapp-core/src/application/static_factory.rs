//! Static classification
//!
//! Pinning a node also pins the part of the graph upstream of it, since a
//! fixed value is only meaningful if the nodes feeding it stop changing
//! too. Root inputs are read once, when the node is computed.

use std::collections::BTreeSet;
use tracing::info;

use crate::domain::binding::Binding;
use crate::domain::graph;
use crate::domain::node::NodeClass;
use crate::domain::registry::NodeRegistry;
use crate::CoreError;

/// Pin `name` and its upstream node closure, then any downstream node
/// that reads nothing but pinned nodes
///
/// Returns every node that became static, in registration order. Fails
/// without changing the registry when the node is a vector template,
/// reads a vector element or aggregate, or shares an upstream node with a
/// consumer that would stay unpinned.
pub fn mark_static(registry: &mut NodeRegistry, name: &str) -> Result<Vec<String>, CoreError> {
    mark_static_all(registry, &[name])
}

/// Pin several nodes together
///
/// The upstream closures are joined before the shared-upstream check, so
/// two requested nodes may read the same upstream node as long as every
/// other consumer of it is pinned too.
pub fn mark_static_all<S: AsRef<str>>(
    registry: &mut NodeRegistry,
    names: &[S],
) -> Result<Vec<String>, CoreError> {
    let mut requested = Vec::with_capacity(names.len());
    for name in names.iter().map(AsRef::as_ref) {
        let node = registry
            .node(name)
            .ok_or_else(|| CoreError::UnknownNode(name.to_string()))?;
        if !node.class.is_pinned() && !requested.contains(&name) {
            requested.push(name);
        }
    }
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let before: BTreeSet<String> = registry
        .nodes()
        .filter(|n| n.class.is_pinned())
        .map(|n| n.name.clone())
        .collect();

    let mut closures = Vec::with_capacity(requested.len());
    for name in &requested {
        closures.push((*name, upstream_closure(registry, name)?));
    }
    let closure: BTreeSet<String> = closures.iter().flat_map(|(_, c)| c.iter().cloned()).collect();
    let dependents = graph::dependents_by_name(registry);

    for (name, own) in &closures {
        for member in own.iter().filter(|m| m.as_str() != *name) {
            let consumers = dependents.get(member).into_iter().flatten();
            for consumer in consumers {
                let pinned = registry.node(consumer).map(|n| n.class.is_pinned()).unwrap_or(false);
                if !pinned && !closure.contains(consumer) {
                    return Err(CoreError::invalid_static(
                        *name,
                        format!(
                            "upstream node '{}' also feeds '{}', which is not static",
                            member, consumer
                        ),
                    ));
                }
            }
        }
    }

    for member in &closure {
        registry.set_class(member, NodeClass::Static);
    }

    // Downstream nodes that only read pinned nodes can never change either
    loop {
        let promoted: Vec<String> = registry
            .nodes()
            .filter(|n| n.class == NodeClass::Ordinary)
            .filter(|n| {
                let mut reads_node = false;
                let all_fixed = n.bindings.iter().all(|b| match b {
                    Binding::Node(dep) => {
                        reads_node = true;
                        registry.node(dep).map(|d| d.class.is_pinned()).unwrap_or(false)
                    }
                    Binding::Default(_) => true,
                    _ => false,
                });
                reads_node && all_fixed
            })
            .map(|n| n.name.clone())
            .collect();

        if promoted.is_empty() {
            break;
        }
        for promoted in promoted {
            registry.set_class(&promoted, NodeClass::Static);
        }
    }

    let newly: Vec<String> = registry
        .nodes()
        .filter(|n| n.class.is_pinned() && !before.contains(&n.name))
        .map(|n| n.name.clone())
        .collect();
    info!(nodes = ?requested, pinned = ?newly, "Pinned static nodes");
    Ok(newly)
}

/// `name` and every node it reads transitively, stopping at pinned nodes
fn upstream_closure(registry: &NodeRegistry, name: &str) -> Result<BTreeSet<String>, CoreError> {
    let mut closure = BTreeSet::new();
    let mut stack = vec![name.to_string()];

    while let Some(current) = stack.pop() {
        if closure.contains(&current) {
            continue;
        }
        let node = registry
            .node(&current)
            .ok_or_else(|| CoreError::UnknownNode(current.clone()))?;
        if current != name && node.class.is_pinned() {
            continue;
        }
        if node.class.vector_group().is_some() {
            return Err(CoreError::invalid_static(
                name,
                format!("'{}' is a vector template node", current),
            ));
        }

        for binding in &node.bindings {
            match binding {
                Binding::Node(dep) => stack.push(dep.clone()),
                Binding::Element(_) | Binding::Group(_) => {
                    return Err(CoreError::invalid_static(
                        name,
                        format!("'{}' reads a vector group", current),
                    ))
                }
                _ => {}
            }
        }
        closure.insert(current);
    }

    Ok(closure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::NodeDeclaration;
    use crate::domain::root_input::RootInputSpec;
    use crate::domain::vector::VectorGroupDeclaration;
    use serde_json::json;

    fn constant(name: &str, params: &[&str]) -> NodeDeclaration {
        NodeDeclaration::new(name, params.iter().copied(), |_| Ok(json!(1)))
    }

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::with_inputs(&[
            RootInputSpec::new("r", json!(2)),
            RootInputSpec::new("xs", json!([1, 2])),
        ])
        .unwrap();
        registry
            .declare_group(VectorGroupDeclaration::new("squares", "xs", "x", "square"))
            .unwrap();
        registry
            .register_batch(vec![
                constant("base", &["r"]),
                constant("baseline", &["base"]),
                constant("scaled", &["baseline"]),
                constant("live", &["r", "baseline"]),
                constant("square", &["x"]).in_vector_group("squares"),
                constant("total", &["squares"]),
            ])
            .unwrap();
        registry
    }

    fn class(registry: &NodeRegistry, name: &str) -> NodeClass {
        registry.node(name).unwrap().class.clone()
    }

    #[test]
    fn test_mark_static_pins_upstream_and_downstream() {
        let mut registry = registry();

        let pinned = mark_static(&mut registry, "baseline").unwrap();

        assert_eq!(pinned, vec!["base", "baseline", "scaled"]);
        assert_eq!(class(&registry, "base"), NodeClass::Static);
        // Reads a root input as well, so it keeps tracking changes
        assert_eq!(class(&registry, "live"), NodeClass::Ordinary);

        assert!(mark_static(&mut registry, "baseline").unwrap().is_empty());
    }

    #[test]
    fn test_mark_static_rejects_shared_upstream() {
        let mut registry = registry();

        let err = mark_static(&mut registry, "scaled").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidStaticDeclaration { ref node, .. } if node == "scaled"
        ));
        assert_eq!(class(&registry, "baseline"), NodeClass::Ordinary);
    }

    #[test]
    fn test_mark_static_all_accepts_consumers_sharing_upstream() {
        let mut registry = NodeRegistry::with_inputs(&[RootInputSpec::new("r", json!(2))]).unwrap();
        registry
            .register_batch(vec![
                constant("data", &["r"]),
                constant("metric_a", &["data"]),
                constant("metric_b", &["data"]),
            ])
            .unwrap();

        assert!(mark_static(&mut registry, "metric_a").is_err());
        assert_eq!(class(&registry, "data"), NodeClass::Ordinary);

        let pinned = mark_static_all(&mut registry, &["metric_a", "metric_b"]).unwrap();
        assert_eq!(pinned, vec!["data", "metric_a", "metric_b"]);
    }

    #[test]
    fn test_mark_static_all_still_checks_outside_consumers() {
        let mut registry = registry();

        let err = mark_static_all(&mut registry, &["scaled", "square"]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidStaticDeclaration { ref node, .. } if node == "square"
        ));

        let err = mark_static_all(&mut registry, &["scaled", "baseline"]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidStaticDeclaration { ref node, .. } if node == "scaled"
        ));
        assert_eq!(class(&registry, "base"), NodeClass::Ordinary);
    }

    #[test]
    fn test_mark_static_rejects_vector_nodes() {
        let mut registry = registry();

        assert!(matches!(
            mark_static(&mut registry, "square"),
            Err(CoreError::InvalidStaticDeclaration { .. })
        ));
        assert!(matches!(
            mark_static(&mut registry, "total"),
            Err(CoreError::InvalidStaticDeclaration { .. })
        ));
        assert_eq!(
            mark_static(&mut registry, "ghost").unwrap_err(),
            CoreError::UnknownNode("ghost".to_string())
        );
    }
}
