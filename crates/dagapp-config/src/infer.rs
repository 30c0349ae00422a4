//! Default inputs for declaration sets that come without a document

use std::collections::HashSet;

use dagapp_core::{Declarations, RootInputSpec, Value};
use serde_json::json;

/// Parameters that no node, vector group or element placeholder satisfies,
/// with the first default declared for each, in first-use order
pub(crate) fn free_parameters(declarations: &Declarations) -> Vec<(String, Option<Value>)> {
    let mut bound: HashSet<&str> = declarations.nodes.iter().map(|n| n.name.as_str()).collect();
    bound.extend(declarations.vector_groups.iter().map(|g| g.name.as_str()));

    let mut seen = HashSet::new();
    let mut free = Vec::new();
    for node in &declarations.nodes {
        let elements: Vec<&str> = node
            .class
            .vector_group()
            .and_then(|group| declarations.vector_groups.iter().find(|g| g.name == group))
            .map(|g| g.elements().collect())
            .unwrap_or_default();

        for parameter in &node.parameters {
            let name = parameter.name.as_str();
            if bound.contains(name) || elements.contains(&name) || !seen.insert(name) {
                continue;
            }
            free.push((name.to_string(), parameter.default.clone()));
        }
    }

    for (source, _) in declarations.vector_groups.iter().flat_map(|g| g.sources()) {
        if seen.insert(source) {
            free.push((source.to_string(), Some(json!([]))));
        }
    }

    free
}

/// Derive root inputs from the declarations alone
///
/// Every free parameter becomes a root input whose default is the
/// parameter's own default, or 0.0; the kind follows the default. Sources
/// of vector groups default to an empty list.
pub fn infer_inputs(declarations: &Declarations) -> Vec<RootInputSpec> {
    free_parameters(declarations)
        .into_iter()
        .map(|(name, default)| RootInputSpec::new(name, default.unwrap_or_else(|| json!(0.0))))
        .collect()
}
