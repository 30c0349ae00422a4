//! One row of results per position of the `a_values` and `c_values`
//! double sliders, plus their sum. The two sliders must span the same
//! number of points.

use dagapp_core::{Declarations, NodeDeclaration, VectorGroupDeclaration};
use serde_json::json;

/// Root input document for this calculator
pub const INPUTS: &str = include_str!("../configs/vectorized.yaml");

/// Node and vector group declarations
pub fn nodes() -> Declarations {
    Declarations::new()
        .vector_group(
            VectorGroupDeclaration::new("results", "a_values", "a", "result")
                .zip_with("c_values", "c"),
        )
        .node(
            NodeDeclaration::new("b", ["a"], |args| Ok(json!(2f64.powf(args.f64("a")?))))
                .in_vector_group("results"),
        )
        .node(
            NodeDeclaration::new("d", ["c"], |args| Ok(json!(10.0 - 5f64.powf(args.f64("c")?))))
                .in_vector_group("results"),
        )
        .node(
            NodeDeclaration::new("result", ["b", "d"], |args| {
                Ok(json!(args.f64("b")? * args.f64("d")?))
            })
            .in_vector_group("results"),
        )
        .node(NodeDeclaration::new("total", ["results"], |args| {
            let mut sum = 0.0;
            for (index, value) in args.list("results")?.iter().enumerate() {
                sum += value.as_f64().ok_or_else(|| {
                    dagapp_core::CoreError::Other(format!("result {} is not a number", index))
                })?;
            }
            Ok(json!(sum))
        }))
}
