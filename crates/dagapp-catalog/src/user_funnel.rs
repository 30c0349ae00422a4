//! Paid acquisition funnel: clicks bought at a price, and the profit left
//! after paying for them.

use dagapp_core::{Declarations, NodeDeclaration};
use serde_json::json;

/// Root input document for this calculator
pub const INPUTS: &str = include_str!("../configs/user_funnel.yaml");

/// Node declarations
pub fn nodes() -> Declarations {
    Declarations::new()
        .node(NodeDeclaration::new("user_clicks", ["a", "b", "cost_per_click"], |args| {
            Ok(json!(args.f64("a")? * args.f64("b")?.powf(args.f64("cost_per_click")?)))
        }))
        .node(NodeDeclaration::new("rev", ["user_clicks", "revenue_per_click"], |args| {
            Ok(json!(args.f64("user_clicks")? * args.f64("revenue_per_click")?))
        }))
        .node(NodeDeclaration::new("cost", ["user_clicks", "cost_per_click"], |args| {
            Ok(json!(args.f64("cost_per_click")? * args.f64("user_clicks")?))
        }))
        .node(NodeDeclaration::new("profit", ["cost", "rev"], |args| {
            Ok(json!(args.f64("rev")? - args.f64("cost")?))
        }))
}
