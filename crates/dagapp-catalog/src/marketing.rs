//! Partner marketing: how many partners sign up at a given click price,
//! and what their clicks earn.

use dagapp_core::{Declarations, NodeDeclaration, Parameter};
use serde_json::json;

/// Root input document for this calculator
pub const INPUTS: &str = include_str!("../configs/marketing.yaml");

/// Node declarations
pub fn nodes() -> Declarations {
    Declarations::new()
        .node(NodeDeclaration::new(
            "partners",
            vec![
                Parameter::required("max_partners"),
                Parameter::with_default("cost_per_click", json!(0.2)),
                Parameter::with_default("price_elasticity", json!(120)),
            ],
            |args| {
                let lost = args.f64("cost_per_click")? * args.f64("price_elasticity")?;
                Ok(json!((args.f64("max_partners")? - lost).trunc() as i64))
            },
        ))
        .node(NodeDeclaration::new("clicks", ["partners", "clicks_per_partner"], |args| {
            Ok(json!((args.f64("partners")? * args.f64("clicks_per_partner")?).trunc() as i64))
        }))
        .node(NodeDeclaration::new(
            "revenue",
            vec![
                Parameter::required("clicks"),
                Parameter::with_default("cost_per_click", json!(0.2)),
            ],
            |args| Ok(json!(args.f64("clicks")? * args.f64("cost_per_click")?)),
        ))
}
