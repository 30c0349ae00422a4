//! Monthly consulting fee, with or without a retainer.

use dagapp_core::{Declarations, NodeDeclaration};
use serde_json::json;

/// Root input document for this calculator
pub const INPUTS: &str = include_str!("../configs/consulting.yaml");

/// Node declarations
pub fn nodes() -> Declarations {
    Declarations::new()
        .node(NodeDeclaration::new(
            "effective_day_rate",
            ["retainer", "ad_hoc_day_rate", "retainer_day_rate"],
            |args| {
                let rate = if args.bool("retainer")? {
                    args.f64("retainer_day_rate")?
                } else {
                    args.f64("ad_hoc_day_rate")?
                };
                Ok(json!(rate))
            },
        ))
        .node(NodeDeclaration::new(
            "base_fee_ex_vat",
            ["effective_day_rate", "committed_days"],
            |args| Ok(json!(args.f64("effective_day_rate")? * args.f64("committed_days")?)),
        ))
        .node(NodeDeclaration::new(
            "flex_fee_ex_vat",
            ["effective_day_rate", "ramp_up_days", "flex_premium_pct"],
            |args| {
                let days = args.f64("ramp_up_days")?;
                Ok(json!(args.f64("effective_day_rate")? * days * args.f64("flex_premium_pct")?))
            },
        ))
        .node(NodeDeclaration::new(
            "subtotal_ex_vat",
            ["base_fee_ex_vat", "flex_fee_ex_vat"],
            |args| Ok(json!(args.f64("base_fee_ex_vat")? + args.f64("flex_fee_ex_vat")?)),
        ))
        .node(NodeDeclaration::new("vat_amount", ["subtotal_ex_vat", "vat_rate"], |args| {
            Ok(json!(args.f64("subtotal_ex_vat")? * args.f64("vat_rate")?))
        }))
        .node(NodeDeclaration::new(
            "total_incl_vat",
            ["subtotal_ex_vat", "vat_amount"],
            |args| Ok(json!(args.f64("subtotal_ex_vat")? + args.f64("vat_amount")?)),
        ))
}
