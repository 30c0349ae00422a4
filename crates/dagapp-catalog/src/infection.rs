//! Vaccination and infection: expected deaths in a population given the
//! share vaccinated.
//!
//! The reproduction rate `r` is pinned, so changing the exposure inputs
//! only shows up after a reload.

use dagapp_core::{CoreError, Declarations, NodeDeclaration};
use serde_json::json;

/// Root input document for this calculator
pub const INPUTS: &str = include_str!("../configs/infection.yaml");

/// Weight applied to a rate when a share `vax` of people is vaccinated
fn vax_factor(vax: f64, factor: f64) -> Result<f64, CoreError> {
    if !(0.0..=1.0).contains(&vax) {
        return Err(CoreError::Other(format!("vax should be between 0 and 1, was {}", vax)));
    }
    Ok(vax * factor + (1.0 - vax))
}

/// Node declarations
pub fn nodes() -> Declarations {
    Declarations::new()
        .node(
            NodeDeclaration::new("r", ["exposed", "infect_if_expose"], |args| {
                Ok(json!(args.f64("exposed")? * args.f64("infect_if_expose")?))
            })
            .pinned(),
        )
        .node(NodeDeclaration::new("infected", ["r", "vax", "infection_vax_factor"], |args| {
            let factor = vax_factor(args.f64("vax")?, args.f64("infection_vax_factor")?)?;
            Ok(json!(args.f64("r")? * factor))
        }))
        .node(NodeDeclaration::new(
            "die",
            ["infected", "die_if_infected", "vax", "death_vax_factor"],
            |args| {
                let factor = vax_factor(args.f64("vax")?, args.f64("death_vax_factor")?)?;
                Ok(json!(args.f64("infected")? * args.f64("die_if_infected")? * factor))
            },
        ))
        .node(NodeDeclaration::new("death_toll", ["die", "population"], |args| {
            Ok(json!((args.f64("die")? * args.f64("population")?).trunc() as i64))
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vax_factor() {
        assert_eq!(vax_factor(0.0, 0.15).unwrap(), 1.0);
        assert_eq!(vax_factor(1.0, 0.15).unwrap(), 0.15);
        assert!(vax_factor(1.5, 0.15).is_err());
    }
}
