//! Base freight charge calculation.
//!
//! Dispatches on the shipment's rating method. The commodity aggregator
//! must have run first: the per-pound and per-pallet branches read the
//! shipment's derived counters.

use tracing::warn;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::formula::FormulaTemplateService;
use crate::models::{RatingMethod, Shipment};
use crate::money::Money;

/// Calculates the base freight charge for a shipment.
///
/// Formula-rated shipments delegate to the template service; an evaluation
/// or compile failure substitutes zero and logs, so downstream totals stay
/// defined while a human investigates. Loader and lookup failures
/// propagate unchanged.
pub fn calculate_base_charge(
    shipment: &Shipment,
    actor_id: Uuid,
    formulas: &FormulaTemplateService,
) -> EngineResult<Money> {
    let declared = shipment.freight_charge_amount.unwrap_or_zero();
    let rating_unit = Money::from_int(i64::from(shipment.rating_unit));

    match shipment.rating_method {
        RatingMethod::FlatRate => Ok(declared),
        // `Other` is a legacy alias for per-mile rating.
        RatingMethod::PerMile | RatingMethod::Other => {
            if declared.is_zero() {
                Ok(Money::ZERO)
            } else {
                Ok(rating_unit.mul(declared)?)
            }
        }
        RatingMethod::PerStop => {
            let stops: i64 = shipment.moves.iter().map(|m| m.stops.len() as i64).sum();
            Ok(rating_unit.mul(Money::from_int(stops))?)
        }
        RatingMethod::PerPound => {
            if shipment.weight > 0 {
                Ok(rating_unit.mul(Money::from_int(shipment.weight))?)
            } else {
                Ok(Money::ZERO)
            }
        }
        RatingMethod::PerPallet => {
            if shipment.pieces > 0 {
                Ok(rating_unit.mul(Money::from_int(shipment.pieces))?)
            } else {
                Ok(Money::ZERO)
            }
        }
        RatingMethod::PerLinearFoot => {
            let mut total_feet = Money::ZERO;
            for line in &shipment.commodities {
                let feet_per_unit = line
                    .commodity
                    .as_ref()
                    .and_then(|c| c.linear_feet_per_unit);
                if let Some(feet) = feet_per_unit {
                    let line_feet = Money::from_int(line.pieces).mul(Money::new(feet))?;
                    total_feet = total_feet.add(line_feet)?;
                }
            }
            if total_feet.is_zero() {
                Ok(Money::ZERO)
            } else {
                // rating_unit >= 1 is enforced on validation.
                Ok(total_feet.div(rating_unit)?)
            }
        }
        RatingMethod::FormulaTemplate => {
            let template_id =
                shipment
                    .formula_template_id
                    .ok_or_else(|| EngineError::InvalidShipment {
                        field: "formula_template_id".to_string(),
                        message: "required when rating by formula template".to_string(),
                    })?;
            match formulas.calculate_shipment_rate(template_id, shipment, actor_id) {
                Ok(rate) => Ok(rate),
                Err(error @ (EngineError::Eval(_) | EngineError::Compile(_))) => {
                    warn!(
                        shipment_id = %shipment.id,
                        template_id = %template_id,
                        error = %error,
                        "formula evaluation failed; substituting zero base charge"
                    );
                    Ok(Money::ZERO)
                }
                Err(other) => Err(other),
            }
        }
    }
}
