//! Accessorial charge resolution.
//!
//! Turns one accessorial attachment into a single charge amount. The
//! resolver is deterministic and does no I/O; percentage charges price off
//! the base freight charge, which is why totals assembly resolves them only
//! after the base charge is known.

use crate::models::{AdditionalCharge, ChargeMethod};
use crate::money::{Money, MoneyResult};

/// Resolves one additional charge against the shipment's base charge.
///
/// - `Flat`: `amount × max(unit, 1)`
/// - `Distance`: `amount × unit`; unit is the billable distance quantum
/// - `Percentage`: `base_charge × amount / 100`; amount is in percentage
///   points, so `10` means ten percent
pub fn resolve_accessorial(charge: &AdditionalCharge, base_charge: Money) -> MoneyResult<Money> {
    match charge.method {
        ChargeMethod::Flat => {
            let units = i64::from(charge.unit.max(1));
            charge.amount.mul(Money::from_int(units))
        }
        ChargeMethod::Distance => charge.amount.mul(Money::from_int(i64::from(charge.unit))),
        ChargeMethod::Percentage => base_charge
            .mul(charge.amount)?
            .div(Money::from_int(100)),
    }
}
