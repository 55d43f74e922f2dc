//! The calculator façade.
//!
//! Entry points invoked by handlers and background workers. Each operation
//! stages its results locally and installs them onto the shipment in one
//! assignment, so no error path leaves a partial write behind. The version
//! token bumps only when an installed value actually changed, which keeps
//! every operation idempotent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::formula::FormulaTemplateService;
use crate::models::{ChargeMethod, MoveStatus, Shipment, ShipmentStatus};
use crate::money::{Money, MoneyValue};

use super::accessorial::resolve_accessorial;
use super::base_charge::calculate_base_charge;
use super::commodities::aggregate_commodities;
use super::holds::{Transition, assert_transition_allowed, effective_blocks};
use super::status::{derive_move_status, derive_shipment_status};
use super::timestamps::derive_actual_dates;

/// One resolved accessorial charge, for invoice previews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeLine {
    /// The catalog billing code.
    pub code: String,
    /// The pricing method applied.
    pub method: ChargeMethod,
    /// The attachment's amount input.
    pub amount: Money,
    /// The attachment's unit input.
    pub unit: i16,
    /// The resolved charge.
    pub total: Money,
}

/// Prices shipments and derives their lifecycle state.
pub struct ShipmentCalculator {
    formulas: Arc<FormulaTemplateService>,
}

impl ShipmentCalculator {
    /// Creates a calculator over a formula template service.
    pub fn new(formulas: Arc<FormulaTemplateService>) -> Self {
        Self { formulas }
    }

    /// Returns the formula template service.
    pub fn formulas(&self) -> &FormulaTemplateService {
        &self.formulas
    }

    /// Recomputes commodity counters, the base charge, accessorial charges,
    /// and the grand total, writing them onto the shipment.
    ///
    /// Returns the resolved accessorial lines; their sum is exactly the
    /// shipment's `other_charge_amount`.
    pub fn calculate_totals(
        &self,
        shipment: &mut Shipment,
        actor_id: Uuid,
    ) -> EngineResult<Vec<ChargeLine>> {
        if shipment.is_terminal() {
            return Err(EngineError::InvalidShipment {
                field: "status".to_string(),
                message: format!("cannot price a {:?} shipment", shipment.status),
            });
        }
        shipment.validate()?;

        // Stage everything on a scratch copy; counters must be in place
        // before the base charge dispatch reads them.
        let mut staged = shipment.clone();
        if !staged.commodities.is_empty() {
            let counters = aggregate_commodities(&staged.commodities);
            staged.pieces = counters.pieces;
            staged.weight = counters.weight;
        }

        let base = calculate_base_charge(&staged, actor_id, &self.formulas)?;

        let mut lines = Vec::with_capacity(staged.additional_charges.len());
        let mut additional_total = Money::ZERO;
        for charge in &staged.additional_charges {
            let total = resolve_accessorial(charge, base)?;
            additional_total = additional_total.add(total)?;
            lines.push(ChargeLine {
                code: charge.code.clone(),
                method: charge.method,
                amount: charge.amount,
                unit: charge.unit,
                total,
            });
        }
        let grand_total = base.add(additional_total)?;

        let changed = shipment.pieces != staged.pieces
            || shipment.weight != staged.weight
            || shipment.freight_charge_amount != MoneyValue::Present(base)
            || shipment.other_charge_amount != MoneyValue::Present(additional_total)
            || shipment.total_charge_amount != MoneyValue::Present(grand_total);

        if changed {
            shipment.pieces = staged.pieces;
            shipment.weight = staged.weight;
            shipment.freight_charge_amount = MoneyValue::Present(base);
            shipment.other_charge_amount = MoneyValue::Present(additional_total);
            shipment.total_charge_amount = MoneyValue::Present(grand_total);
            shipment.bump_version();
        }

        Ok(lines)
    }

    /// Derives the shipment's status from its moves and stops.
    ///
    /// Move statuses are derived transiently; only the shipment's own
    /// status field is written. Transitions into transit or completion are
    /// gated by the shipment's effective hold blocks.
    pub fn calculate_status(&self, shipment: &mut Shipment) -> EngineResult<()> {
        let move_statuses: Vec<MoveStatus> = shipment
            .moves
            .iter()
            .map(|m| derive_move_status(&m.stops, m.assignment.is_some()))
            .collect();

        let derived = derive_shipment_status(
            &move_statuses,
            shipment.canceled_at.is_some(),
            shipment.status,
        );

        if derived == shipment.status {
            return Ok(());
        }

        let blocks = effective_blocks(&shipment.holds);
        match derived {
            ShipmentStatus::InTransit if is_pre_transit(shipment.status) => {
                assert_transition_allowed(blocks, Transition::Dispatch)?;
            }
            ShipmentStatus::Completed => {
                assert_transition_allowed(blocks, Transition::Delivery)?;
            }
            _ => {}
        }

        shipment.status = derived;
        shipment.bump_version();
        Ok(())
    }

    /// Derives the actual ship and delivery dates from completed stops.
    pub fn calculate_timestamps(&self, shipment: &mut Shipment) -> EngineResult<()> {
        let dates = derive_actual_dates(&shipment.moves);
        if shipment.actual_ship_date != dates.ship_date
            || shipment.actual_delivery_date != dates.delivery_date
        {
            shipment.actual_ship_date = dates.ship_date;
            shipment.actual_delivery_date = dates.delivery_date;
            shipment.bump_version();
        }
        Ok(())
    }

    /// Moves a completed shipment to ready-to-bill, honoring billing holds.
    pub fn mark_ready_to_bill(&self, shipment: &mut Shipment) -> EngineResult<()> {
        if shipment.status != ShipmentStatus::Completed {
            return Err(EngineError::InvalidShipment {
                field: "status".to_string(),
                message: format!(
                    "only completed shipments can be billed, found {:?}",
                    shipment.status
                ),
            });
        }
        assert_transition_allowed(effective_blocks(&shipment.holds), Transition::Billing)?;
        shipment.status = ShipmentStatus::ReadyToBill;
        shipment.bump_version();
        Ok(())
    }
}

fn is_pre_transit(status: ShipmentStatus) -> bool {
    matches!(
        status,
        ShipmentStatus::New | ShipmentStatus::PartiallyAssigned | ShipmentStatus::Assigned
    )
}
