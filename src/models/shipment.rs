//! Shipment model and related types.
//!
//! The shipment is the pricing and lifecycle root. Rating inputs live here;
//! the engine writes back the derived charge totals, counters, status, and
//! actual ship/delivery dates, bumping `version` on every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::money::MoneyValue;

use super::charge::AdditionalCharge;
use super::commodity::ShipmentCommodity;
use super::hold::ShipmentHold;
use super::movement::ShipmentMove;

/// The declared pricing strategy for a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingMethod {
    /// The declared freight charge is the base charge.
    FlatRate,
    /// `rating_unit` miles times the declared per-mile rate.
    PerMile,
    /// `rating_unit` times the total stop count across moves.
    PerStop,
    /// `rating_unit` times the shipment weight.
    PerPound,
    /// `rating_unit` times the shipment piece count.
    PerPallet,
    /// Total commodity linear feet divided by `rating_unit`.
    PerLinearFoot,
    /// Legacy alias for PerMile.
    Other,
    /// Delegates the base charge to a formula template.
    FormulaTemplate,
}

/// The derived high-level status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Created; no move has an assignment.
    New,
    /// Some moves are assigned, some are not.
    PartiallyAssigned,
    /// Every move is assigned.
    Assigned,
    /// At least one move is in transit.
    InTransit,
    /// Some moves are completed, some are not.
    PartiallyCompleted,
    /// Every move is completed.
    Completed,
    /// Ready for invoicing; owned by the billing system.
    ReadyToBill,
    /// Invoiced; terminal.
    Billed,
    /// Canceled; terminal.
    Canceled,
    /// Flagged late against its planned windows.
    Delayed,
}

/// The pricing and lifecycle root entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// Unique identifier for the shipment.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Owning business unit.
    pub business_unit_id: Uuid,
    /// The shipment type reference.
    pub shipment_type_id: Uuid,
    /// The service type reference.
    pub service_type_id: Uuid,
    /// The customer being billed.
    pub customer_id: Uuid,
    /// Required tractor type, when constrained.
    pub tractor_type_id: Option<Uuid>,
    /// Required trailer type, when constrained.
    pub trailer_type_id: Option<Uuid>,
    /// Bill of lading number.
    pub bol_number: String,
    /// Carrier tracking number, when assigned.
    pub pro_number: Option<String>,
    /// The declared pricing strategy.
    pub rating_method: RatingMethod,
    /// Method-specific quantity (miles, rate-per-stop, etc.); at least 1.
    pub rating_unit: u32,
    /// The formula template used when rating by formula.
    pub formula_template_id: Option<Uuid>,
    /// Declared rate input for some methods; overwritten with the computed
    /// base charge by the totals assembler.
    #[serde(default)]
    pub freight_charge_amount: MoneyValue,
    /// Sum of resolved accessorial charges; written by the engine.
    #[serde(default)]
    pub other_charge_amount: MoneyValue,
    /// Freight plus accessorials; written by the engine.
    #[serde(default)]
    pub total_charge_amount: MoneyValue,
    /// Derived piece count; equals the sum over commodities.
    #[serde(default)]
    pub pieces: i64,
    /// Derived weight; equals the sum of pieces × weight over commodities.
    #[serde(default)]
    pub weight: i64,
    /// Minimum transport temperature, when controlled.
    pub temperature_min: Option<i32>,
    /// Maximum transport temperature, when controlled.
    pub temperature_max: Option<i32>,
    /// Derived high-level status.
    pub status: ShipmentStatus,
    /// Earliest actual departure over completed pickups.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub actual_ship_date: Option<DateTime<Utc>>,
    /// Latest actual arrival over completed deliveries.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub actual_delivery_date: Option<DateTime<Utc>>,
    /// When the shipment was canceled, if ever.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub canceled_at: Option<DateTime<Utc>>,
    /// Who canceled the shipment.
    pub canceled_by_id: Option<Uuid>,
    /// Why the shipment was canceled.
    pub cancel_reason: Option<String>,
    /// Optimistic concurrency token; strictly increases on every mutation.
    #[serde(default)]
    pub version: u64,
    /// The shipment's moves, ordered by sequence.
    #[serde(default)]
    pub moves: Vec<ShipmentMove>,
    /// The shipment's commodity line items.
    #[serde(default)]
    pub commodities: Vec<ShipmentCommodity>,
    /// Accessorial charges attached to the shipment.
    #[serde(default)]
    pub additional_charges: Vec<AdditionalCharge>,
    /// Holds attached to the shipment.
    #[serde(default)]
    pub holds: Vec<ShipmentHold>,
}

impl Shipment {
    /// Validates the shipment graph against the engine's input invariants.
    pub fn validate(&self) -> EngineResult<()> {
        if self.rating_unit < 1 {
            return Err(EngineError::InvalidShipment {
                field: "rating_unit".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let (Some(min), Some(max)) = (self.temperature_min, self.temperature_max) {
            if min > max {
                return Err(EngineError::InvalidShipment {
                    field: "temperature_min".to_string(),
                    message: format!("{} exceeds temperature_max {}", min, max),
                });
            }
        }
        if self.rating_method == RatingMethod::FormulaTemplate
            && self.formula_template_id.is_none()
        {
            return Err(EngineError::InvalidShipment {
                field: "formula_template_id".to_string(),
                message: "required when rating by formula template".to_string(),
            });
        }
        for m in &self.moves {
            m.validate()?;
        }
        for (i, c) in self.commodities.iter().enumerate() {
            c.validate(i)?;
        }
        for (i, charge) in self.additional_charges.iter().enumerate() {
            charge.validate(i)?;
        }
        Ok(())
    }

    /// A shipment is terminal once canceled or billed; terminal shipments
    /// reject move/stop mutations and pricing recomputation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ShipmentStatus::Canceled | ShipmentStatus::Billed
        )
    }

    /// Cancels the shipment.
    pub fn cancel(
        &mut self,
        actor_id: Uuid,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> EngineResult<()> {
        if self.is_terminal() {
            return Err(EngineError::InvalidShipment {
                field: "status".to_string(),
                message: format!("cannot cancel a {:?} shipment", self.status),
            });
        }
        self.canceled_at = Some(at);
        self.canceled_by_id = Some(actor_id);
        self.cancel_reason = Some(reason.into());
        self.status = ShipmentStatus::Canceled;
        self.bump_version();
        Ok(())
    }

    /// Increments the optimistic concurrency token.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }
}
