//! Commodity models.
//!
//! A shipment carries line items ([`ShipmentCommodity`]) that may reference
//! a commodity master record carrying physical attributes used by rating.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// A commodity master record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    /// Unique identifier for the commodity.
    pub id: Uuid,
    /// Display name, e.g. "Palletized electronics".
    pub name: String,
    /// Linear feet of deck space one unit occupies, when known.
    ///
    /// Only commodities declaring this participate in per-linear-foot rating.
    pub linear_feet_per_unit: Option<Decimal>,
    /// Hazardous material reference, if the commodity is regulated.
    pub hazardous_material_id: Option<Uuid>,
}

/// A line item on a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentCommodity {
    /// Unique identifier for the line item.
    pub id: Uuid,
    /// The referenced commodity master record id.
    pub commodity_id: Uuid,
    /// The materialized commodity record, when loaded.
    pub commodity: Option<Commodity>,
    /// Number of handling units; at least 1.
    pub pieces: i64,
    /// Weight per piece in pounds; at least 1.
    pub weight: i64,
}

impl ShipmentCommodity {
    /// Validates the line item's counters.
    pub fn validate(&self, index: usize) -> EngineResult<()> {
        if self.pieces < 1 {
            return Err(EngineError::InvalidShipment {
                field: format!("commodities[{}].pieces", index),
                message: "must be at least 1".to_string(),
            });
        }
        if self.weight < 1 {
            return Err(EngineError::InvalidShipment {
                field: format!("commodities[{}].weight", index),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
