//! Accessorial charge models.
//!
//! An accessorial charge is an additional line fee (fuel, detention, lumper)
//! applied on top of a shipment's base freight charge. Reference records
//! ([`AccessorialCharge`]) carry catalog defaults; [`AdditionalCharge`] is
//! the attachment of one to a shipment.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::money::Money;

/// How an accessorial amount is turned into a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeMethod {
    /// `amount × max(unit, 1)`.
    Flat,
    /// `amount × unit`, where unit is the billable distance quantum.
    Distance,
    /// `base_charge × amount / 100`; amount is in percentage points.
    Percentage,
}

/// A reference (catalog) accessorial charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorialCharge {
    /// Unique identifier for the reference record.
    pub id: Uuid,
    /// Short billing code, e.g. "FUEL".
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// Default pricing method.
    pub method: ChargeMethod,
    /// Default amount.
    pub amount: Money,
    /// Default unit count.
    pub unit: i16,
}

/// An accessorial charge attached to a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalCharge {
    /// Unique identifier for the attachment.
    pub id: Uuid,
    /// The referenced catalog record, when known.
    pub accessorial_charge_id: Option<Uuid>,
    /// The catalog billing code.
    pub code: String,
    /// Pricing method for this attachment.
    pub method: ChargeMethod,
    /// Amount; a rate for Flat/Distance, percentage points for Percentage.
    pub amount: Money,
    /// Unit count; at least 1.
    pub unit: i16,
}

impl AdditionalCharge {
    /// Validates the attachment.
    pub fn validate(&self, index: usize) -> EngineResult<()> {
        if self.unit < 1 {
            return Err(EngineError::InvalidCharge {
                index,
                message: format!("unit must be at least 1, found {}", self.unit),
            });
        }
        Ok(())
    }
}
