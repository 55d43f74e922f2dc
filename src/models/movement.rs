//! Move model and related types.
//!
//! A move is the unit of work executed by one tractor/trailer assignment.
//! A shipment comprises one or more moves, each owning an ordered list of
//! stops and at most one assignment.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::stop::Stop;

/// The derived progress of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    /// Created, nothing assigned.
    New,
    /// A tractor/trailer assignment exists but no stop has started.
    Assigned,
    /// At least one stop is in transit or completed.
    InTransit,
    /// Every stop is completed.
    Completed,
    /// The move was canceled.
    Canceled,
}

/// The tractor, trailer, and drivers working a move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// The assigned tractor.
    pub tractor_id: Uuid,
    /// The assigned trailer, if any.
    pub trailer_id: Option<Uuid>,
    /// The assigned drivers.
    #[serde(default)]
    pub driver_ids: Vec<Uuid>,
}

/// An ordered child of a shipment executed by one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentMove {
    /// Unique identifier for the move.
    pub id: Uuid,
    /// Position of the move within its shipment, starting at 1.
    pub sequence: u32,
    /// Whether the trailer is loaded for this move.
    pub loaded: bool,
    /// Derived progress; recomputed from stops by the status deriver.
    pub status: MoveStatus,
    /// At most one tractor/trailer assignment.
    pub assignment: Option<Assignment>,
    /// The move's stops, ordered by sequence.
    #[serde(default)]
    pub stops: Vec<Stop>,
}

impl ShipmentMove {
    /// Validates the move's stop list.
    ///
    /// Stop sequences must be dense and strictly increasing from 1, every
    /// planned window must be ordered, and pickup stops must precede
    /// delivery stops.
    pub fn validate(&self) -> EngineResult<()> {
        for (i, stop) in self.stops.iter().enumerate() {
            stop.validate()?;
            let expected = (i + 1) as u32;
            if stop.sequence != expected {
                return Err(EngineError::InvalidShipment {
                    field: format!("moves[{}].stops[{}].sequence", self.sequence, i),
                    message: format!("expected sequence {}, found {}", expected, stop.sequence),
                });
            }
        }

        let last_pickup = self
            .stops
            .iter()
            .rposition(|s| s.stop_type.is_origin());
        let first_delivery = self
            .stops
            .iter()
            .position(|s| s.stop_type.is_destination());
        if let (Some(pickup), Some(delivery)) = (last_pickup, first_delivery) {
            if pickup > delivery {
                return Err(EngineError::InvalidShipment {
                    field: format!("moves[{}].stops", self.sequence),
                    message: "pickup stops must precede delivery stops".to_string(),
                });
            }
        }

        Ok(())
    }
}
