//! Stop model and related types.
//!
//! A stop is a pickup or delivery event attached to a move. Stop status is
//! authored by external collaborators (driver apps, EDI feeds); the engine
//! treats it as an input and never recomputes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// The kind of freight event a stop represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopType {
    /// A full pickup at origin.
    Pickup,
    /// A full delivery at destination.
    Delivery,
    /// A partial pickup of a split shipment.
    SplitPickup,
    /// A partial delivery of a split shipment.
    SplitDelivery,
}

impl StopType {
    /// Returns true for origin-side stops (pickups).
    pub fn is_origin(&self) -> bool {
        matches!(self, StopType::Pickup | StopType::SplitPickup)
    }

    /// Returns true for destination-side stops (deliveries).
    pub fn is_destination(&self) -> bool {
        matches!(self, StopType::Delivery | StopType::SplitDelivery)
    }
}

/// The observed progress of a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    /// Created, no work started.
    New,
    /// A unit is en route to or working the stop.
    InTransit,
    /// Arrival and departure are both recorded.
    Completed,
    /// The stop was canceled.
    Canceled,
}

/// A pickup or delivery event attached to a move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Unique identifier for the stop.
    pub id: Uuid,
    /// The kind of freight event.
    #[serde(rename = "type")]
    pub stop_type: StopType,
    /// Observed progress, authored by the caller.
    pub status: StopStatus,
    /// Position of the stop within its move, starting at 1.
    pub sequence: u32,
    /// When the unit is planned to arrive.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub planned_arrival: DateTime<Utc>,
    /// When the unit is planned to depart.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub planned_departure: DateTime<Utc>,
    /// Recorded arrival, if any.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub actual_arrival: Option<DateTime<Utc>>,
    /// Recorded departure, if any.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub actual_departure: Option<DateTime<Utc>>,
}

impl Stop {
    /// Validates the stop's planned window.
    pub fn validate(&self) -> EngineResult<()> {
        if self.planned_arrival > self.planned_departure {
            return Err(EngineError::InvalidShipment {
                field: format!("stops[{}].planned_arrival", self.sequence),
                message: "planned arrival is after planned departure".to_string(),
            });
        }
        Ok(())
    }

    /// Re-opens a completed stop.
    ///
    /// Clears both actual timestamps and resets the status to `New`, which
    /// is the only way a shipment may move back out of a completed state.
    pub fn reopen(&mut self) {
        self.actual_arrival = None;
        self.actual_departure = None;
        self.status = StopStatus::New;
    }
}
