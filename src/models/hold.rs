//! Shipment hold models.
//!
//! A hold flags a shipment without deleting it. Blocking holds can gate
//! dispatch, delivery, or billing; informational and advisory holds are
//! recorded and surfaced but never block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The business area that raised the hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldType {
    /// Day-to-day operations issue.
    Operational,
    /// Regulatory or safety compliance issue.
    Compliance,
    /// Raised on behalf of the customer.
    Customer,
    /// Credit or billing issue.
    Finance,
}

/// How severe the hold is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldSeverity {
    /// Informational only.
    Info,
    /// Worth surfacing, but never blocks.
    Advisory,
    /// May block dispatch, delivery, or billing.
    Blocking,
}

/// Where the hold originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldSource {
    /// Placed by a user.
    User,
    /// Raised by a workflow rule.
    Rule,
    /// Created through the public API.
    Api,
    /// Raised by an ELD integration.
    Eld,
    /// Raised by an EDI integration.
    Edi,
}

/// A hold attached to a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentHold {
    /// Unique identifier for the hold.
    pub id: Uuid,
    /// The business area that raised the hold.
    #[serde(rename = "type")]
    pub hold_type: HoldType,
    /// How severe the hold is.
    pub severity: HoldSeverity,
    /// Where the hold originated.
    pub source: HoldSource,
    /// Whether the hold gates dispatch.
    pub blocks_dispatch: bool,
    /// Whether the hold gates delivery.
    pub blocks_delivery: bool,
    /// Whether the hold gates billing.
    pub blocks_billing: bool,
    /// Whether the hold is surfaced to the customer portal.
    pub visible_to_customer: bool,
    /// When the hold was placed.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: DateTime<Utc>,
    /// When the hold was released; active while unset.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub released_at: Option<DateTime<Utc>>,
}

impl ShipmentHold {
    /// A hold is active while it has not been released.
    pub fn is_active(&self) -> bool {
        self.released_at.is_none()
    }

    /// Releases the hold at the given instant.
    ///
    /// Releasing an already-released hold keeps the original release time.
    pub fn release(&mut self, at: DateTime<Utc>) {
        if self.released_at.is_none() {
            self.released_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn make_hold() -> ShipmentHold {
        ShipmentHold {
            id: Uuid::new_v4(),
            hold_type: HoldType::Compliance,
            severity: HoldSeverity::Blocking,
            source: HoldSource::Rule,
            blocks_dispatch: true,
            blocks_delivery: false,
            blocks_billing: false,
            visible_to_customer: false,
            started_at: ts(1_700_000_000),
            released_at: None,
        }
    }

    #[test]
    fn test_hold_is_active_until_released() {
        let mut hold = make_hold();
        assert!(hold.is_active());

        hold.release(ts(1_700_100_000));
        assert!(!hold.is_active());
        assert_eq!(hold.released_at, Some(ts(1_700_100_000)));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut hold = make_hold();
        hold.release(ts(1_700_100_000));
        hold.release(ts(1_700_200_000));
        assert_eq!(hold.released_at, Some(ts(1_700_100_000)));
    }

    #[test]
    fn test_hold_serde_uses_type_key_and_unix_seconds() {
        let hold = make_hold();
        let json = serde_json::to_value(&hold).unwrap();
        assert_eq!(json["type"], "compliance");
        assert_eq!(json["severity"], "blocking");
        assert_eq!(json["source"], "rule");
        assert_eq!(json["started_at"], 1_700_000_000i64);
        assert!(json["released_at"].is_null());
    }
}
