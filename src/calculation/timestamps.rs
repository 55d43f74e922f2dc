//! Actual ship and delivery date derivation.
//!
//! Both dates are total functions of the current stop graph; they never
//! read previously derived values, so re-opening a stop naturally unsets
//! them on the next derivation.

use chrono::{DateTime, Utc};

use crate::models::{ShipmentMove, StopStatus};

/// Derived actual ship and delivery timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActualDates {
    /// Minimum actual departure over completed pickup-type stops.
    pub ship_date: Option<DateTime<Utc>>,
    /// Maximum actual arrival over completed delivery-type stops.
    pub delivery_date: Option<DateTime<Utc>>,
}

/// Derives the actual ship and delivery dates from a shipment's moves.
pub fn derive_actual_dates(moves: &[ShipmentMove]) -> ActualDates {
    let completed = moves
        .iter()
        .flat_map(|m| m.stops.iter())
        .filter(|s| s.status == StopStatus::Completed);

    let mut dates = ActualDates::default();
    for stop in completed {
        if stop.stop_type.is_origin() {
            if let Some(departure) = stop.actual_departure {
                dates.ship_date = Some(match dates.ship_date {
                    Some(current) => current.min(departure),
                    None => departure,
                });
            }
        }
        if stop.stop_type.is_destination() {
            if let Some(arrival) = stop.actual_arrival {
                dates.delivery_date = Some(match dates.delivery_date {
                    Some(current) => current.max(arrival),
                    None => arrival,
                });
            }
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::testutil::{make_move, make_stop, ts};
    use crate::models::StopType;

    #[test]
    fn test_no_completed_stops_yields_nothing() {
        let moves = vec![make_move(
            1,
            vec![
                make_stop(StopType::Pickup, StopStatus::InTransit, 1),
                make_stop(StopType::Delivery, StopStatus::New, 2),
            ],
            true,
        )];
        assert_eq!(derive_actual_dates(&moves), ActualDates::default());
    }

    #[test]
    fn test_ship_date_is_min_completed_pickup_departure() {
        let mut early = make_stop(StopType::Pickup, StopStatus::Completed, 1);
        early.actual_departure = Some(ts(1_700_010_000));
        let mut late = make_stop(StopType::SplitPickup, StopStatus::Completed, 2);
        late.actual_departure = Some(ts(1_700_050_000));

        let moves = vec![make_move(1, vec![early, late], true)];
        let dates = derive_actual_dates(&moves);
        assert_eq!(dates.ship_date, Some(ts(1_700_010_000)));
    }

    #[test]
    fn test_delivery_date_is_max_completed_delivery_arrival() {
        let mut first = make_stop(StopType::SplitDelivery, StopStatus::Completed, 1);
        first.actual_arrival = Some(ts(1_700_060_000));
        let mut second = make_stop(StopType::Delivery, StopStatus::Completed, 2);
        second.actual_arrival = Some(ts(1_700_090_000));

        let moves = vec![make_move(1, vec![first, second], true)];
        let dates = derive_actual_dates(&moves);
        assert_eq!(dates.delivery_date, Some(ts(1_700_090_000)));
    }

    #[test]
    fn test_incomplete_delivery_is_ignored() {
        let mut pickup = make_stop(StopType::Pickup, StopStatus::Completed, 1);
        pickup.actual_departure = Some(ts(1_700_010_000));
        let mut delivery = make_stop(StopType::Delivery, StopStatus::InTransit, 2);
        delivery.actual_arrival = Some(ts(1_700_060_000));

        let moves = vec![make_move(1, vec![pickup, delivery], true)];
        let dates = derive_actual_dates(&moves);
        assert_eq!(dates.ship_date, Some(ts(1_700_010_000)));
        assert_eq!(dates.delivery_date, None);
    }

    #[test]
    fn test_spans_multiple_moves() {
        let mut pickup_a = make_stop(StopType::Pickup, StopStatus::Completed, 1);
        pickup_a.actual_departure = Some(ts(1_700_020_000));
        let mut pickup_b = make_stop(StopType::Pickup, StopStatus::Completed, 1);
        pickup_b.actual_departure = Some(ts(1_700_005_000));
        let mut delivery_b = make_stop(StopType::Delivery, StopStatus::Completed, 2);
        delivery_b.actual_arrival = Some(ts(1_700_080_000));

        let moves = vec![
            make_move(1, vec![pickup_a], true),
            make_move(2, vec![pickup_b, delivery_b], true),
        ];
        let dates = derive_actual_dates(&moves);
        assert_eq!(dates.ship_date, Some(ts(1_700_005_000)));
        assert_eq!(dates.delivery_date, Some(ts(1_700_080_000)));
    }

    #[test]
    fn test_reopened_stop_unsets_dates_on_rederivation() {
        let mut delivery = make_stop(StopType::Delivery, StopStatus::Completed, 1);
        delivery.actual_arrival = Some(ts(1_700_080_000));
        let mut moves = vec![make_move(1, vec![delivery], true)];

        assert!(derive_actual_dates(&moves).delivery_date.is_some());

        moves[0].stops[0].reopen();
        assert_eq!(derive_actual_dates(&moves).delivery_date, None);
    }
}
