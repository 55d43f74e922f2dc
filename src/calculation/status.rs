//! Status derivation.
//!
//! Set-based, not event-sourced: given the same child observations the
//! outputs are fixed, regardless of the order events arrived. Stop status
//! is an input and is never recomputed here.

use crate::models::{MoveStatus, ShipmentStatus, Stop, StopStatus};

/// Derives a move's status from its stops and assignment.
pub fn derive_move_status(stops: &[Stop], has_assignment: bool) -> MoveStatus {
    let any_canceled = stops.iter().any(|s| s.status == StopStatus::Canceled);
    let any_completed = stops.iter().any(|s| s.status == StopStatus::Completed);
    let any_in_transit = stops.iter().any(|s| s.status == StopStatus::InTransit);
    let all_completed =
        !stops.is_empty() && stops.iter().all(|s| s.status == StopStatus::Completed);

    if any_canceled && !any_completed && !any_in_transit {
        MoveStatus::Canceled
    } else if all_completed {
        MoveStatus::Completed
    } else if any_in_transit || any_completed {
        MoveStatus::InTransit
    } else if has_assignment {
        MoveStatus::Assigned
    } else {
        MoveStatus::New
    }
}

/// Derives a shipment's status from its move statuses.
///
/// `canceled` reflects `canceled_at` and wins outright. `Billed` and
/// `ReadyToBill` are preserved because external systems own those
/// transitions. Everything else follows child progress.
pub fn derive_shipment_status(
    move_statuses: &[MoveStatus],
    canceled: bool,
    current: ShipmentStatus,
) -> ShipmentStatus {
    if canceled {
        return ShipmentStatus::Canceled;
    }
    if matches!(
        current,
        ShipmentStatus::Billed | ShipmentStatus::ReadyToBill
    ) {
        return current;
    }

    let any_completed = move_statuses.iter().any(|s| *s == MoveStatus::Completed);
    let all_completed = !move_statuses.is_empty()
        && move_statuses.iter().all(|s| *s == MoveStatus::Completed);
    let any_in_transit = move_statuses.iter().any(|s| *s == MoveStatus::InTransit);
    let any_assigned = move_statuses.iter().any(|s| *s == MoveStatus::Assigned);
    let all_assigned = !move_statuses.is_empty()
        && move_statuses.iter().all(|s| *s == MoveStatus::Assigned);

    if all_completed {
        ShipmentStatus::Completed
    } else if any_completed {
        ShipmentStatus::PartiallyCompleted
    } else if any_in_transit {
        ShipmentStatus::InTransit
    } else if all_assigned {
        ShipmentStatus::Assigned
    } else if any_assigned {
        ShipmentStatus::PartiallyAssigned
    } else {
        ShipmentStatus::New
    }
}
