//! Hold evaluation.
//!
//! Reduces a shipment's holds to three effective blocks. Only active holds
//! with blocking severity count; informational and advisory holds are
//! surfaced elsewhere and ignored here.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{HoldSeverity, ShipmentHold};

/// The transitions blocking holds can gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Entering transit.
    Dispatch,
    /// Completing delivery.
    Delivery,
    /// Moving to ready-to-bill.
    Billing,
}

/// The effective blocks over a shipment's holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveBlocks {
    /// At least one active blocking hold gates dispatch.
    pub dispatch: bool,
    /// At least one active blocking hold gates delivery.
    pub delivery: bool,
    /// At least one active blocking hold gates billing.
    pub billing: bool,
}

/// Reduces holds to their effective blocks.
pub fn effective_blocks(holds: &[ShipmentHold]) -> EffectiveBlocks {
    let mut blocks = EffectiveBlocks::default();
    for hold in holds {
        if !hold.is_active() || hold.severity != HoldSeverity::Blocking {
            continue;
        }
        blocks.dispatch |= hold.blocks_dispatch;
        blocks.delivery |= hold.blocks_delivery;
        blocks.billing |= hold.blocks_billing;
    }
    blocks
}

/// Fails when the given transition is gated by an effective block.
pub fn assert_transition_allowed(
    blocks: EffectiveBlocks,
    transition: Transition,
) -> EngineResult<()> {
    match transition {
        Transition::Dispatch if blocks.dispatch => Err(EngineError::DispatchBlocked),
        Transition::Delivery if blocks.delivery => Err(EngineError::DeliveryBlocked),
        Transition::Billing if blocks.billing => Err(EngineError::BillingBlocked),
        _ => Ok(()),
    }
}
