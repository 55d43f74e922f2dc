//! Calculation logic for the Shipment Rating Engine.
//!
//! This module contains the pricing pipeline (commodity aggregation, base
//! charge dispatch, accessorial resolution, totals assembly) and the
//! lifecycle derivations (stop → move → shipment status, actual ship and
//! delivery timestamps, effective hold blocks), plus the
//! [`ShipmentCalculator`] façade handlers and background workers invoke.

mod accessorial;
mod base_charge;
mod calculator;
mod commodities;
mod holds;
mod status;
mod timestamps;

pub use accessorial::resolve_accessorial;
pub use base_charge::calculate_base_charge;
pub use calculator::{ChargeLine, ShipmentCalculator};
pub use commodities::{CommodityTotals, aggregate_commodities};
pub use holds::{EffectiveBlocks, Transition, assert_transition_allowed, effective_blocks};
pub use status::{derive_move_status, derive_shipment_status};
pub use timestamps::{ActualDates, derive_actual_dates};
