//! Core data models for the Shipment Rating Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod charge;
mod commodity;
mod hold;
mod movement;
mod shipment;
mod stop;
mod template;

pub use charge::{AccessorialCharge, AdditionalCharge, ChargeMethod};
pub use commodity::{Commodity, ShipmentCommodity};
pub use hold::{HoldSeverity, HoldSource, HoldType, ShipmentHold};
pub use movement::{Assignment, MoveStatus, ShipmentMove};
pub use shipment::{RatingMethod, Shipment, ShipmentStatus};
pub use stop::{Stop, StopStatus, StopType};
pub use template::{
    FormulaTemplate, TemplateExample, TemplateParameter, TemplateVariable, VariableType,
};
