//! Request types for the Shipment Rating Engine API.
//!
//! This module defines the JSON request structures for the calculation and
//! template-validation endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AccessorialCatalog;
use crate::error::EngineResult;
use crate::models::{AdditionalCharge, ChargeMethod, FormulaTemplate, Shipment};
use crate::money::Money;

/// Request body for the `/shipments/calculate` endpoint.
///
/// Carries the full shipment graph. Accessorial attachments reference the
/// catalog by billing code; a formula-rated shipment may inline the
/// template it prices with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// The shipment graph to price and derive.
    pub shipment: Shipment,
    /// Accessorial attachments by catalog code, with optional overrides.
    ///
    /// When present, these replace the shipment's `additional_charges`.
    #[serde(default)]
    pub accessorials: Vec<AccessorialInput>,
    /// An inline formula template for formula-rated shipments.
    #[serde(default)]
    pub formula_template: Option<FormulaTemplate>,
    /// The user or system performing the calculation.
    pub actor_id: Uuid,
}

/// One accessorial attachment in a calculation request.
///
/// Unset fields fall back to the catalog entry's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessorialInput {
    /// The catalog billing code, e.g. "FUEL".
    pub code: String,
    /// Override for the pricing method.
    #[serde(default)]
    pub method: Option<ChargeMethod>,
    /// Override for the amount.
    #[serde(default)]
    pub amount: Option<Money>,
    /// Override for the unit count.
    #[serde(default)]
    pub unit: Option<i16>,
}

impl AccessorialInput {
    /// Resolves the input into a charge via the catalog.
    pub fn resolve(&self, catalog: &AccessorialCatalog) -> EngineResult<AdditionalCharge> {
        catalog.resolve(&self.code, self.method, self.amount, self.unit)
    }
}

/// Request body for the `/templates/validate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTemplateRequest {
    /// The template to validate.
    pub template: FormulaTemplate,
}
