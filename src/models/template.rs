//! Formula template models.
//!
//! A formula template is a user-authored expression plus its declared
//! variables, parameters, and worked examples. Templates are tenant-scoped;
//! at most one template per `(tenant, category)` may be the default.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::money::Money;

/// The declared type of a formula variable or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    /// A decimal number.
    Number,
    /// A text value.
    String,
    /// A boolean.
    Bool,
    /// A calendar date.
    Date,
}

/// A typed input resolved from entity data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVariable {
    /// Identifier used inside the expression.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub var_type: VariableType,
    /// Whether evaluation fails when the source yields nothing.
    pub required: bool,
    /// Value used when the source yields nothing and the variable is
    /// not required.
    pub default: Option<JsonValue>,
    /// Dotted entity path, e.g. `shipment.weight` or
    /// `shipment.commodities[*].pieces`.
    pub source: String,
    /// Paths a computed variable needs loaded before it can be derived.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Whether the variable is computed rather than read directly.
    #[serde(default)]
    pub computed: bool,
}

/// A typed input bound by the caller rather than entity data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameter {
    /// Identifier used inside the expression.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub par_type: VariableType,
    /// Value used when the caller binds nothing.
    pub default: Option<JsonValue>,
    /// Whether a binding (or default) must be present.
    pub required: bool,
    /// Inclusive lower bound for number parameters.
    pub min: Option<rust_decimal::Decimal>,
    /// Inclusive upper bound for number parameters.
    pub max: Option<rust_decimal::Decimal>,
    /// Finite allowed value set; empty means unconstrained.
    #[serde(default)]
    pub options: Vec<JsonValue>,
}

/// A worked example pinned to a template.
///
/// Validation evaluates the template against each example and requires the
/// result to land within `1e-4` of `expected_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExample {
    /// Parameter bindings for the example.
    #[serde(default)]
    pub parameters: BTreeMap<String, JsonValue>,
    /// Shipment data the variables resolve against, as an entity bag.
    pub shipment_data: JsonValue,
    /// The rate the example must produce.
    pub expected_rate: Money,
}

/// A user-authored rating formula with its inputs and worked examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaTemplate {
    /// Unique identifier for the template.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Owning business unit.
    pub business_unit_id: Uuid,
    /// Grouping tag, e.g. "refrigerated".
    pub category: String,
    /// Display name.
    pub name: String,
    /// The expression source text.
    pub expression: String,
    /// Declared entity-sourced inputs.
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
    /// Declared caller-bound inputs.
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
    /// Worked examples checked on save.
    #[serde(default)]
    pub examples: Vec<TemplateExample>,
    /// Lower clamp applied to every evaluated rate.
    pub min_rate: Option<Money>,
    /// Upper clamp applied to every evaluated rate.
    pub max_rate: Option<Money>,
    /// Whether the template may be used for rating.
    pub is_active: bool,
    /// Whether the template is the default for its `(tenant, category)`.
    pub is_default: bool,
    /// Monotonic version; bumped on every update.
    pub version: u32,
}

impl FormulaTemplate {
    /// Creates an active, non-default template with no inputs.
    pub fn new(
        organization_id: Uuid,
        business_unit_id: Uuid,
        category: impl Into<String>,
        name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            business_unit_id,
            category: category.into(),
            name: name.into(),
            expression: expression.into(),
            variables: Vec::new(),
            parameters: Vec::new(),
            examples: Vec::new(),
            min_rate: None,
            max_rate: None,
            is_active: true,
            is_default: false,
            version: 1,
        }
    }

    /// Adds a worked example, builder style.
    pub fn with_example(mut self, example: TemplateExample) -> Self {
        self.examples.push(example);
        self
    }

    /// Looks up a declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&TemplateVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Looks up a declared parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&TemplateParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
