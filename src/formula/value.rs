//! Runtime values for the formula engine.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::models::VariableType;

/// A typed runtime value.
///
/// All numeric work runs in decimal; there is no float anywhere in the
/// evaluation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A decimal number.
    Number(Decimal),
    /// A text value.
    Str(String),
    /// A boolean.
    Bool(bool),
    /// A calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Returns the declared type this value inhabits.
    pub fn value_type(&self) -> VariableType {
        match self {
            Value::Number(_) => VariableType::Number,
            Value::Str(_) => VariableType::String,
            Value::Bool(_) => VariableType::Bool,
            Value::Date(_) => VariableType::Date,
        }
    }

    /// Returns the number, or `None` for any other type.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean, or `None` for any other type.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "'{}'", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d),
        }
    }
}

/// Renders a [`VariableType`] for error messages.
pub(crate) fn type_name(ty: VariableType) -> &'static str {
    match ty {
        VariableType::Number => "number",
        VariableType::String => "string",
        VariableType::Bool => "bool",
        VariableType::Date => "date",
    }
}

/// Coerces a JSON scalar to a declared type.
///
/// Integers widen to numbers; everything else must match exactly. Dates are
/// ISO `YYYY-MM-DD` strings. Returns a human-readable message on failure.
pub(crate) fn coerce_scalar(value: &JsonValue, ty: VariableType) -> Result<Value, String> {
    match ty {
        VariableType::Number => match value {
            JsonValue::Number(n) => {
                // Route through the string form so 64-bit integers and
                // JSON floats both land exactly on a decimal.
                n.to_string()
                    .parse::<Decimal>()
                    .map(Value::Number)
                    .map_err(|e| format!("not a decimal number: {}", e))
            }
            JsonValue::String(s) => s
                .parse::<Decimal>()
                .map(Value::Number)
                .map_err(|_| format!("'{}' is not a decimal number", s)),
            other => Err(format!("expected a number, found {}", json_kind(other))),
        },
        VariableType::String => match value {
            JsonValue::String(s) => Ok(Value::Str(s.clone())),
            other => Err(format!("expected a string, found {}", json_kind(other))),
        },
        VariableType::Bool => match value {
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(format!("expected a bool, found {}", json_kind(other))),
        },
        VariableType::Date => match value {
            JsonValue::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| format!("'{}' is not a YYYY-MM-DD date", s)),
            other => Err(format!("expected a date string, found {}", json_kind(other))),
        },
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a bool",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
