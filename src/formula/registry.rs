//! Variable and parameter resolution.
//!
//! Turns declared template inputs into runtime values: variables resolve
//! against a loaded [`EntityBag`] through their dotted source paths,
//! parameters bind from caller-supplied values checked against declared
//! bounds and option sets. Resolution is total — missing inputs surface as
//! typed errors, never panics.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::loader::EntityBag;
use crate::models::{FormulaTemplate, TemplateParameter, TemplateVariable, VariableType};

use super::EvalError;
use super::value::{Value, coerce_scalar};

/// The root alias variable sources are written against.
const ROOT_ALIAS: &str = "shipment.";

/// The bound inputs a program evaluates over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableContext {
    values: HashMap<String, Value>,
}

impl VariableContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value under a name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Looks up a bound value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Coerces a JSON value to a declared type, naming the input on failure.
///
/// Integers widen to numbers; all other cross-type coercions are rejected.
pub fn coerce(name: &str, value: &JsonValue, ty: VariableType) -> Result<Value, EvalError> {
    coerce_scalar(value, ty).map_err(|message| EvalError::InvalidValue {
        name: name.to_string(),
        message,
    })
}

/// Resolves one declared variable against an entity bag.
///
/// Returns `Ok(None)` when the source yields nothing and no default is
/// declared; the caller decides whether that is fatal. A `[*]` source that
/// maps to numbers resolves to their sum; any other element type is an
/// error.
pub fn resolve_variable(
    variable: &TemplateVariable,
    bag: &EntityBag,
) -> Result<Option<Value>, EvalError> {
    let relative = variable
        .source
        .strip_prefix(ROOT_ALIAS)
        .unwrap_or(&variable.source);

    let raw = match bag.resolve_path(relative) {
        Some(JsonValue::Null) | None => None,
        Some(value) => Some(value),
    };

    match raw {
        Some(JsonValue::Array(items)) => {
            if variable.var_type != VariableType::Number {
                return Err(EvalError::InvalidValue {
                    name: variable.name.clone(),
                    message: format!(
                        "source '{}' yields a list, which only number variables may sum",
                        variable.source
                    ),
                });
            }
            let mut total = Decimal::ZERO;
            for item in &items {
                match coerce(&variable.name, item, VariableType::Number)? {
                    Value::Number(n) => total += n,
                    _ => unreachable!("number coercion yields numbers"),
                }
            }
            Ok(Some(Value::Number(total)))
        }
        Some(scalar) => coerce(&variable.name, &scalar, variable.var_type).map(Some),
        None => match &variable.default {
            Some(default) => coerce(&variable.name, default, variable.var_type).map(Some),
            None => Ok(None),
        },
    }
}

/// Binds caller-supplied parameter values, falling back to defaults.
///
/// Number bounds and option sets are enforced here so an out-of-range
/// binding fails before any arithmetic runs.
pub fn bind_parameters(
    parameters: &[TemplateParameter],
    bindings: &BTreeMap<String, JsonValue>,
) -> Result<Vec<(String, Value)>, EvalError> {
    let mut bound = Vec::with_capacity(parameters.len());

    for parameter in parameters {
        let raw = bindings
            .get(&parameter.name)
            .or(parameter.default.as_ref());

        let Some(raw) = raw else {
            if parameter.required {
                return Err(EvalError::MissingVariable {
                    name: parameter.name.clone(),
                });
            }
            continue;
        };

        if !parameter.options.is_empty() && !parameter.options.contains(raw) {
            return Err(EvalError::ParameterNotAllowed {
                name: parameter.name.clone(),
                value: raw.to_string(),
            });
        }

        let value = coerce(&parameter.name, raw, parameter.par_type)?;

        if let Value::Number(n) = &value {
            let below = parameter.min.is_some_and(|min| *n < min);
            let above = parameter.max.is_some_and(|max| *n > max);
            if below || above {
                return Err(EvalError::ParameterOutOfRange {
                    name: parameter.name.clone(),
                    value: n.to_string(),
                    min: parameter
                        .min
                        .map_or_else(|| "-inf".to_string(), |m| m.to_string()),
                    max: parameter
                        .max
                        .map_or_else(|| "+inf".to_string(), |m| m.to_string()),
                });
            }
        }

        bound.push((parameter.name.clone(), value));
    }

    Ok(bound)
}

/// Builds the full evaluation context for a template.
///
/// Variables resolve from the bag; a required variable with nothing to
/// resolve fails with [`EvalError::MissingVariable`]. Parameters bind from
/// `bindings` with defaults applied.
pub fn build_context(
    template: &FormulaTemplate,
    bag: &EntityBag,
    bindings: &BTreeMap<String, JsonValue>,
) -> Result<VariableContext, EvalError> {
    let mut context = VariableContext::new();

    for variable in &template.variables {
        match resolve_variable(variable, bag)? {
            Some(value) => context.insert(variable.name.clone(), value),
            None if variable.required => {
                return Err(EvalError::MissingVariable {
                    name: variable.name.clone(),
                });
            }
            None => {}
        }
    }

    for (name, value) in bind_parameters(&template.parameters, bindings)? {
        context.insert(name, value);
    }

    Ok(context)
}
