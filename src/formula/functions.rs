//! The closed function library available to formula expressions.
//!
//! The builtins cover the numeric helpers the language mandates. Callers
//! may register additional pure helpers by name; user expressions can never
//! define functions of their own, which is what guarantees termination.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::VariableType;

use super::EvalError;
use super::value::{Value, type_name};

type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// A named function with a fixed signature.
#[derive(Clone)]
pub struct FunctionDef {
    /// The callable name.
    pub name: String,
    /// Declared parameter types, in order.
    pub params: Vec<VariableType>,
    /// Declared return type.
    pub returns: VariableType,
    func: NativeFn,
}

impl FunctionDef {
    /// Creates a function definition from a native closure.
    pub fn new(
        name: impl Into<String>,
        params: Vec<VariableType>,
        returns: VariableType,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            func: Arc::new(func),
        }
    }

    /// Invokes the function.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// The set of functions an expression may call.
#[derive(Debug, Clone)]
pub struct FunctionLibrary {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionLibrary {
    /// Creates a library holding only the builtin numeric helpers.
    pub fn builtins() -> Self {
        let mut library = FunctionLibrary {
            functions: HashMap::new(),
        };
        use VariableType::Number;

        library.register(FunctionDef::new(
            "min",
            vec![Number, Number],
            Number,
            |args| {
                let (a, b) = (number(args, 0, "min")?, number(args, 1, "min")?);
                Ok(Value::Number(a.min(b)))
            },
        ));
        library.register(FunctionDef::new(
            "max",
            vec![Number, Number],
            Number,
            |args| {
                let (a, b) = (number(args, 0, "max")?, number(args, 1, "max")?);
                Ok(Value::Number(a.max(b)))
            },
        ));
        library.register(FunctionDef::new(
            "round",
            vec![Number, Number],
            Number,
            |args| {
                let x = number(args, 0, "round")?;
                let places = number(args, 1, "round")?;
                let Some(places) = decimal_to_places(places) else {
                    return Err(EvalError::InvalidValue {
                        name: "round".to_string(),
                        message: "second argument must be an integer between 0 and 28".to_string(),
                    });
                };
                Ok(Value::Number(x.round_dp_with_strategy(
                    places,
                    RoundingStrategy::MidpointAwayFromZero,
                )))
            },
        ));
        library.register(FunctionDef::new("floor", vec![Number], Number, |args| {
            Ok(Value::Number(number(args, 0, "floor")?.floor()))
        }));
        library.register(FunctionDef::new("ceil", vec![Number], Number, |args| {
            Ok(Value::Number(number(args, 0, "ceil")?.ceil()))
        }));
        library.register(FunctionDef::new("abs", vec![Number], Number, |args| {
            Ok(Value::Number(number(args, 0, "abs")?.abs()))
        }));
        library.register(FunctionDef::new(
            "clamp",
            vec![Number, Number, Number],
            Number,
            |args| {
                let x = number(args, 0, "clamp")?;
                let lo = number(args, 1, "clamp")?;
                let hi = number(args, 2, "clamp")?;
                if lo > hi {
                    return Err(EvalError::ClampViolation {
                        min: lo.to_string(),
                        max: hi.to_string(),
                    });
                }
                Ok(Value::Number(x.max(lo).min(hi)))
            },
        ));

        library
    }

    /// Registers a helper, replacing any previous definition of the name.
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.clone(), def);
    }

    /// Looks up a function by name.
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }
}

impl Default for FunctionLibrary {
    fn default() -> Self {
        Self::builtins()
    }
}

fn number(args: &[Value], index: usize, function: &str) -> Result<Decimal, EvalError> {
    let value = &args[index];
    value.as_number().ok_or_else(|| EvalError::TypeMismatch {
        expected: "number".to_string(),
        found: type_name(value.value_type()).to_string(),
        trace: format!("{}()", function),
    })
}

fn decimal_to_places(value: Decimal) -> Option<u32> {
    if value.fract() != Decimal::ZERO || value.is_sign_negative() {
        return None;
    }
    let places = u32::try_from(value.trunc().mantissa()).ok()?;
    (places <= 28).then_some(places)
}
