//! Evaluation of compiled formula programs.
//!
//! Evaluation is pure, single-threaded per call, and guaranteed to
//! terminate: there are no loops in the language and every call resolves
//! into the closed function library. Errors carry the source rendering of
//! the failing sub-expression as a trace.

use rust_decimal::Decimal;

use super::EvalError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions::FunctionLibrary;
use super::program::Program;
use super::registry::VariableContext;
use super::value::{Value, type_name};

/// Evaluates a compiled program over a bound context.
///
/// The result is the raw decimal rate; clamping to a template's
/// `min_rate`/`max_rate` is the service's job.
pub fn evaluate(
    program: &Program,
    context: &VariableContext,
    library: &FunctionLibrary,
) -> Result<Decimal, EvalError> {
    let value = eval_expr(&program.ast, context, library)?;
    value.as_number().ok_or_else(|| EvalError::TypeMismatch {
        expected: "number".to_string(),
        found: type_name(value.value_type()).to_string(),
        trace: program.source.clone(),
    })
}

fn eval_expr(
    expr: &Expr,
    context: &VariableContext,
    library: &FunctionLibrary,
) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Ident(name) => {
            context
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::MissingVariable { name: name.clone() })
        }
        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, context, library)?;
            match op {
                UnaryOp::Neg => match value {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(type_error("number", &other, expr)),
                },
                UnaryOp::Not => match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    other => Err(type_error("bool", &other, expr)),
                },
            }
        }
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, expr, context, library),
        Expr::If {
            cond,
            then,
            otherwise,
        } => {
            let cond_value = eval_expr(cond, context, library)?;
            match cond_value {
                Value::Bool(true) => eval_expr(then, context, library),
                Value::Bool(false) => eval_expr(otherwise, context, library),
                other => Err(type_error("bool", &other, cond)),
            }
        }
        Expr::Call { function, args } => {
            let def = library
                .get(function)
                .ok_or_else(|| EvalError::MissingVariable {
                    name: function.clone(),
                })?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, context, library)?);
            }
            def.call(&values)
        }
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    whole: &Expr,
    context: &VariableContext,
    library: &FunctionLibrary,
) -> Result<Value, EvalError> {
    // Logical operators short-circuit; everything else is strict.
    if op.is_logical() {
        let left_value = eval_expr(left, context, library)?;
        let Value::Bool(l) = &left_value else {
            return Err(type_error("bool", &left_value, left));
        };
        return match (op, *l) {
            (BinaryOp::And, false) => Ok(Value::Bool(false)),
            (BinaryOp::Or, true) => Ok(Value::Bool(true)),
            _ => {
                let right_value = eval_expr(right, context, library)?;
                match right_value {
                    Value::Bool(r) => Ok(Value::Bool(r)),
                    other => Err(type_error("bool", &other, right)),
                }
            }
        };
    }

    let left_value = eval_expr(left, context, library)?;
    let right_value = eval_expr(right, context, library)?;

    if op.is_arithmetic() {
        let (Value::Number(l), Value::Number(r)) = (&left_value, &right_value) else {
            let offender = if left_value.as_number().is_none() {
                &left_value
            } else {
                &right_value
            };
            return Err(type_error("number", offender, whole));
        };
        let result = match op {
            BinaryOp::Add => l.checked_add(*r),
            BinaryOp::Sub => l.checked_sub(*r),
            BinaryOp::Mul => l.checked_mul(*r),
            BinaryOp::Div => {
                if r.is_zero() {
                    return Err(EvalError::DivideByZero {
                        trace: whole.to_string(),
                    });
                }
                l.checked_div(*r)
            }
            _ => unreachable!("arithmetic op"),
        };
        return result
            .map(Value::Number)
            .ok_or_else(|| EvalError::NumericOverflow {
                trace: whole.to_string(),
            });
    }

    if op.is_equality() {
        let equal = left_value == right_value;
        return Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }));
    }

    // Ordering comparisons over numbers, strings, and dates.
    let ordering = match (&left_value, &right_value) {
        (Value::Number(l), Value::Number(r)) => l.cmp(r),
        (Value::Str(l), Value::Str(r)) => l.cmp(r),
        (Value::Date(l), Value::Date(r)) => l.cmp(r),
        _ => {
            return Err(type_error(
                type_name(left_value.value_type()),
                &right_value,
                whole,
            ));
        }
    };
    let holds = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => unreachable!("ordering op"),
    };
    Ok(Value::Bool(holds))
}

fn type_error(expected: &str, found: &Value, at: &Expr) -> EvalError {
    EvalError::TypeMismatch {
        expected: expected.to_string(),
        found: type_name(found.value_type()).to_string(),
        trace: at.to_string(),
    }
}
