//! Static type checking for formula expressions.
//!
//! Runs at compile time so that mixed-type operations surface as
//! [`CompileError::TypeMismatch`] on save rather than as evaluation
//! failures against live shipments.

use std::collections::HashMap;

use crate::models::{TemplateParameter, TemplateVariable, VariableType};

use super::CompileError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions::FunctionLibrary;
use super::value::type_name;

/// Infers the type of an expression against the declared inputs.
pub fn type_check(
    expr: &Expr,
    variables: &[TemplateVariable],
    parameters: &[TemplateParameter],
    library: &FunctionLibrary,
) -> Result<VariableType, CompileError> {
    let mut env: HashMap<&str, VariableType> = HashMap::new();
    for variable in variables {
        env.insert(variable.name.as_str(), variable.var_type);
    }
    for parameter in parameters {
        env.insert(parameter.name.as_str(), parameter.par_type);
    }
    infer(expr, &env, library)
}

fn infer(
    expr: &Expr,
    env: &HashMap<&str, VariableType>,
    library: &FunctionLibrary,
) -> Result<VariableType, CompileError> {
    match expr {
        Expr::Number(_) => Ok(VariableType::Number),
        Expr::Str(_) => Ok(VariableType::String),
        Expr::Bool(_) => Ok(VariableType::Bool),
        Expr::Ident(name) => {
            env.get(name.as_str())
                .copied()
                .ok_or_else(|| CompileError::UnknownIdentifier { name: name.clone() })
        }
        Expr::Unary { op, operand } => {
            let operand_type = infer(operand, env, library)?;
            let expected = match op {
                UnaryOp::Neg => VariableType::Number,
                UnaryOp::Not => VariableType::Bool,
            };
            if operand_type != expected {
                return Err(CompileError::TypeMismatch {
                    expected: type_name(expected).to_string(),
                    found: type_name(operand_type).to_string(),
                    context: expr.to_string(),
                });
            }
            Ok(expected)
        }
        Expr::Binary { op, left, right } => {
            let left_type = infer(left, env, library)?;
            let right_type = infer(right, env, library)?;
            check_binary(*op, left_type, right_type, expr)
        }
        Expr::If {
            cond,
            then,
            otherwise,
        } => {
            let cond_type = infer(cond, env, library)?;
            if cond_type != VariableType::Bool {
                return Err(CompileError::TypeMismatch {
                    expected: "bool".to_string(),
                    found: type_name(cond_type).to_string(),
                    context: cond.to_string(),
                });
            }
            let then_type = infer(then, env, library)?;
            let else_type = infer(otherwise, env, library)?;
            if then_type != else_type {
                return Err(CompileError::TypeMismatch {
                    expected: type_name(then_type).to_string(),
                    found: type_name(else_type).to_string(),
                    context: expr.to_string(),
                });
            }
            Ok(then_type)
        }
        Expr::Call { function, args } => {
            let def = library
                .get(function)
                .ok_or_else(|| CompileError::UnknownFunction {
                    name: function.clone(),
                })?;
            if args.len() != def.params.len() {
                return Err(CompileError::WrongArity {
                    function: function.clone(),
                    expected: def.params.len(),
                    found: args.len(),
                });
            }
            for (arg, expected) in args.iter().zip(def.params.iter()) {
                let arg_type = infer(arg, env, library)?;
                if arg_type != *expected {
                    return Err(CompileError::TypeMismatch {
                        expected: type_name(*expected).to_string(),
                        found: type_name(arg_type).to_string(),
                        context: arg.to_string(),
                    });
                }
            }
            Ok(def.returns)
        }
    }
}

fn check_binary(
    op: BinaryOp,
    left: VariableType,
    right: VariableType,
    expr: &Expr,
) -> Result<VariableType, CompileError> {
    let mismatch = |expected: &str, found: VariableType| CompileError::TypeMismatch {
        expected: expected.to_string(),
        found: type_name(found).to_string(),
        context: expr.to_string(),
    };

    if op.is_arithmetic() {
        if left != VariableType::Number {
            return Err(mismatch("number", left));
        }
        if right != VariableType::Number {
            return Err(mismatch("number", right));
        }
        return Ok(VariableType::Number);
    }

    if op.is_ordering() {
        if left != right {
            return Err(mismatch(type_name(left), right));
        }
        if left == VariableType::Bool {
            return Err(mismatch("number, string, or date", left));
        }
        return Ok(VariableType::Bool);
    }

    if op.is_equality() {
        if left != right {
            return Err(mismatch(type_name(left), right));
        }
        return Ok(VariableType::Bool);
    }

    // Logical.
    if left != VariableType::Bool {
        return Err(mismatch("bool", left));
    }
    if right != VariableType::Bool {
        return Err(mismatch("bool", right));
    }
    Ok(VariableType::Bool)
}
