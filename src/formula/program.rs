//! Compilation of formula templates.

use crate::models::{TemplateParameter, TemplateVariable, VariableType};

use super::CompileError;
use super::ast::Expr;
use super::functions::FunctionLibrary;
use super::parser::parse;
use super::requirements::{DataRequirements, analyze};
use super::typecheck::type_check;
use super::value::type_name;

/// A compiled, type-checked formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// The original source text.
    pub source: String,
    /// The parsed expression.
    pub ast: Expr,
    /// The entity data evaluation will need.
    pub requirements: DataRequirements,
}

/// Compiles an expression against its declared variables and parameters.
///
/// Parsing, type checking, and requirement analysis run here; a successful
/// compile is deterministic and side-effect free. The program must produce
/// a number, since its result is the shipment's base rate.
pub fn compile(
    source: &str,
    variables: &[TemplateVariable],
    parameters: &[TemplateParameter],
    library: &FunctionLibrary,
) -> Result<Program, CompileError> {
    let ast = parse(source)?;
    let result_type = type_check(&ast, variables, parameters, library)?;
    if result_type != VariableType::Number {
        return Err(CompileError::NonNumericResult {
            found: type_name(result_type).to_string(),
        });
    }
    let requirements = analyze(&ast, variables);
    Ok(Program {
        source: source.to_string(),
        ast,
        requirements,
    })
}
