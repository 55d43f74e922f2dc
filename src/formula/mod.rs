//! Formula template engine.
//!
//! An expression language with typed variables, typed parameters, worked
//! example validation, and data-minimal entity loading. Compilation and
//! evaluation are split into two phases: [`compile`] parses, type-checks,
//! and derives the [`DataRequirements`] the expression needs; [`evaluate`]
//! runs the compiled program over a [`VariableContext`] and produces the
//! numeric base rate consumed by the shipment charge calculator.

mod ast;
mod eval;
mod functions;
mod parser;
mod program;
mod registry;
mod requirements;
mod service;
mod token;
mod typecheck;
mod value;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::evaluate;
pub use functions::{FunctionDef, FunctionLibrary};
pub use program::{Program, compile};
pub use registry::{VariableContext, bind_parameters, build_context, coerce, resolve_variable};
pub use requirements::{DataRequirements, analyze};
pub use service::{FieldError, FormulaTemplateService, InMemoryTemplateStore, TemplateStore};
pub use value::Value;

use thiserror::Error;

/// Errors produced while compiling a formula expression.
///
/// Compilation is deterministic and side-effect free; every error carries
/// enough context to attach to the template's `expression` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The lexer hit a character outside the language surface.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// Byte offset into the source.
        position: usize,
    },

    /// A string literal was never closed.
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A numeric literal could not be parsed as a decimal.
    #[error("invalid number '{text}' at position {position}")]
    InvalidNumber {
        /// The offending literal text.
        text: String,
        /// Byte offset into the source.
        position: usize,
    },

    /// The parser found a token it did not expect.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the grammar required.
        expected: String,
        /// What was found instead.
        found: String,
    },

    /// The source ended mid-expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// An identifier matches no declared variable or parameter.
    #[error("unknown identifier '{name}'")]
    UnknownIdentifier {
        /// The unresolved identifier.
        name: String,
    },

    /// A call names a function outside the closed library.
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// The unresolved function name.
        name: String,
    },

    /// A call passed the wrong number of arguments.
    #[error("function '{function}' takes {expected} argument(s), found {found}")]
    WrongArity {
        /// The function being called.
        function: String,
        /// The declared parameter count.
        expected: usize,
        /// The number of arguments supplied.
        found: usize,
    },

    /// An operand or argument has the wrong type.
    #[error("type mismatch in `{context}`: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operation required.
        expected: String,
        /// What the expression produced.
        found: String,
        /// Source rendering of the offending expression.
        context: String,
    },

    /// The whole expression does not produce a number.
    #[error("expression must produce a number, found {found}")]
    NonNumericResult {
        /// The type the expression produces.
        found: String,
    },
}

/// Errors produced while evaluating a compiled formula.
///
/// Each variant carries a trace: the source rendering of the failing
/// sub-expression or the name of the failing input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A required variable resolved to nothing.
    #[error("missing variable '{name}'")]
    MissingVariable {
        /// The variable or parameter name.
        name: String,
    },

    /// A division had a zero divisor.
    #[error("division by zero in `{trace}`")]
    DivideByZero {
        /// Source rendering of the division.
        trace: String,
    },

    /// An arithmetic operation exceeded the decimal range.
    #[error("numeric overflow in `{trace}`")]
    NumericOverflow {
        /// Source rendering of the operation.
        trace: String,
    },

    /// A value had the wrong runtime type.
    #[error("type mismatch in `{trace}`: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operation required.
        expected: String,
        /// What was found instead.
        found: String,
        /// Source rendering of the operation.
        trace: String,
    },

    /// A parameter binding fell outside its declared bounds.
    #[error("parameter '{name}' value {value} is outside [{min}, {max}]")]
    ParameterOutOfRange {
        /// The parameter name.
        name: String,
        /// The rejected value.
        value: String,
        /// The declared lower bound (or "-inf").
        min: String,
        /// The declared upper bound (or "+inf").
        max: String,
    },

    /// A parameter binding is not in its declared options set.
    #[error("parameter '{name}' value {value} is not an allowed option")]
    ParameterNotAllowed {
        /// The parameter name.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// An input could not be coerced to its declared type.
    #[error("invalid value for '{name}': {message}")]
    InvalidValue {
        /// The variable or parameter name.
        name: String,
        /// Why coercion failed.
        message: String,
    },

    /// The template's clamp range is inverted.
    #[error("clamp range is inverted: min {min} exceeds max {max}")]
    ClampViolation {
        /// The declared minimum rate.
        min: String,
        /// The declared maximum rate.
        max: String,
    },
}
