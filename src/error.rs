//! Error types for the Shipment Rating Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during rating and lifecycle
//! derivation. Formula compilation and evaluation carry their own error
//! enums in [`crate::formula`] and convert into [`EngineError`] here.

use thiserror::Error;
use uuid::Uuid;

use crate::formula::{CompileError, EvalError};
use crate::money::MoneyError;

/// The main error type for the Shipment Rating Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use rating_engine::error::EngineError;
///
/// let error = EngineError::InvalidShipment {
///     field: "rating_unit".to_string(),
///     message: "must be at least 1".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid shipment field 'rating_unit': must be at least 1"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A shipment or one of its children failed input validation.
    #[error("Invalid shipment field '{field}': {message}")]
    InvalidShipment {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// An additional charge was malformed.
    #[error("Invalid additional charge at index {index}: {message}")]
    InvalidCharge {
        /// Position of the charge in the shipment's charge list.
        index: usize,
        /// A description of what made the charge invalid.
        message: String,
    },

    /// No formula template exists with the given id.
    #[error("Formula template not found: {id}")]
    TemplateNotFound {
        /// The template id that was not found.
        id: Uuid,
    },

    /// The formula template exists but has been deactivated.
    #[error("Formula template is inactive: {id}")]
    TemplateInactive {
        /// The inactive template id.
        id: Uuid,
    },

    /// Promoting a template to default would collide with an existing one.
    #[error("A default formula template already exists for category '{category}'")]
    DuplicateDefault {
        /// The category carrying the conflicting default.
        category: String,
    },

    /// The formula expression failed to compile.
    #[error("Formula compile error: {0}")]
    Compile(#[from] CompileError),

    /// The formula expression failed to evaluate.
    #[error("Formula evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// A monetary operation failed.
    #[error("Arithmetic error: {0}")]
    Money(#[from] MoneyError),

    /// An accessorial charge code was not found in the reference catalog.
    #[error("Accessorial charge not found: {code}")]
    AccessorialNotFound {
        /// The unknown accessorial code.
        code: String,
    },

    /// The entity loader found no entity for the given identity.
    #[error("Entity not found: {schema_id}/{entity_id}")]
    EntityNotFound {
        /// The schema the lookup ran against.
        schema_id: String,
        /// The entity id that was not found.
        entity_id: String,
    },

    /// The entity loader failed transiently; the caller may retry.
    #[error("Transient loader failure: {message}")]
    Transient {
        /// A description of the transient failure.
        message: String,
    },

    /// The entity loader reported a permanent schema mismatch.
    #[error("Schema error for '{schema_id}': {message}")]
    Schema {
        /// The schema that mismatched.
        schema_id: String,
        /// A description of the mismatch.
        message: String,
    },

    /// An optimistic concurrency conflict was reported by persistence.
    #[error("Stale version: expected {expected}, found {actual}")]
    StaleVersion {
        /// The version the caller presented.
        expected: u64,
        /// The version currently persisted.
        actual: u64,
    },

    /// A blocking hold prevents dispatching the shipment.
    #[error("Shipment is blocked for dispatch by an active hold")]
    DispatchBlocked,

    /// A blocking hold prevents delivering the shipment.
    #[error("Shipment is blocked for delivery by an active hold")]
    DeliveryBlocked,

    /// A blocking hold prevents billing the shipment.
    #[error("Shipment is blocked for billing by an active hold")]
    BillingBlocked,

    /// A configuration file was missing or unreadable.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// A configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
