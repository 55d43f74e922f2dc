//! Response types for the Shipment Rating Engine API.
//!
//! This module defines the success envelope, the error response
//! structures, and the mapping from engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::{ChargeLine, EffectiveBlocks};
use crate::error::EngineError;
use crate::formula::FieldError;
use crate::models::{Shipment, ShipmentHold};

/// Response body for the `/shipments/calculate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResponse {
    /// Correlation id for request tracking.
    pub correlation_id: Uuid,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The shipment with derived charges, counters, status, and dates.
    pub shipment: Shipment,
    /// The resolved accessorial lines; sums to `other_charge_amount`.
    pub charge_lines: Vec<ChargeLine>,
    /// Effective blocks over the shipment's holds.
    pub effective_blocks: EffectiveBlocks,
    /// Active holds surfaced to the customer portal.
    pub customer_visible_holds: Vec<ShipmentHold>,
}

/// Response body for the `/templates/validate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTemplateResponse {
    /// True when no field errors were found.
    pub valid: bool,
    /// Every problem found, attached to its field.
    pub errors: Vec<FieldError>,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::InvalidShipment { field, message } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "INVALID_SHIPMENT",
                    format!("Invalid shipment field '{}': {}", field, message),
                    "The shipment data contains invalid information",
                ),
            },
            EngineError::InvalidCharge { index, message } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "INVALID_CHARGE",
                    format!("Invalid additional charge at index {}: {}", index, message),
                    "The accessorial charge data contains invalid information",
                ),
            },
            EngineError::TemplateNotFound { id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "TEMPLATE_NOT_FOUND",
                    format!("Formula template not found: {}", id),
                ),
            },
            EngineError::TemplateInactive { id } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    "TEMPLATE_INACTIVE",
                    format!("Formula template is inactive: {}", id),
                ),
            },
            EngineError::DuplicateDefault { category } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    "DUPLICATE_DEFAULT",
                    format!(
                        "A default formula template already exists for category '{}'",
                        category
                    ),
                ),
            },
            EngineError::Compile(error) => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "COMPILE_ERROR",
                    "Formula expression failed to compile",
                    error.to_string(),
                ),
            },
            EngineError::Eval(error) => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "EVALUATION_ERROR",
                    "Formula evaluation failed",
                    error.to_string(),
                ),
            },
            EngineError::Money(error) => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "ARITHMETIC_ERROR",
                    "Monetary arithmetic failed",
                    error.to_string(),
                ),
            },
            EngineError::AccessorialNotFound { code } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "ACCESSORIAL_NOT_FOUND",
                    format!("Accessorial charge not found: {}", code),
                ),
            },
            EngineError::EntityNotFound {
                schema_id,
                entity_id,
            } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "ENTITY_NOT_FOUND",
                    format!("Entity not found: {}/{}", schema_id, entity_id),
                ),
            },
            EngineError::Transient { message } => ApiErrorResponse {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: ApiError::with_details(
                    "TRANSIENT_ERROR",
                    "A transient failure occurred; retry with backoff",
                    message,
                ),
            },
            EngineError::Schema { schema_id, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "SCHEMA_ERROR",
                    format!("Schema error for '{}'", schema_id),
                    message,
                ),
            },
            EngineError::StaleVersion { expected, actual } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    "STALE_VERSION",
                    format!("Stale version: expected {}, found {}", expected, actual),
                ),
            },
            EngineError::DispatchBlocked => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    "DISPATCH_BLOCKED",
                    "Shipment is blocked for dispatch by an active hold",
                ),
            },
            EngineError::DeliveryBlocked => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    "DELIVERY_BLOCKED",
                    "Shipment is blocked for delivery by an active hold",
                ),
            },
            EngineError::BillingBlocked => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    "BILLING_BLOCKED",
                    "Shipment is blocked for billing by an active hold",
                ),
            },
            EngineError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            },
            EngineError::ConfigParseError { path, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration parse error",
                    format!("Failed to parse {}: {}", path, message),
                ),
            },
        }
    }
}
