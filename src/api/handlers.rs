//! HTTP request handlers for the Shipment Rating Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    ChargeLine, EffectiveBlocks, ShipmentCalculator, aggregate_commodities, effective_blocks,
};
use crate::error::EngineResult;
use crate::formula::{FormulaTemplateService, InMemoryTemplateStore};
use crate::loader::{EntityBag, InMemoryLoader};
use crate::models::{FormulaTemplate, Shipment};

use super::request::{CalculateRequest, ValidateTemplateRequest};
use super::response::{ApiError, ApiErrorResponse, CalculateResponse, ValidateTemplateResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/shipments/calculate", post(calculate_handler))
        .route("/templates/validate", post(validate_template_handler))
        .with_state(state)
}

/// Handler for the POST /shipments/calculate endpoint.
///
/// Prices the shipment, derives its status and actual dates, and returns
/// the updated graph with the resolved charge lines.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> impl IntoResponse {
    // Generate correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing shipment calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let CalculateRequest {
        mut shipment,
        accessorials,
        formula_template,
        actor_id,
    } = request;

    // Resolve catalog-coded accessorials before pricing.
    if !accessorials.is_empty() {
        let resolved: EngineResult<Vec<_>> = accessorials
            .iter()
            .map(|input| input.resolve(state.catalog()))
            .collect();
        match resolved {
            Ok(charges) => shipment.additional_charges = charges,
            Err(error) => {
                warn!(
                    correlation_id = %correlation_id,
                    error = %error,
                    "Accessorial resolution failed"
                );
                return error_response(error.into());
            }
        }
    }

    match perform_calculation(&mut shipment, formula_template, actor_id) {
        Ok((charge_lines, blocks)) => {
            info!(
                correlation_id = %correlation_id,
                shipment_id = %shipment.id,
                status = ?shipment.status,
                total = %shipment.total_charge_amount.unwrap_or_zero(),
                "Calculation completed successfully"
            );
            let customer_visible_holds = shipment
                .holds
                .iter()
                .filter(|h| h.is_active() && h.visible_to_customer)
                .cloned()
                .collect();
            let response = CalculateResponse {
                correlation_id,
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                shipment,
                charge_lines,
                effective_blocks: blocks,
                customer_visible_holds,
            };
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(response),
            )
                .into_response()
        }
        Err(error) => {
            warn!(
                correlation_id = %correlation_id,
                error = %error,
                "Calculation failed"
            );
            error_response(error.into())
        }
    }
}

/// Handler for the POST /templates/validate endpoint.
async fn validate_template_handler(
    State(_state): State<AppState>,
    payload: Result<Json<ValidateTemplateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing template validation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let service = ephemeral_formula_service(Arc::new(InMemoryLoader::new()));
    let errors = service.validate(&request.template);

    info!(
        correlation_id = %correlation_id,
        template_id = %request.template.id,
        error_count = errors.len(),
        "Template validation completed"
    );

    let response = ValidateTemplateResponse {
        valid: errors.is_empty(),
        errors,
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(response),
    )
        .into_response()
}

/// Runs the full calculation pipeline over one shipment graph.
///
/// The request's shipment seeds a per-request entity loader so a formula
/// template sees exactly the graph being priced; an inline template is
/// registered in a per-request store.
fn perform_calculation(
    shipment: &mut Shipment,
    formula_template: Option<FormulaTemplate>,
    actor_id: Uuid,
) -> EngineResult<(Vec<ChargeLine>, EffectiveBlocks)> {
    // Counters go in before the bag is seeded so formula variables read
    // the same values the rating branches will.
    if !shipment.commodities.is_empty() {
        let counters = aggregate_commodities(&shipment.commodities);
        shipment.pieces = counters.pieces;
        shipment.weight = counters.weight;
    }

    let loader = Arc::new(InMemoryLoader::new());
    loader.insert(
        "shipment",
        shipment.id.to_string(),
        EntityBag::from_serialize(shipment)?,
    );

    let formulas = ephemeral_formula_service(loader);
    if let Some(template) = formula_template {
        if shipment.formula_template_id.is_none() {
            shipment.formula_template_id = Some(template.id);
        }
        formulas.put_template(template)?;
    }

    let calculator = ShipmentCalculator::new(Arc::new(formulas));
    let charge_lines = calculator.calculate_totals(shipment, actor_id)?;
    calculator.calculate_status(shipment)?;
    calculator.calculate_timestamps(shipment)?;

    Ok((charge_lines, effective_blocks(&shipment.holds)))
}

fn ephemeral_formula_service(loader: Arc<InMemoryLoader>) -> FormulaTemplateService {
    FormulaTemplateService::new(Arc::new(InMemoryTemplateStore::new()), loader)
}

fn json_rejection_response(
    correlation_id: Uuid,
    rejection: JsonRejection,
) -> axum::response::Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}

fn error_response(error: ApiErrorResponse) -> axum::response::Response {
    (
        error.status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error.error),
    )
        .into_response()
}
