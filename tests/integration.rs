//! Comprehensive integration tests for the Shipment Rating Engine.
//!
//! This test suite covers the full pipeline through the HTTP façade:
//! - Flat-rate, per-mile, per-stop, per-pallet, and per-linear-foot rating
//! - Accessorial resolution from the catalog, with overrides
//! - Formula-template rating with clamping
//! - Status and timestamp derivation
//! - Hold evaluation and transition gating
//! - Template validation
//! - Error cases

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use rating_engine::api::{AppState, create_router};
use rating_engine::config::AccessorialCatalog;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_state() -> AppState {
    let catalog =
        AccessorialCatalog::load("./config/accessorials.yaml").expect("Failed to load catalog");
    AppState::new(catalog)
}

fn create_router_for_test() -> Router {
    create_router(create_test_state())
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

fn base_shipment(rating_method: &str, rating_unit: u32) -> Value {
    json!({
        "id": "8f7c0d94-17c2-4b54-9e40-111111111111",
        "organization_id": "8f7c0d94-17c2-4b54-9e40-222222222222",
        "business_unit_id": "8f7c0d94-17c2-4b54-9e40-333333333333",
        "shipment_type_id": "8f7c0d94-17c2-4b54-9e40-444444444444",
        "service_type_id": "8f7c0d94-17c2-4b54-9e40-555555555555",
        "customer_id": "8f7c0d94-17c2-4b54-9e40-666666666666",
        "bol_number": "BOL-1001",
        "rating_method": rating_method,
        "rating_unit": rating_unit,
        "status": "new",
        "version": 1
    })
}

fn calculate_request(shipment: Value) -> Value {
    json!({
        "shipment": shipment,
        "actor_id": "8f7c0d94-17c2-4b54-9e40-999999999999"
    })
}

fn stop(stop_type: &str, status: &str, sequence: u32, base_ts: i64) -> Value {
    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "type": stop_type,
        "status": status,
        "sequence": sequence,
        "planned_arrival": base_ts,
        "planned_departure": base_ts + 1800
    })
}

fn assignment() -> Value {
    json!({
        "tractor_id": uuid::Uuid::new_v4().to_string(),
        "trailer_id": uuid::Uuid::new_v4().to_string(),
        "driver_ids": [uuid::Uuid::new_v4().to_string()]
    })
}

// =============================================================================
// Pricing scenarios
// =============================================================================

#[tokio::test]
async fn test_flat_rate_shipment_no_accessorials() {
    let mut shipment = base_shipment("flat_rate", 1);
    shipment["freight_charge_amount"] = json!("250.0000");

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["shipment"]["freight_charge_amount"], "250.0000");
    assert_eq!(body["shipment"]["other_charge_amount"], "0.0000");
    assert_eq!(body["shipment"]["total_charge_amount"], "250.0000");
    assert!(body["charge_lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_per_mile_with_percentage_accessorial() {
    let mut shipment = base_shipment("per_mile", 500);
    shipment["freight_charge_amount"] = json!("1.2500");

    let mut request = calculate_request(shipment);
    request["accessorials"] = json!([
        {"code": "FUEL", "method": "percentage", "amount": "10", "unit": 1}
    ]);

    let (status, body) = post_json(create_router_for_test(), "/shipments/calculate", request).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["shipment"]["freight_charge_amount"], "625.0000");
    assert_eq!(body["shipment"]["other_charge_amount"], "62.5000");
    assert_eq!(body["shipment"]["total_charge_amount"], "687.5000");

    let lines = body["charge_lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["code"], "FUEL");
    assert_eq!(lines[0]["total"], "62.5000");
}

#[tokio::test]
async fn test_per_pallet_derived_from_commodities() {
    let mut shipment = base_shipment("per_pallet", 25);
    shipment["commodities"] = json!([
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "commodity_id": uuid::Uuid::new_v4().to_string(),
            "commodity": null,
            "pieces": 4,
            "weight": 100
        },
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "commodity_id": uuid::Uuid::new_v4().to_string(),
            "commodity": null,
            "pieces": 6,
            "weight": 50
        }
    ]);

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["shipment"]["pieces"], 10);
    assert_eq!(body["shipment"]["weight"], 700);
    assert_eq!(body["shipment"]["freight_charge_amount"], "250.0000");
    assert_eq!(body["shipment"]["total_charge_amount"], "250.0000");
}

#[tokio::test]
async fn test_per_linear_foot() {
    let commodity_id = uuid::Uuid::new_v4().to_string();
    let mut shipment = base_shipment("per_linear_foot", 5);
    shipment["commodities"] = json!([
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "commodity_id": commodity_id,
            "commodity": {
                "id": commodity_id,
                "name": "Palletized freight",
                "linear_feet_per_unit": "2.5",
                "hazardous_material_id": null
            },
            "pieces": 10,
            "weight": 100
        }
    ]);

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    // (10 × 2.5) / 5 = 5.0000
    assert_eq!(body["shipment"]["freight_charge_amount"], "5.0000");
}

#[tokio::test]
async fn test_catalog_defaults_resolve_accessorials() {
    let mut shipment = base_shipment("flat_rate", 1);
    shipment["freight_charge_amount"] = json!("100.0000");

    let mut request = calculate_request(shipment);
    // DETENTION defaults: flat, 45.0000, unit 1; override unit only.
    request["accessorials"] = json!([{"code": "DETENTION", "unit": 2}]);

    let (status, body) = post_json(create_router_for_test(), "/shipments/calculate", request).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["shipment"]["other_charge_amount"], "90.0000");
    assert_eq!(body["shipment"]["total_charge_amount"], "190.0000");
}

#[tokio::test]
async fn test_unknown_accessorial_code_is_not_found() {
    let mut request = calculate_request(base_shipment("flat_rate", 1));
    request["accessorials"] = json!([{"code": "NOPE"}]);

    let (status, body) = post_json(create_router_for_test(), "/shipments/calculate", request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ACCESSORIAL_NOT_FOUND");
}

#[tokio::test]
async fn test_formula_template_with_clamp() {
    let template_id = uuid::Uuid::new_v4().to_string();
    let mut shipment = base_shipment("formula_template", 1);
    shipment["formula_template_id"] = json!(template_id);
    shipment["commodities"] = json!([
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "commodity_id": uuid::Uuid::new_v4().to_string(),
            "commodity": null,
            "pieces": 5,
            "weight": 100
        }
    ]);

    let mut request = calculate_request(shipment);
    request["formula_template"] = json!({
        "id": template_id,
        "organization_id": "8f7c0d94-17c2-4b54-9e40-222222222222",
        "business_unit_id": "8f7c0d94-17c2-4b54-9e40-333333333333",
        "category": "dry_van",
        "name": "Weight-based",
        "expression": "weight * 0.15",
        "variables": [
            {
                "name": "weight",
                "type": "number",
                "required": true,
                "default": null,
                "source": "shipment.weight"
            }
        ],
        "min_rate": "10.0000",
        "max_rate": "50.0000",
        "is_active": true,
        "is_default": false,
        "version": 1
    });

    let (status, body) = post_json(create_router_for_test(), "/shipments/calculate", request).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    // weight = 500, raw rate 75.0000 clamps to 50.0000.
    assert_eq!(body["shipment"]["weight"], 500);
    assert_eq!(body["shipment"]["freight_charge_amount"], "50.0000");
}

#[tokio::test]
async fn test_total_is_freight_plus_other_exactly() {
    let mut shipment = base_shipment("per_mile", 337);
    shipment["freight_charge_amount"] = json!("1.4300");

    let mut request = calculate_request(shipment);
    request["accessorials"] = json!([
        {"code": "FUEL"},
        {"code": "LUMPER"},
        {"code": "OUTROUTE", "unit": 42}
    ]);

    let (status, body) = post_json(create_router_for_test(), "/shipments/calculate", request).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);

    let freight: rust_decimal::Decimal = body["shipment"]["freight_charge_amount"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let other: rust_decimal::Decimal = body["shipment"]["other_charge_amount"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let total: rust_decimal::Decimal = body["shipment"]["total_charge_amount"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(freight + other, total);

    let lines_sum: rust_decimal::Decimal = body["charge_lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| {
            line["total"]
                .as_str()
                .unwrap()
                .parse::<rust_decimal::Decimal>()
                .unwrap()
        })
        .sum();
    assert_eq!(lines_sum, other);
}

// =============================================================================
// Status and timestamp derivation
// =============================================================================

#[tokio::test]
async fn test_status_derivation_mid_flight() {
    let mut shipment = base_shipment("flat_rate", 1);
    shipment["status"] = json!("in_transit");

    // Move A is the completed origin leg; the delivery rides on move B.
    let mut pickup = stop("pickup", "completed", 1, 1_700_000_000);
    pickup["actual_arrival"] = json!(1_700_000_000);
    pickup["actual_departure"] = json!(1_700_003_600);

    shipment["moves"] = json!([
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "sequence": 1,
            "loaded": true,
            "status": "in_transit",
            "assignment": assignment(),
            "stops": [pickup]
        },
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "sequence": 2,
            "loaded": true,
            "status": "in_transit",
            "assignment": assignment(),
            "stops": [
                stop("pickup", "in_transit", 1, 1_700_060_000),
                stop("delivery", "new", 2, 1_700_100_000)
            ]
        }
    ]);

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["shipment"]["status"], "partially_completed");
    assert_eq!(body["shipment"]["actual_ship_date"], 1_700_003_600i64);
    // No delivery has completed; the date stays unset.
    assert!(body["shipment"]["actual_delivery_date"].is_null());
}

#[tokio::test]
async fn test_all_moves_completed_is_completed() {
    let mut shipment = base_shipment("flat_rate", 1);
    shipment["status"] = json!("in_transit");

    let mut pickup = stop("pickup", "completed", 1, 1_700_000_000);
    pickup["actual_departure"] = json!(1_700_003_600);
    let mut delivery = stop("delivery", "completed", 2, 1_700_040_000);
    delivery["actual_arrival"] = json!(1_700_050_000);

    shipment["moves"] = json!([{
        "id": uuid::Uuid::new_v4().to_string(),
        "sequence": 1,
        "loaded": true,
        "status": "in_transit",
        "assignment": assignment(),
        "stops": [pickup, delivery]
    }]);

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["shipment"]["status"], "completed");
    assert_eq!(body["shipment"]["actual_ship_date"], 1_700_003_600i64);
    assert_eq!(body["shipment"]["actual_delivery_date"], 1_700_050_000i64);
}

// =============================================================================
// Holds
// =============================================================================

#[tokio::test]
async fn test_blocking_hold_on_dispatch_only() {
    let mut shipment = base_shipment("flat_rate", 1);
    shipment["holds"] = json!([
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "type": "compliance",
            "severity": "blocking",
            "source": "rule",
            "blocks_dispatch": true,
            "blocks_delivery": false,
            "blocks_billing": false,
            "visible_to_customer": false,
            "started_at": 1_700_000_000
        },
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "type": "customer",
            "severity": "advisory",
            "source": "user",
            "blocks_dispatch": true,
            "blocks_delivery": true,
            "blocks_billing": true,
            "visible_to_customer": true,
            "started_at": 1_700_000_000
        }
    ]);

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["effective_blocks"]["dispatch"], true);
    assert_eq!(body["effective_blocks"]["delivery"], false);
    assert_eq!(body["effective_blocks"]["billing"], false);
    assert_eq!(body["customer_visible_holds"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dispatch_hold_gates_transition_into_transit() {
    let mut shipment = base_shipment("flat_rate", 1);
    shipment["status"] = json!("assigned");
    shipment["holds"] = json!([{
        "id": uuid::Uuid::new_v4().to_string(),
        "type": "finance",
        "severity": "blocking",
        "source": "rule",
        "blocks_dispatch": true,
        "blocks_delivery": false,
        "blocks_billing": false,
        "visible_to_customer": false,
        "started_at": 1_700_000_000
    }]);
    shipment["moves"] = json!([{
        "id": uuid::Uuid::new_v4().to_string(),
        "sequence": 1,
        "loaded": true,
        "status": "assigned",
        "assignment": assignment(),
        "stops": [
            stop("pickup", "in_transit", 1, 1_700_000_000),
            stop("delivery", "new", 2, 1_700_040_000)
        ]
    }]);

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT, "body: {}", body);
    assert_eq!(body["code"], "DISPATCH_BLOCKED");
}

#[tokio::test]
async fn test_released_hold_does_not_block() {
    let mut shipment = base_shipment("flat_rate", 1);
    shipment["holds"] = json!([{
        "id": uuid::Uuid::new_v4().to_string(),
        "type": "operational",
        "severity": "blocking",
        "source": "api",
        "blocks_dispatch": true,
        "blocks_delivery": true,
        "blocks_billing": true,
        "visible_to_customer": false,
        "started_at": 1_700_000_000,
        "released_at": 1_700_100_000
    }]);

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["effective_blocks"]["dispatch"], false);
    assert_eq!(body["effective_blocks"]["delivery"], false);
    assert_eq!(body["effective_blocks"]["billing"], false);
}

// =============================================================================
// Template validation
// =============================================================================

fn template_body(expression: &str, examples: Value) -> Value {
    json!({
        "template": {
            "id": uuid::Uuid::new_v4().to_string(),
            "organization_id": uuid::Uuid::new_v4().to_string(),
            "business_unit_id": uuid::Uuid::new_v4().to_string(),
            "category": "dry_van",
            "name": "Weight-based",
            "expression": expression,
            "variables": [
                {
                    "name": "weight",
                    "type": "number",
                    "required": true,
                    "default": null,
                    "source": "shipment.weight"
                }
            ],
            "examples": examples,
            "min_rate": null,
            "max_rate": null,
            "is_active": true,
            "is_default": false,
            "version": 1
        }
    })
}

#[tokio::test]
async fn test_validate_template_accepts_worked_example() {
    let body = template_body(
        "weight * 0.15",
        json!([{
            "parameters": {},
            "shipment_data": {"weight": 500},
            "expected_rate": "75.0000"
        }]),
    );

    let (status, response) =
        post_json(create_router_for_test(), "/templates/validate", body).await;

    assert_eq!(status, StatusCode::OK, "body: {}", response);
    assert_eq!(response["valid"], true);
    assert!(response["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_validate_template_reports_compile_error_on_expression() {
    let body = template_body("weight *", json!([]));

    let (status, response) =
        post_json(create_router_for_test(), "/templates/validate", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["valid"], false);
    assert_eq!(response["errors"][0]["field"], "expression");
}

#[tokio::test]
async fn test_validate_template_reports_example_mismatch_by_index() {
    let body = template_body(
        "weight * 0.15",
        json!([
            {
                "parameters": {},
                "shipment_data": {"weight": 500},
                "expected_rate": "75.0000"
            },
            {
                "parameters": {},
                "shipment_data": {"weight": 500},
                "expected_rate": "99.0000"
            }
        ]),
    );

    let (status, response) =
        post_json(create_router_for_test(), "/templates/validate", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["valid"], false);
    assert_eq!(response["errors"][0]["field"], "examples[1]");
}

#[tokio::test]
async fn test_validate_template_rejects_type_mismatch() {
    let body = template_body("weight * 'heavy'", json!([]));

    let (status, response) =
        post_json(create_router_for_test(), "/templates/validate", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["valid"], false);
    assert!(
        response["errors"][0]["message"]
            .as_str()
            .unwrap()
            .contains("type mismatch")
    );
}

// =============================================================================
// Error cases
// =============================================================================

#[tokio::test]
async fn test_zero_rating_unit_is_rejected() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(base_shipment("per_mile", 0)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_SHIPMENT");
}

#[tokio::test]
async fn test_terminal_shipment_rejects_pricing() {
    let mut shipment = base_shipment("flat_rate", 1);
    shipment["status"] = json!("billed");

    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        calculate_request(shipment),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_SHIPMENT");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let response = create_router_for_test()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/shipments/calculate")
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn test_missing_required_field_is_validation_error() {
    let (status, body) = post_json(
        create_router_for_test(),
        "/shipments/calculate",
        json!({"shipment": {"id": "not-enough"}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let code = body["code"].as_str().unwrap();
    assert!(code == "VALIDATION_ERROR" || code == "MALFORMED_JSON");
}

#[tokio::test]
async fn test_pricing_is_idempotent_through_api() {
    let mut shipment = base_shipment("per_pallet", 25);
    shipment["commodities"] = json!([
        {
            "id": uuid::Uuid::new_v4().to_string(),
            "commodity_id": uuid::Uuid::new_v4().to_string(),
            "commodity": null,
            "pieces": 4,
            "weight": 100
        }
    ]);

    let request = calculate_request(shipment);
    let (_, first) = post_json(create_router_for_test(), "/shipments/calculate", request).await;

    // Re-price the already-priced shipment the first call returned.
    let again = json!({
        "shipment": first["shipment"],
        "actor_id": "8f7c0d94-17c2-4b54-9e40-999999999999"
    });
    let (status, second) =
        post_json(create_router_for_test(), "/shipments/calculate", again).await;

    assert_eq!(status, StatusCode::OK, "body: {}", second);
    assert_eq!(first["shipment"], second["shipment"]);
}
