//! HTTP API for the Shipment Rating Engine.
//!
//! A thin façade over the calculator and formula service: routing, request
//! parsing, and error mapping live here; every calculation runs through the
//! same core the background workers use.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AccessorialInput, CalculateRequest, ValidateTemplateRequest};
pub use response::{ApiError, ApiErrorResponse, CalculateResponse, ValidateTemplateResponse};
pub use state::AppState;
