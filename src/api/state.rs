//! Application state for the Shipment Rating Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::AccessorialCatalog;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers, such as
/// the accessorial charge reference catalog. Shipment data and inline
/// formula templates arrive per-request; only reference data lives here.
#[derive(Clone)]
pub struct AppState {
    /// The loaded accessorial catalog.
    catalog: Arc<AccessorialCatalog>,
}

impl AppState {
    /// Creates a new application state with the given catalog.
    pub fn new(catalog: AccessorialCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Returns a reference to the accessorial catalog.
    pub fn catalog(&self) -> &AccessorialCatalog {
        &self.catalog
    }
}
