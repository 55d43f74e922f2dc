//! Configuration types for the accessorial charge catalog.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML catalog file.

use serde::Deserialize;
use std::collections::HashMap;

use crate::models::ChargeMethod;
use crate::money::Money;

/// Metadata about the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogMetadata {
    /// A human-readable name for the catalog.
    pub name: String,
    /// The version or effective date of the catalog.
    pub version: String,
}

/// One accessorial charge reference entry.
///
/// Shipments attach accessorials by `code`; fields the attachment leaves
/// unset fall back to these defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessorialEntry {
    /// Human-readable description, e.g. "Fuel surcharge".
    pub description: String,
    /// Default pricing method.
    pub method: ChargeMethod,
    /// Default amount.
    pub amount: Money,
    /// Default unit count.
    pub unit: i16,
}

/// Catalog configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Metadata about the catalog.
    pub catalog: CatalogMetadata,
    /// Map of billing code to entry.
    pub accessorials: HashMap<String, AccessorialEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_deserializes_from_yaml() {
        let yaml = r#"
catalog:
  name: Test catalog
  version: "2026-01-01"
accessorials:
  FUEL:
    description: Fuel surcharge
    method: percentage
    amount: "12.5"
    unit: 1
  DET:
    description: Detention per hour
    method: flat
    amount: "45.0000"
    unit: 1
"#;
        let config: CatalogConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.catalog.name, "Test catalog");
        assert_eq!(config.accessorials.len(), 2);

        let fuel = &config.accessorials["FUEL"];
        assert_eq!(fuel.method, ChargeMethod::Percentage);
        assert_eq!(fuel.amount.to_string(), "12.5000");
    }
}
