//! Accessorial catalog loading.
//!
//! Loads the accessorial charge reference catalog from a YAML file and
//! resolves catalog codes to their defaults.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{AccessorialCharge, AdditionalCharge, ChargeMethod};
use crate::money::Money;

use super::types::CatalogConfig;

/// Loads and provides access to the accessorial charge catalog.
///
/// File entries are materialized into [`AccessorialCharge`] reference
/// records; ids are minted at load time and stay stable for the life of
/// the catalog.
///
/// # Example
///
/// ```no_run
/// use rating_engine::config::AccessorialCatalog;
///
/// let catalog = AccessorialCatalog::load("./config/accessorials.yaml").unwrap();
/// let fuel = catalog.get("FUEL").unwrap();
/// println!("{}: {}", fuel.description, fuel.amount);
/// ```
#[derive(Debug, Clone)]
pub struct AccessorialCatalog {
    version: String,
    charges: HashMap<String, AccessorialCharge>,
}

impl AccessorialCatalog {
    /// Loads the catalog from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let config: CatalogConfig =
            serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
                path: path_str,
                message: e.to_string(),
            })?;

        Ok(Self::from_config(config))
    }

    /// Builds a catalog directly from parsed configuration.
    pub fn from_config(config: CatalogConfig) -> Self {
        let charges = config
            .accessorials
            .into_iter()
            .map(|(code, entry)| {
                let charge = AccessorialCharge {
                    id: Uuid::new_v4(),
                    code: code.clone(),
                    description: entry.description,
                    method: entry.method,
                    amount: entry.amount,
                    unit: entry.unit,
                };
                (code, charge)
            })
            .collect();

        Self {
            version: config.catalog.version,
            charges,
        }
    }

    /// Returns the catalog version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Looks up a reference record by billing code.
    pub fn get(&self, code: &str) -> EngineResult<&AccessorialCharge> {
        self.charges
            .get(code)
            .ok_or_else(|| EngineError::AccessorialNotFound {
                code: code.to_string(),
            })
    }

    /// Resolves an attachment from a code plus optional overrides.
    ///
    /// Unset fields fall back to the reference record's defaults.
    pub fn resolve(
        &self,
        code: &str,
        method: Option<ChargeMethod>,
        amount: Option<Money>,
        unit: Option<i16>,
    ) -> EngineResult<AdditionalCharge> {
        let reference = self.get(code)?;
        Ok(AdditionalCharge {
            id: Uuid::new_v4(),
            accessorial_charge_id: Some(reference.id),
            code: reference.code.clone(),
            method: method.unwrap_or(reference.method),
            amount: amount.unwrap_or(reference.amount),
            unit: unit.unwrap_or(reference.unit),
        })
    }
}
