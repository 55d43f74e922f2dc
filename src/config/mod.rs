//! Reference data configuration.
//!
//! The accessorial charge catalog ships as YAML under `config/`; shipments
//! attach accessorials by billing code and inherit the catalog defaults for
//! anything they leave unset.

mod loader;
mod types;

pub use loader::AccessorialCatalog;
pub use types::{AccessorialEntry, CatalogConfig, CatalogMetadata};
