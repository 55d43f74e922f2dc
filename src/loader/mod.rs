//! Entity loader port.
//!
//! The engine never issues SQL. It asks an [`EntityLoader`] for an
//! [`EntityBag`] — a nested, field-keyed map — optionally narrowed by the
//! [`DataRequirements`](crate::formula::DataRequirements) a compiled formula
//! produced. Implementations are free to over-fetch; the requirement set is
//! an optimization, not a contract. The SQL-backed implementation lives with
//! the persistence collaborator; [`InMemoryLoader`] serves tests and the
//! HTTP façade.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{EngineError, EngineResult};
use crate::formula::DataRequirements;

/// A nested map of entity fields keyed by field name.
///
/// Keys are domain field names, not storage column names; the schema
/// registry on the persistence side owns that mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBag(Map<String, JsonValue>);

impl EntityBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        EntityBag(Map::new())
    }

    /// Wraps a JSON object; returns `None` for any other JSON shape.
    pub fn from_value(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(EntityBag(map)),
            _ => None,
        }
    }

    /// Serializes any entity into a bag.
    pub fn from_serialize<T: Serialize>(entity: &T) -> EngineResult<Self> {
        let value = serde_json::to_value(entity).map_err(|e| EngineError::Schema {
            schema_id: std::any::type_name::<T>().to_string(),
            message: e.to_string(),
        })?;
        Self::from_value(value).ok_or_else(|| EngineError::Schema {
            schema_id: std::any::type_name::<T>().to_string(),
            message: "entity did not serialize to an object".to_string(),
        })
    }

    /// Inserts a top-level field.
    pub fn insert(&mut self, field: impl Into<String>, value: JsonValue) {
        self.0.insert(field.into(), value);
    }

    /// Looks up a top-level field.
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.0.get(field)
    }

    /// Resolves a dotted path, e.g. `customer.name`.
    ///
    /// A segment suffixed `[*]` maps the remaining path over an array and
    /// yields the collected values, so `commodities[*].pieces` produces the
    /// list of piece counts. Returns `None` when any segment is absent.
    pub fn resolve_path(&self, path: &str) -> Option<JsonValue> {
        let segments: Vec<&str> = path.split('.').collect();
        resolve_segments(&JsonValue::Object(self.0.clone()), &segments)
    }
}

fn resolve_segments(value: &JsonValue, segments: &[&str]) -> Option<JsonValue> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value.clone());
    };

    if let Some(field) = head.strip_suffix("[*]") {
        let array = value.get(field)?.as_array()?;
        let mapped: Option<Vec<JsonValue>> = array
            .iter()
            .map(|item| resolve_segments(item, rest))
            .collect();
        return mapped.map(JsonValue::Array);
    }

    resolve_segments(value.get(*head)?, rest)
}

/// The loader boundary between the engine and persistence.
///
/// Failure modes: [`EngineError::EntityNotFound`] when no entity exists,
/// [`EngineError::Transient`] for retryable upstream failures, and
/// [`EngineError::Schema`] for permanent mismatches.
pub trait EntityLoader: Send + Sync {
    /// Fetches an entity by schema and id, fully materialized.
    fn load(&self, schema_id: &str, entity_id: &str) -> EngineResult<EntityBag>;

    /// Fetches an entity with only the given requirements materialized.
    ///
    /// Implementations may over-fetch; they must never under-fetch a field
    /// named in `requirements`.
    fn load_with_requirements(
        &self,
        schema_id: &str,
        entity_id: &str,
        requirements: &DataRequirements,
    ) -> EngineResult<EntityBag>;
}

/// A loader backed by a process-local map.
///
/// Used by tests and by the HTTP façade, which seeds it from the request's
/// shipment graph before rating.
#[derive(Default)]
pub struct InMemoryLoader {
    entities: RwLock<HashMap<(String, String), EntityBag>>,
}

impl InMemoryLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity bag under a schema and id.
    pub fn insert(&self, schema_id: impl Into<String>, entity_id: impl Into<String>, bag: EntityBag) {
        self.entities
            .write()
            .expect("loader lock poisoned")
            .insert((schema_id.into(), entity_id.into()), bag);
    }
}

impl EntityLoader for InMemoryLoader {
    fn load(&self, schema_id: &str, entity_id: &str) -> EngineResult<EntityBag> {
        self.entities
            .read()
            .expect("loader lock poisoned")
            .get(&(schema_id.to_string(), entity_id.to_string()))
            .cloned()
            .ok_or_else(|| EngineError::EntityNotFound {
                schema_id: schema_id.to_string(),
                entity_id: entity_id.to_string(),
            })
    }

    fn load_with_requirements(
        &self,
        schema_id: &str,
        entity_id: &str,
        _requirements: &DataRequirements,
    ) -> EngineResult<EntityBag> {
        // Over-fetching is allowed; the in-memory bags are already small.
        self.load(schema_id, entity_id)
    }
}
