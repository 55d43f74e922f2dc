//! Formula template service.
//!
//! Validates templates against their worked examples on save and produces
//! shipment rates for the base-charge calculator. Compiled programs are
//! cached per `(template_id, version)`; the cache is an optimization only
//! and is invalidated whenever a template is stored or promoted.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::loader::{EntityBag, EntityLoader};
use crate::models::{FormulaTemplate, Shipment};
use crate::money::Money;

use super::EvalError;
use super::eval::evaluate;
use super::functions::FunctionLibrary;
use super::program::{Program, compile};
use super::registry::build_context;

/// A validation failure attached to a template field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    /// The offending field, e.g. `expression` or `examples[2]`.
    pub field: String,
    /// Why validation failed.
    pub message: String,
}

/// Storage boundary for formula templates.
///
/// The in-memory implementation serves tests and the HTTP façade; the
/// SQL-backed one lives with the persistence collaborator.
pub trait TemplateStore: Send + Sync {
    /// Fetches a template by id.
    fn get(&self, id: Uuid) -> Option<FormulaTemplate>;

    /// Stores a template, replacing any previous version.
    fn put(&self, template: FormulaTemplate);

    /// Finds the default template for a `(tenant, category)`.
    fn find_default(
        &self,
        organization_id: Uuid,
        business_unit_id: Uuid,
        category: &str,
    ) -> Option<FormulaTemplate>;

    /// Atomically promotes a template to default for its `(tenant,
    /// category)`, demoting the previous default and bumping both versions.
    fn set_default(
        &self,
        id: Uuid,
        organization_id: Uuid,
        business_unit_id: Uuid,
        category: &str,
    ) -> EngineResult<()>;
}

/// A template store backed by a process-local map.
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<Uuid, FormulaTemplate>>,
}

impl InMemoryTemplateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn get(&self, id: Uuid) -> Option<FormulaTemplate> {
        self.templates
            .read()
            .expect("template lock poisoned")
            .get(&id)
            .cloned()
    }

    fn put(&self, template: FormulaTemplate) {
        self.templates
            .write()
            .expect("template lock poisoned")
            .insert(template.id, template);
    }

    fn find_default(
        &self,
        organization_id: Uuid,
        business_unit_id: Uuid,
        category: &str,
    ) -> Option<FormulaTemplate> {
        self.templates
            .read()
            .expect("template lock poisoned")
            .values()
            .find(|t| {
                t.is_default
                    && t.organization_id == organization_id
                    && t.business_unit_id == business_unit_id
                    && t.category == category
            })
            .cloned()
    }

    fn set_default(
        &self,
        id: Uuid,
        organization_id: Uuid,
        business_unit_id: Uuid,
        category: &str,
    ) -> EngineResult<()> {
        let mut templates = self.templates.write().expect("template lock poisoned");

        let target_matches = templates.get(&id).is_some_and(|t| {
            t.organization_id == organization_id
                && t.business_unit_id == business_unit_id
                && t.category == category
        });
        if !target_matches {
            return Err(EngineError::TemplateNotFound { id });
        }

        for template in templates.values_mut() {
            if template.id != id
                && template.is_default
                && template.organization_id == organization_id
                && template.business_unit_id == business_unit_id
                && template.category == category
            {
                template.is_default = false;
                template.version += 1;
            }
        }

        let target = templates.get_mut(&id).expect("checked above");
        if !target.is_default {
            target.is_default = true;
            target.version += 1;
        }

        Ok(())
    }
}

/// Validates templates and calculates shipment rates from them.
pub struct FormulaTemplateService {
    store: Arc<dyn TemplateStore>,
    loader: Arc<dyn EntityLoader>,
    library: FunctionLibrary,
    cache: RwLock<HashMap<(Uuid, u32), Arc<Program>>>,
}

impl FormulaTemplateService {
    /// Creates a service over a template store and entity loader.
    pub fn new(store: Arc<dyn TemplateStore>, loader: Arc<dyn EntityLoader>) -> Self {
        Self {
            store,
            loader,
            library: FunctionLibrary::builtins(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the function library, e.g. to register tenant helpers.
    pub fn with_library(mut self, library: FunctionLibrary) -> Self {
        self.library = library;
        self
    }

    /// Returns the function library in use.
    pub fn library(&self) -> &FunctionLibrary {
        &self.library
    }

    /// Stores a template and drops any cached programs for it.
    ///
    /// Saving a second default for the same `(tenant, category)` is
    /// rejected; promotion goes through [`Self::set_default`], which
    /// demotes the previous default atomically.
    pub fn put_template(&self, template: FormulaTemplate) -> EngineResult<()> {
        if template.is_default {
            let existing = self.store.find_default(
                template.organization_id,
                template.business_unit_id,
                &template.category,
            );
            if existing.is_some_and(|e| e.id != template.id) {
                return Err(EngineError::DuplicateDefault {
                    category: template.category,
                });
            }
        }
        let id = template.id;
        self.store.put(template);
        self.cache
            .write()
            .expect("program cache poisoned")
            .retain(|(cached_id, _), _| *cached_id != id);
        Ok(())
    }

    /// Fetches a template by id.
    pub fn get_template(&self, id: Uuid) -> Option<FormulaTemplate> {
        self.store.get(id)
    }

    /// Validates a template for saving.
    ///
    /// Returns every problem found: a compile error attaches to
    /// `expression`, an inverted clamp range to `min_rate`, a default
    /// collision to `is_default`, and each failing worked example to its
    /// `examples[i]` index.
    pub fn validate(&self, template: &FormulaTemplate) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let program = match compile(
            &template.expression,
            &template.variables,
            &template.parameters,
            &self.library,
        ) {
            Ok(program) => program,
            Err(error) => {
                errors.push(FieldError {
                    field: "expression".to_string(),
                    message: error.to_string(),
                });
                return errors;
            }
        };

        if let (Some(min), Some(max)) = (template.min_rate, template.max_rate) {
            if min > max {
                errors.push(FieldError {
                    field: "min_rate".to_string(),
                    message: format!("min_rate {} exceeds max_rate {}", min, max),
                });
            }
        }

        if template.is_default {
            let existing = self.store.find_default(
                template.organization_id,
                template.business_unit_id,
                &template.category,
            );
            if let Some(existing) = existing {
                if existing.id != template.id {
                    errors.push(FieldError {
                        field: "is_default".to_string(),
                        message: format!(
                            "category '{}' already has a default template; promote explicitly instead",
                            template.category
                        ),
                    });
                }
            }
        }

        let tolerance = Decimal::new(1, 4);
        for (index, example) in template.examples.iter().enumerate() {
            let field = format!("examples[{}]", index);
            let Some(bag) = EntityBag::from_value(example.shipment_data.clone()) else {
                errors.push(FieldError {
                    field,
                    message: "shipment_data must be an object".to_string(),
                });
                continue;
            };

            let result = build_context(template, &bag, &example.parameters)
                .and_then(|context| evaluate(&program, &context, &self.library))
                .and_then(|raw| clamp(raw, template.min_rate, template.max_rate));

            match result {
                Ok(rate) => {
                    let expected = example.expected_rate.inner();
                    if (rate - expected).abs() > tolerance {
                        errors.push(FieldError {
                            field,
                            message: format!("expected rate {}, evaluated {}", expected, rate),
                        });
                    }
                }
                Err(error) => errors.push(FieldError {
                    field,
                    message: error.to_string(),
                }),
            }
        }

        errors
    }

    /// Calculates the base rate for a shipment using a stored template.
    ///
    /// Loads only the entity data the compiled program requires, binds the
    /// template's parameter defaults, evaluates, and clamps to the
    /// template's declared range.
    pub fn calculate_shipment_rate(
        &self,
        template_id: Uuid,
        shipment: &Shipment,
        actor_id: Uuid,
    ) -> EngineResult<Money> {
        let template = self
            .store
            .get(template_id)
            .filter(|t| {
                t.organization_id == shipment.organization_id
                    && t.business_unit_id == shipment.business_unit_id
            })
            .ok_or(EngineError::TemplateNotFound { id: template_id })?;
        if !template.is_active {
            return Err(EngineError::TemplateInactive { id: template_id });
        }

        let program = self.compiled(&template)?;

        info!(
            template_id = %template_id,
            shipment_id = %shipment.id,
            actor_id = %actor_id,
            "calculating shipment rate from formula template"
        );

        let bag = self.loader.load_with_requirements(
            "shipment",
            &shipment.id.to_string(),
            &program.requirements,
        )?;
        let context = build_context(&template, &bag, &BTreeMap::new())
            .map_err(EngineError::Eval)?;
        let raw = evaluate(&program, &context, &self.library).map_err(EngineError::Eval)?;
        let clamped = clamp(raw, template.min_rate, template.max_rate)?;

        Ok(Money::new(clamped))
    }

    /// Atomically promotes a template to default for a `(tenant, category)`.
    pub fn set_default(
        &self,
        template_id: Uuid,
        category: &str,
        organization_id: Uuid,
        business_unit_id: Uuid,
    ) -> EngineResult<()> {
        self.store
            .set_default(template_id, organization_id, business_unit_id, category)?;
        // Promotion bumps versions; stale programs must not be served.
        self.cache
            .write()
            .expect("program cache poisoned")
            .retain(|(cached_id, _), _| *cached_id != template_id);
        Ok(())
    }

    fn compiled(&self, template: &FormulaTemplate) -> EngineResult<Arc<Program>> {
        let key = (template.id, template.version);
        if let Some(program) = self
            .cache
            .read()
            .expect("program cache poisoned")
            .get(&key)
        {
            return Ok(Arc::clone(program));
        }

        let program = Arc::new(compile(
            &template.expression,
            &template.variables,
            &template.parameters,
            &self.library,
        )?);
        self.cache
            .write()
            .expect("program cache poisoned")
            .insert(key, Arc::clone(&program));
        Ok(program)
    }
}

fn clamp(raw: Decimal, min: Option<Money>, max: Option<Money>) -> Result<Decimal, EvalError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(EvalError::ClampViolation {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
    }
    let mut value = raw;
    if let Some(min) = min {
        value = value.max(min.inner());
    }
    if let Some(max) = max {
        value = value.min(max.inner());
    }
    Ok(value)
}
