//! Data requirement analysis.
//!
//! Walks a compiled AST and produces the minimal set of entity fields and
//! relations the expression references, so the entity loader can
//! materialize only what evaluation will actually read. The analyzer is a
//! pure function of the AST and declared inputs; identical expressions
//! always produce identical requirements, which callers use as a cache key.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::TemplateVariable;

use super::ast::Expr;

/// The root alias variable sources are written against.
const ROOT_ALIAS: &str = "shipment.";

/// The fields and relations a compiled formula needs loaded.
///
/// Sets are ordered so that equal requirements serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequirements {
    /// Entity field paths evaluation reads.
    pub fields: BTreeSet<String>,
    /// Relations that must be joined or preloaded.
    pub preloads: BTreeSet<String>,
    /// Derived fields the loader must compute before returning.
    pub computed_fields: BTreeSet<String>,
}

impl DataRequirements {
    /// Returns true when nothing needs loading.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.preloads.is_empty() && self.computed_fields.is_empty()
    }
}

/// Derives the [`DataRequirements`] of an expression.
///
/// Only variables actually referenced by the AST contribute; declared but
/// unused variables cost nothing to load. A computed variable additionally
/// contributes its `requires` paths, expanded transitively when a required
/// name is itself a declared variable.
pub fn analyze(expr: &Expr, variables: &[TemplateVariable]) -> DataRequirements {
    let mut requirements = DataRequirements::default();
    let mut visited: BTreeSet<&str> = BTreeSet::new();

    for name in expr.identifiers() {
        if let Some(variable) = variables.iter().find(|v| v.name == name) {
            add_variable(variable, variables, &mut requirements, &mut visited);
        }
    }

    requirements
}

fn add_variable<'a>(
    variable: &'a TemplateVariable,
    all: &'a [TemplateVariable],
    requirements: &mut DataRequirements,
    visited: &mut BTreeSet<&'a str>,
) {
    if !visited.insert(variable.name.as_str()) {
        return;
    }

    add_path(&variable.source, requirements);
    if variable.computed {
        requirements.computed_fields.insert(variable.source.clone());
    }

    for required in &variable.requires {
        match all.iter().find(|v| v.name == *required) {
            Some(dependency) => add_variable(dependency, all, requirements, visited),
            None => add_path(required, requirements),
        }
    }
}

fn add_path(path: &str, requirements: &mut DataRequirements) {
    requirements.fields.insert(path.to_string());

    // The leading root alias does not name a relation.
    let relative = path.strip_prefix(ROOT_ALIAS).unwrap_or(path);
    if let Some((head, _)) = relative.split_once('.') {
        let relation = head.trim_end_matches("[*]");
        requirements.preloads.insert(relation.to_string());
    }
}
