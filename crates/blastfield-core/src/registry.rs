//! Registry of available analytics models.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AnalyticsError, Result};
use crate::model::{AnalyticsModel, ModelInfo};
use crate::models::builtin_models;
use crate::pipeline::BASE_UNIFORM_NAMES;
use crate::program::{is_wgsl_identifier, PADDING_PREFIX};

/// Registry for all analytics models known to an engine.
///
/// Models are listed in registration order and looked up by name.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<Arc<dyn AnalyticsModel>>,
    index: HashMap<String, usize>,
}

impl ModelRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in model.
    pub fn with_builtin_models() -> Result<Self> {
        let mut registry = Self::new();
        for model in builtin_models() {
            registry.register(model)?;
        }
        Ok(registry)
    }

    /// Registers a model.
    ///
    /// Returns an error if a model with the same name already exists, or if
    /// the model's uniforms cannot be expressed in the generated program.
    pub fn register(&mut self, model: Arc<dyn AnalyticsModel>) -> Result<()> {
        let name = model.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AnalyticsError::DuplicateModel(name));
        }
        validate(model.as_ref())?;

        log::debug!("registered analytics model '{name}'");
        self.index.insert(name, self.models.len());
        self.models.push(model);
        Ok(())
    }

    /// Looks up a model by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn AnalyticsModel>> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.models[i]))
            .ok_or_else(|| AnalyticsError::ModelNotFound(name.to_string()))
    }

    /// Checks if a model with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Identity of every registered model, in registration order.
    pub fn list_models(&self) -> Vec<ModelInfo> {
        self.models.iter().map(|m| m.info()).collect()
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn validate(model: &dyn AnalyticsModel) -> Result<()> {
    let invalid = |reason: String| AnalyticsError::InvalidModel {
        model: model.name().to_string(),
        reason,
    };

    let uniforms = model.uniforms(&model.default_params());
    for (name, value) in uniforms.iter() {
        if !is_wgsl_identifier(name) {
            return Err(invalid(format!("uniform '{name}' is not a WGSL identifier")));
        }
        if name.starts_with(PADDING_PREFIX) {
            return Err(invalid(format!("uniform '{name}' uses the reserved padding prefix")));
        }
        if BASE_UNIFORM_NAMES.contains(&name) {
            return Err(invalid(format!("uniform '{name}' shadows a base uniform")));
        }
        if value.kind().wgsl_type().is_none() {
            return Err(invalid(format!(
                "uniform '{name}' has kind {:?}, which cannot live in the model block",
                value.kind()
            )));
        }
    }
    Ok(())
}
