//! The capability interface every analytics model implements.

use serde::Serialize;

use crate::params::ModelParams;
use crate::uniforms::UniformSet;

/// Per-hole scalar inputs a model can ask the encoder for.
///
/// Position is always encoded and is not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoleField {
    /// Total explosive mass (kg).
    ChargeMass,
    /// Local elevation of the shallowest charged point.
    ChargeTop,
    /// Local elevation of the deepest charged point.
    ChargeBase,
    /// Sum of charged deck lengths (m).
    ChargeLength,
    /// Mass per metre of charged column (kg/m).
    LinearDensity,
    /// Earliest deck fire time (ms).
    FireTime,
    /// Hole diameter (m).
    Diameter,
}

impl HoleField {
    /// Suffix of the generated WGSL accessor, `hole_<name>(i)`.
    pub fn wgsl_name(self) -> &'static str {
        match self {
            Self::ChargeMass => "charge_mass",
            Self::ChargeTop => "charge_top",
            Self::ChargeBase => "charge_base",
            Self::ChargeLength => "charge_length",
            Self::LinearDensity => "linear_density",
            Self::FireTime => "fire_time",
            Self::Diameter => "diameter",
        }
    }
}

/// Public identity of a registered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub display_name: String,
    pub unit: String,
}

/// A physical model that contributes a per-fragment formula.
///
/// Implementations must be pure: [`uniforms`](Self::uniforms) depends only
/// on its parameters and always yields the same names and kinds, and
/// [`fragment_source`](Self::fragment_source) never changes. Parameters reach
/// the GPU through uniforms, never through source text.
///
/// The fragment source defines `fn model_value(p: vec3<f32>) -> f32` where
/// `p` is the fragment position in the local frame. It may use
/// `base.hole_count`, `hole_position(i)`, one `hole_<field>(i)` accessor per
/// declared [`HoleField`], and `model.<uniform>` for each model uniform.
pub trait AnalyticsModel {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// Human-readable name.
    fn display_name(&self) -> &str;

    /// Unit of the computed value.
    fn unit(&self) -> &str;

    /// Colour ramp adopted when the model becomes active.
    fn default_ramp(&self) -> &str;

    /// Value range mapped onto the colour ramp.
    fn default_range(&self) -> (f32, f32);

    /// Per-hole inputs the fragment stage reads.
    fn hole_inputs(&self) -> &[HoleField];

    /// Parameters used when the caller supplies none.
    fn default_params(&self) -> ModelParams;

    /// Builds the model's uniform set from parameters.
    fn uniforms(&self, params: &ModelParams) -> UniformSet;

    /// WGSL defining `model_value`.
    fn fragment_source(&self) -> &str;

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name().to_string(),
            display_name: self.display_name().to_string(),
            unit: self.unit().to_string(),
        }
    }
}

/// A model assembled from plain data, for hosts that add their own models
/// without defining a new type.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub name: String,
    pub display_name: String,
    pub unit: String,
    pub default_ramp: String,
    pub default_range: (f32, f32),
    pub hole_inputs: Vec<HoleField>,
    pub default_params: ModelParams,
    pub uniform_fn: fn(&ModelParams) -> UniformSet,
    pub fragment_source: String,
}

impl AnalyticsModel for ModelDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn default_ramp(&self) -> &str {
        &self.default_ramp
    }

    fn default_range(&self) -> (f32, f32) {
        self.default_range
    }

    fn hole_inputs(&self) -> &[HoleField] {
        &self.hole_inputs
    }

    fn default_params(&self) -> ModelParams {
        self.default_params.clone()
    }

    fn uniforms(&self, params: &ModelParams) -> UniformSet {
        (self.uniform_fn)(params)
    }

    fn fragment_source(&self) -> &str {
        &self.fragment_source
    }
}
