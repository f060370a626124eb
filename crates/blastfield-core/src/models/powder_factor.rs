use crate::model::{AnalyticsModel, HoleField};
use crate::params::ModelParams;
use crate::uniforms::{UniformSet, UniformValue};

/// Local powder factor over a vertical search cylinder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowderFactorModel;

impl AnalyticsModel for PowderFactorModel {
    fn name(&self) -> &str {
        "powder_factor"
    }

    fn display_name(&self) -> &str {
        "Powder Factor"
    }

    fn unit(&self) -> &str {
        "kg/m³"
    }

    fn default_ramp(&self) -> &str {
        "coolwarm"
    }

    fn default_range(&self) -> (f32, f32) {
        (0.0, 1.5)
    }

    fn hole_inputs(&self) -> &[HoleField] {
        &[HoleField::ChargeMass]
    }

    fn default_params(&self) -> ModelParams {
        ModelParams::new()
            .with("searchRadius", 5.0)
            .with("benchHeight", 10.0)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn uniforms(&self, params: &ModelParams) -> UniformSet {
        UniformSet::new()
            .with(
                "search_radius",
                UniformValue::Float(params.get_or("searchRadius", 5.0) as f32),
            )
            .with(
                "bench_height",
                UniformValue::Float(params.get_or("benchHeight", 10.0) as f32),
            )
    }

    fn fragment_source(&self) -> &str {
        include_str!("shaders/powder_factor.wgsl")
    }
}
