use crate::model::{AnalyticsModel, HoleField};
use crate::params::ModelParams;
use crate::uniforms::{UniformSet, UniformValue};

/// Minimum scaled distance `R / Q^e` to any charged hole.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaledDistanceModel;

impl AnalyticsModel for ScaledDistanceModel {
    fn name(&self) -> &str {
        "scaled_distance"
    }

    fn display_name(&self) -> &str {
        "Scaled Distance"
    }

    fn unit(&self) -> &str {
        "m/kg^0.5"
    }

    fn default_ramp(&self) -> &str {
        "viridis"
    }

    fn default_range(&self) -> (f32, f32) {
        (0.0, 50.0)
    }

    fn hole_inputs(&self) -> &[HoleField] {
        &[HoleField::ChargeMass]
    }

    fn default_params(&self) -> ModelParams {
        ModelParams::new()
            .with("chargeExponent", 0.5)
            .with("minDistance", 0.1)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn uniforms(&self, params: &ModelParams) -> UniformSet {
        UniformSet::new()
            .with(
                "charge_exponent",
                UniformValue::Float(params.get_or("chargeExponent", 0.5) as f32),
            )
            .with(
                "min_distance",
                UniformValue::Float(params.get_or("minDistance", 0.1) as f32),
            )
    }

    fn fragment_source(&self) -> &str {
        include_str!("shaders/scaled_distance.wgsl")
    }
}
