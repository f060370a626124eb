use crate::model::{AnalyticsModel, HoleField};
use crate::params::ModelParams;
use crate::uniforms::{UniformSet, UniformValue};

/// Peak particle velocity from the site law `K * (R / Q^e)^-B`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PpvModel;

impl AnalyticsModel for PpvModel {
    fn name(&self) -> &str {
        "ppv"
    }

    fn display_name(&self) -> &str {
        "Peak Particle Velocity"
    }

    fn unit(&self) -> &str {
        "mm/s"
    }

    fn default_ramp(&self) -> &str {
        "rainbow"
    }

    fn default_range(&self) -> (f32, f32) {
        (0.0, 200.0)
    }

    fn hole_inputs(&self) -> &[HoleField] {
        &[HoleField::ChargeMass]
    }

    fn default_params(&self) -> ModelParams {
        ModelParams::new()
            .with("K", 1140.0)
            .with("B", 1.6)
            .with("chargeExponent", 0.5)
            .with("minDistance", 1.0)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn uniforms(&self, params: &ModelParams) -> UniformSet {
        UniformSet::new()
            .with("site_k", UniformValue::Float(params.get_or("K", 1140.0) as f32))
            .with("site_b", UniformValue::Float(params.get_or("B", 1.6) as f32))
            .with(
                "charge_exponent",
                UniformValue::Float(params.get_or("chargeExponent", 0.5) as f32),
            )
            .with(
                "min_distance",
                UniformValue::Float(params.get_or("minDistance", 1.0) as f32),
            )
    }

    fn fragment_source(&self) -> &str {
        include_str!("shaders/ppv.wgsl")
    }
}
