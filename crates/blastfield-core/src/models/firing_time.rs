use crate::model::{AnalyticsModel, HoleField};
use crate::params::ModelParams;
use crate::uniforms::{UniformSet, UniformValue};

/// Interpolated initiation time surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiringTimeModel;

impl AnalyticsModel for FiringTimeModel {
    fn name(&self) -> &str {
        "firing_time"
    }

    fn display_name(&self) -> &str {
        "Firing Time"
    }

    fn unit(&self) -> &str {
        "ms"
    }

    fn default_ramp(&self) -> &str {
        "viridis"
    }

    fn default_range(&self) -> (f32, f32) {
        (0.0, 500.0)
    }

    fn hole_inputs(&self) -> &[HoleField] {
        &[HoleField::ChargeMass, HoleField::FireTime]
    }

    fn default_params(&self) -> ModelParams {
        ModelParams::new().with("power", 2.0).with("minDistance", 0.1)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn uniforms(&self, params: &ModelParams) -> UniformSet {
        UniformSet::new()
            .with("idw_power", UniformValue::Float(params.get_or("power", 2.0) as f32))
            .with(
                "min_distance",
                UniformValue::Float(params.get_or("minDistance", 0.1) as f32),
            )
    }

    fn fragment_source(&self) -> &str {
        include_str!("shaders/firing_time.wgsl")
    }
}
