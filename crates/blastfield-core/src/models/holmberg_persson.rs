use crate::model::{AnalyticsModel, HoleField};
use crate::params::ModelParams;
use crate::uniforms::{UniformSet, UniformValue};

/// Holmberg-Persson near-field vibration, summed over column segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HolmbergPerssonModel;

impl AnalyticsModel for HolmbergPerssonModel {
    fn name(&self) -> &str {
        "holmberg_persson"
    }

    fn display_name(&self) -> &str {
        "Holmberg-Persson Damage"
    }

    fn unit(&self) -> &str {
        "mm/s"
    }

    fn default_ramp(&self) -> &str {
        "reds"
    }

    fn default_range(&self) -> (f32, f32) {
        (0.0, 2000.0)
    }

    fn hole_inputs(&self) -> &[HoleField] {
        &[
            HoleField::ChargeTop,
            HoleField::ChargeBase,
            HoleField::LinearDensity,
        ]
    }

    fn default_params(&self) -> ModelParams {
        ModelParams::new()
            .with("K", 700.0)
            .with("alpha", 0.7)
            .with("beta", 1.5)
            .with("segments", 16.0)
            .with("minDistance", 0.5)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn uniforms(&self, params: &ModelParams) -> UniformSet {
        let segments = params.get_or("segments", 16.0).round().clamp(1.0, 256.0) as u32;
        UniformSet::new()
            .with("site_k", UniformValue::Float(params.get_or("K", 700.0) as f32))
            .with("alpha", UniformValue::Float(params.get_or("alpha", 0.7) as f32))
            .with("beta", UniformValue::Float(params.get_or("beta", 1.5) as f32))
            .with("segments", UniformValue::UInt(segments))
            .with(
                "min_distance",
                UniformValue::Float(params.get_or("minDistance", 0.5) as f32),
            )
    }

    fn fragment_source(&self) -> &str {
        include_str!("shaders/holmberg_persson.wgsl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_are_clamped_integers() {
        let uniforms = HolmbergPerssonModel.uniforms(&ModelParams::new().with("segments", 1e6));
        assert_eq!(uniforms.get("segments"), Some(&UniformValue::UInt(256)));
        let uniforms = HolmbergPerssonModel.uniforms(&ModelParams::new().with("segments", -3.0));
        assert_eq!(uniforms.get("segments"), Some(&UniformValue::UInt(1)));
    }
}
