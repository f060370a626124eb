//! Built-in analytics models.
//!
//! The formulas here are working defaults; each model is an independent unit
//! and can be replaced by registering a different implementation under the
//! same name in a fresh registry.

mod firing_time;
mod holmberg_persson;
mod powder_factor;
mod ppv;
mod scaled_distance;

pub use firing_time::FiringTimeModel;
pub use holmberg_persson::HolmbergPerssonModel;
pub use powder_factor::PowderFactorModel;
pub use ppv::PpvModel;
pub use scaled_distance::ScaledDistanceModel;

use std::sync::Arc;

use crate::model::AnalyticsModel;

/// All built-in models, in the order they are listed to users.
pub fn builtin_models() -> Vec<Arc<dyn AnalyticsModel>> {
    vec![
        Arc::new(PpvModel),
        Arc::new(ScaledDistanceModel),
        Arc::new(HolmbergPerssonModel),
        Arc::new(PowderFactorModel),
        Arc::new(FiringTimeModel),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::is_wgsl_identifier;

    #[test]
    fn test_builtin_names_unique() {
        let models = builtin_models();
        let mut names: Vec<_> = models.iter().map(|m| m.name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), models.len());
    }

    #[test]
    fn test_builtin_uniforms_stable_across_params() {
        for model in builtin_models() {
            let defaults = model.uniforms(&model.default_params());
            let tweaked = model.uniforms(&crate::ModelParams::new().with("K", 1.0));
            let a: Vec<_> = defaults.iter().map(|(n, v)| (n.to_string(), v.kind())).collect();
            let b: Vec<_> = tweaked.iter().map(|(n, v)| (n.to_string(), v.kind())).collect();
            assert_eq!(a, b, "uniform layout of '{}' depends on params", model.name());
            assert!(defaults.names().all(is_wgsl_identifier));
        }
    }

    #[test]
    fn test_builtin_sources_define_model_value() {
        for model in builtin_models() {
            assert!(
                model.fragment_source().contains("fn model_value(p: vec3<f32>) -> f32"),
                "{} lacks model_value",
                model.name()
            );
        }
    }
}
