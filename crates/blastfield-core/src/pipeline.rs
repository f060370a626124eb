//! CPU-side pipeline state: the active model, its parameters, the uniform
//! set and the assembled program.
//!
//! The state has exactly two transitions. [`PipelineState::build`] is a
//! structural rebuild that produces a new program; [`PipelineState::patch`]
//! refreshes uniform values in place and never touches the program.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::encoder::HoleLayout;
use crate::error::Result;
use crate::model::AnalyticsModel;
use crate::params::ModelParams;
use crate::program::ProgramSource;
use crate::uniforms::{Assign, TextureSlot, UniformSet, UniformValue};

pub const HOLE_DATA: &str = "hole_data";
pub const HOLE_COUNT: &str = "hole_count";
pub const TEXTURE_WIDTH: &str = "texture_width";
pub const COLOUR_RAMP: &str = "colour_ramp";
pub const MIN_VALUE: &str = "min_value";
pub const MAX_VALUE: &str = "max_value";
pub const OPACITY: &str = "opacity";
pub const WORLD_OFFSET: &str = "world_offset";
pub const VIEW_PROJECTION: &str = "view_projection";
pub const MESH_TRANSLATION: &str = "mesh_translation";

/// Names every program carries regardless of model.
pub const BASE_UNIFORM_NAMES: &[&str] = &[
    HOLE_DATA,
    HOLE_COUNT,
    TEXTURE_WIDTH,
    COLOUR_RAMP,
    MIN_VALUE,
    MAX_VALUE,
    OPACITY,
    WORLD_OFFSET,
    VIEW_PROJECTION,
    MESH_TRANSLATION,
];

/// Values seeding the base uniforms of a new program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseInputs {
    pub hole_count: u32,
    pub texture_width: u32,
    pub opacity: f32,
    pub world_offset: Vec3,
    pub view_projection: Mat4,
    pub mesh_translation: Vec3,
}

impl Default for BaseInputs {
    fn default() -> Self {
        Self {
            hole_count: 0,
            texture_width: 1,
            opacity: 1.0,
            world_offset: Vec3::ZERO,
            view_projection: Mat4::IDENTITY,
            mesh_translation: Vec3::ZERO,
        }
    }
}

/// Builds the base uniform set for a model's value range.
pub fn base_uniforms(inputs: &BaseInputs, range: (f32, f32)) -> UniformSet {
    UniformSet::new()
        .with(HOLE_DATA, UniformValue::Texture(TextureSlot::HoleData))
        .with(HOLE_COUNT, UniformValue::UInt(inputs.hole_count))
        .with(TEXTURE_WIDTH, UniformValue::UInt(inputs.texture_width))
        .with(COLOUR_RAMP, UniformValue::Texture(TextureSlot::ColourRamp))
        .with(MIN_VALUE, UniformValue::Float(range.0))
        .with(MAX_VALUE, UniformValue::Float(range.1))
        .with(OPACITY, UniformValue::Float(inputs.opacity))
        .with(WORLD_OFFSET, UniformValue::Vec3(inputs.world_offset))
        .with(VIEW_PROJECTION, UniformValue::Mat4(inputs.view_projection))
        .with(MESH_TRANSLATION, UniformValue::Vec3(inputs.mesh_translation))
}

/// What a state change did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineTransition {
    /// A new program was assembled; GPU resources must be recreated.
    Rebuilt,
    /// Uniform values changed in place.
    ParamsPatched { changed: Vec<String> },
}

/// The active model together with everything derived from it.
pub struct PipelineState {
    model: Arc<dyn AnalyticsModel>,
    params: ModelParams,
    uniforms: UniformSet,
    layout: HoleLayout,
    program: ProgramSource,
    ramp_name: String,
}

impl PipelineState {
    /// Structural rebuild for `model`.
    ///
    /// `params` are layered over the model's defaults. The model's default
    /// ramp and value range are adopted.
    pub fn build(
        model: Arc<dyn AnalyticsModel>,
        params: &ModelParams,
        base: &BaseInputs,
    ) -> Result<Self> {
        let mut effective = model.default_params();
        effective.merge(params);

        let model_uniforms = model.uniforms(&effective);
        let layout = HoleLayout::for_fields(model.hole_inputs());
        let program = ProgramSource::assemble(model.as_ref(), &layout, &model_uniforms)?;

        let mut uniforms = base_uniforms(base, model.default_range());
        uniforms.merge(&model_uniforms);

        log::debug!(
            "assembled program for '{}' with {} uniforms",
            model.name(),
            uniforms.len()
        );

        Ok(Self {
            ramp_name: model.default_ramp().to_string(),
            model,
            params: effective,
            uniforms,
            layout,
            program,
        })
    }

    /// Merges `params` and refreshes the values of existing model uniforms.
    ///
    /// Uniforms the program does not already have are ignored: adding one
    /// would need a rebuild.
    pub fn patch(&mut self, params: &ModelParams) -> PipelineTransition {
        self.params.merge(params);
        let fresh = self.model.uniforms(&self.params);

        let mut changed = Vec::new();
        for (name, value) in fresh.iter() {
            match self.uniforms.assign(name, *value) {
                Assign::Changed => changed.push(name.to_string()),
                Assign::Unchanged => {}
                Assign::Missing => {
                    log::debug!("ignoring uniform '{name}' absent from the current program");
                }
                Assign::KindMismatch => {
                    log::warn!("ignoring uniform '{name}': kind differs from the current program");
                }
            }
        }
        PipelineTransition::ParamsPatched { changed }
    }

    /// Assigns an existing uniform, typically a base uniform.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Assign {
        self.uniforms.assign(name, value)
    }

    /// Replaces the ramp name; the caller swaps the texture.
    pub fn set_ramp_name(&mut self, name: impl Into<String>) {
        self.ramp_name = name.into();
    }

    pub fn model(&self) -> &Arc<dyn AnalyticsModel> {
        &self.model
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn layout(&self) -> &HoleLayout {
        &self.layout
    }

    pub fn program(&self) -> &ProgramSource {
        &self.program
    }

    pub fn ramp_name(&self) -> &str {
        &self.ramp_name
    }

    /// Current `[min, max]` mapped onto the ramp.
    pub fn value_range(&self) -> (f32, f32) {
        let get = |name: &str| self.uniforms.get(name).and_then(UniformValue::as_f32);
        (get(MIN_VALUE).unwrap_or(0.0), get(MAX_VALUE).unwrap_or(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HolmbergPerssonModel, PpvModel};

    fn ppv(params: &ModelParams) -> PipelineState {
        PipelineState::build(Arc::new(PpvModel), params, &BaseInputs::default()).unwrap()
    }

    #[test]
    fn test_build_adopts_model_defaults() {
        let state = ppv(&ModelParams::new());
        assert_eq!(state.ramp_name(), "rainbow");
        assert_eq!(state.value_range(), (0.0, 200.0));
        assert_eq!(state.params().get("K"), Some(1140.0));
    }

    #[test]
    fn test_uniforms_are_superset_of_base_and_model() {
        let params = ModelParams::new().with("K", 1140.0).with("B", 1.6);
        let state = ppv(&params);

        let base = base_uniforms(&BaseInputs::default(), (0.0, 1.0));
        assert!(state.uniforms().is_superset_of(&base));
        assert!(state.uniforms().is_superset_of(&PpvModel.uniforms(&params)));
        assert_eq!(
            state.uniforms().get("site_k"),
            Some(&UniformValue::Float(1140.0))
        );
    }

    #[test]
    fn test_patch_changes_only_k_and_keeps_program() {
        let mut state = ppv(&ModelParams::new().with("K", 1140.0).with("B", 1.6));
        let program_before = state.program().clone();
        let uniforms_before = state.uniforms().clone();

        let transition = state.patch(&ModelParams::new().with("K", 1000.0));

        assert_eq!(
            transition,
            PipelineTransition::ParamsPatched {
                changed: vec!["site_k".to_string()]
            }
        );
        assert_eq!(state.program(), &program_before);
        for (name, value) in uniforms_before.iter() {
            if name == "site_k" {
                assert_eq!(state.uniforms().get(name), Some(&UniformValue::Float(1000.0)));
            } else {
                assert_eq!(state.uniforms().get(name), Some(value), "{name} changed");
            }
        }
        assert_eq!(state.params().get("B"), Some(1.6));
    }

    #[test]
    fn test_patch_never_adds_uniforms() {
        let mut state = PipelineState::build(
            Arc::new(HolmbergPerssonModel),
            &ModelParams::new(),
            &BaseInputs::default(),
        )
        .unwrap();
        let count = state.uniforms().len();
        let transition = state.patch(&ModelParams::new().with("unrelated", 3.0));
        assert_eq!(
            transition,
            PipelineTransition::ParamsPatched { changed: vec![] }
        );
        assert_eq!(state.uniforms().len(), count);
        assert_eq!(state.params().get("unrelated"), Some(3.0));
    }

    #[test]
    fn test_set_uniform_refuses_new_names() {
        let mut state = ppv(&ModelParams::new());
        assert_eq!(
            state.set_uniform(HOLE_COUNT, UniformValue::UInt(12)),
            Assign::Changed
        );
        assert_eq!(
            state.set_uniform("extra", UniformValue::UInt(1)),
            Assign::Missing
        );
    }
}
