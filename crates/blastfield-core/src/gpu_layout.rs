//! Byte layouts of the uniform blocks read by analytics programs.

use glam::{Mat4, Vec3};

use crate::pipeline::{
    HOLE_COUNT, MAX_VALUE, MESH_TRANSLATION, MIN_VALUE, OPACITY, TEXTURE_WIDTH, VIEW_PROJECTION,
    WORLD_OFFSET,
};
use crate::program::ProgramSource;
use crate::uniforms::UniformSet;

/// Base uniform block.
/// Note: Layout must match WGSL `BaseUniforms` exactly (128 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BaseUniforms {
    pub view_projection: [[f32; 4]; 4],
    /// World offset, narrowed; informational only.
    pub world_offset: [f32; 4],
    pub mesh_translation: [f32; 4],
    pub min_value: f32,
    pub max_value: f32,
    pub opacity: f32,
    pub hole_count: u32,
    /// Hole texture width in texels.
    pub texture_width: u32,
    pub _pad: [u32; 3],
}

impl Default for BaseUniforms {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY.to_cols_array_2d(),
            world_offset: [0.0; 4],
            mesh_translation: [0.0; 4],
            min_value: 0.0,
            max_value: 1.0,
            opacity: 1.0,
            hole_count: 0,
            texture_width: 1,
            _pad: [0; 3],
        }
    }
}

impl BaseUniforms {
    /// Reads the base values out of a uniform set; missing entries keep
    /// their defaults.
    pub fn from_set(set: &UniformSet) -> Self {
        let mut out = Self::default();
        let f = |name: &str| set.get(name).and_then(|v| v.as_f32());
        let u = |name: &str| set.get(name).and_then(|v| v.as_u32());
        let v3 = |name: &str| set.get(name).and_then(|v| v.as_vec3());

        if let Some(m) = set.get(VIEW_PROJECTION).and_then(|v| v.as_mat4()) {
            out.view_projection = m.to_cols_array_2d();
        }
        if let Some(v) = v3(WORLD_OFFSET) {
            out.world_offset = v.extend(0.0).to_array();
        }
        if let Some(v) = v3(MESH_TRANSLATION) {
            out.mesh_translation = v.extend(0.0).to_array();
        }
        out.min_value = f(MIN_VALUE).unwrap_or(out.min_value);
        out.max_value = f(MAX_VALUE).unwrap_or(out.max_value);
        out.opacity = f(OPACITY).unwrap_or(out.opacity);
        out.hole_count = u(HOLE_COUNT).unwrap_or(out.hole_count);
        out.texture_width = u(TEXTURE_WIDTH).unwrap_or(out.texture_width);
        out
    }

    /// Copy with the camera replaced, used by off-screen passes.
    #[must_use]
    pub fn with_camera(mut self, view_projection: Mat4, mesh_translation: Vec3) -> Self {
        self.view_projection = view_projection.to_cols_array_2d();
        self.mesh_translation = mesh_translation.extend(0.0).to_array();
        self
    }
}

/// Packs the model uniform block: one 16-byte slot per member, in program
/// order. Members missing from `set` stay zeroed.
pub fn model_block_bytes(program: &ProgramSource, set: &UniformSet) -> Vec<u8> {
    let mut bytes = vec![0u8; program.model_block_slots() * 16];
    for (i, name) in program.model_block.iter().enumerate() {
        if let Some(slot) = set.get(name).and_then(|v| v.to_slot()) {
            bytes[i * 16..(i + 1) * 16].copy_from_slice(&slot);
        }
    }
    bytes
}
