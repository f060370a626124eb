//! Vertex and index buffers of the analytics surface.

use blastfield_core::{Geometry, WorldOffset};

use crate::buffer::{create_index_buffer, create_position_buffer};

/// Bytes per vertex: a tightly packed `vec3<f32>` position.
pub const VERTEX_STRIDE: u64 = 12;

/// Vertex layout read by `vs_main`.
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
    wgpu::VertexBufferLayout {
        array_stride: VERTEX_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// GPU resources for one surface.
pub struct AnalyticsMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    /// Frame the vertex positions are relative to.
    pub world_offset: WorldOffset,
}

impl AnalyticsMesh {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(device: &wgpu::Device, geometry: &Geometry, world_offset: WorldOffset) -> Self {
        Self {
            vertex_buffer: create_position_buffer(
                device,
                &geometry.positions,
                Some("analytics mesh vertices"),
            ),
            index_buffer: create_index_buffer(
                device,
                &geometry.indices,
                Some("analytics mesh indices"),
            ),
            num_indices: geometry.indices.len() as u32,
            world_offset,
        }
    }

    pub fn num_triangles(&self) -> u32 {
        self.num_indices / 3
    }

    /// Frees the GPU buffers.
    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_position_stride() {
        let layout = vertex_buffer_layout();
        assert_eq!(layout.array_stride, 3 * 4);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(layout.attributes[0].shader_location, 0);
    }
}
