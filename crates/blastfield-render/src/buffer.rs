//! GPU buffer management.

use glam::Vec3;
use wgpu::util::DeviceExt;

/// Creates a vertex buffer of tightly packed `vec3<f32>` positions.
pub fn create_position_buffer(
    device: &wgpu::Device,
    positions: &[Vec3],
    label: Option<&str>,
) -> wgpu::Buffer {
    let data: Vec<[f32; 3]> = positions.iter().map(|p| p.to_array()).collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: bytemuck::cast_slice(&data),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

/// Creates an index buffer from data.
pub fn create_index_buffer(
    device: &wgpu::Device,
    data: &[u32],
    label: Option<&str>,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
    })
}

/// Creates a uniform buffer from a `Pod` value.
pub fn create_uniform_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    data: &T,
    label: Option<&str>,
) -> wgpu::Buffer {
    create_uniform_buffer_from_bytes(device, bytemuck::bytes_of(data), label)
}

/// Creates a uniform buffer from raw bytes, for blocks whose layout is only
/// known at runtime.
pub fn create_uniform_buffer_from_bytes(
    device: &wgpu::Device,
    bytes: &[u8],
    label: Option<&str>,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: bytes,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}
