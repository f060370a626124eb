//! Off-screen pass rendering the analytics surface into a readable raster.

use crate::error::{RenderError, RenderResult};
use crate::mesh::AnalyticsMesh;
use crate::program::{AnalyticsProgram, DEPTH_FORMAT};
use crate::raster_image::{is_readable_format, to_rgba_in_place};

const BYTES_PER_PIXEL: u32 = 4;

/// Calculates bytes per row with proper alignment for wgpu buffer copies.
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Reusable colour, depth and readback resources for one raster size.
pub struct Flattener {
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    readback: wgpu::Buffer,
}

impl Flattener {
    /// Allocates targets of `width` x `height` in `format`, which must be an
    /// 8-bit RGBA or BGRA colour format.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        if !is_readable_format(format) {
            return Err(RenderError::UnsupportedTargetFormat(format));
        }
        let max = device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::TextureCreationFailed(format!(
                "flatten target {width}x{height} outside 1..={max}"
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("flatten color texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("flatten depth texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("flatten readback buffer"),
            size: u64::from(aligned_bytes_per_row(width)) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        log::debug!("created {width}x{height} flatten target ({format:?})");

        Ok(Self {
            format,
            width,
            height,
            color_view: color_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            color_texture,
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_texture,
            readback,
        })
    }

    /// Whether this helper can be reused for the given target.
    pub fn matches(&self, format: wgpu::TextureFormat, width: u32, height: u32) -> bool {
        self.format == format && self.width == width && self.height == height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Draws `mesh` with `program` onto a transparent background and returns
    /// tightly packed RGBA8 rows, top row first.
    ///
    /// The program's base uniforms must already hold the flatten camera.
    #[allow(clippy::cast_possible_truncation)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        program: &AnalyticsProgram,
        mesh: &AnalyticsMesh,
    ) -> RenderResult<Vec<u8>> {
        if program.target_format() != self.format {
            return Err(RenderError::PipelineCreationFailed(format!(
                "program targets {:?}, flatten target is {:?}",
                program.target_format(),
                self.format
            )));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("flatten encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("flatten render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            program.draw(&mut render_pass, mesh);
        }

        let bytes_per_row = aligned_bytes_per_row(self.width);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| RenderError::BufferMapFailed)?
            .map_err(|_| RenderError::BufferMapFailed)?;

        // Copy data, removing row padding
        let data = buffer_slice.get_mapped_range();
        let row_bytes = (self.width * BYTES_PER_PIXEL) as usize;
        let mut pixels = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height {
            let start = (row * bytes_per_row) as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }
        drop(data);
        self.readback.unmap();

        to_rgba_in_place(&mut pixels, self.format);
        Ok(pixels)
    }

    /// Frees the off-screen textures and readback buffer.
    pub fn dispose(&self) {
        self.color_texture.destroy();
        self.depth_texture.destroy();
        self.readback.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
        assert_eq!(aligned_bytes_per_row(121), 512);
    }
}
