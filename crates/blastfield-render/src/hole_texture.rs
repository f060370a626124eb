//! GPU storage for the packed hole data texture.

use blastfield_core::encoder::{PackedHoleTexture, FLOATS_PER_TEXEL};

/// Texture format of hole records: one RGBA32F texel per four floats.
pub const HOLE_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

const BYTES_PER_TEXEL: u32 = (FLOATS_PER_TEXEL * std::mem::size_of::<f32>()) as u32;

/// GPU copy of a [`PackedHoleTexture`].
pub struct HoleTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl HoleTexture {
    /// Allocates a texture matching `packed` and uploads its contents.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, packed: &PackedHoleTexture) -> Self {
        let width = packed.width() as u32;
        let height = packed.height() as u32;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("hole data texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HOLE_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let hole_texture = Self {
            texture,
            view,
            width,
            height,
        };
        hole_texture.upload(queue, packed);
        log::debug!("allocated {width}x{height} hole texture");
        hole_texture
    }

    /// Whether `packed` fits this allocation exactly.
    #[allow(clippy::cast_possible_truncation)]
    pub fn matches(&self, packed: &PackedHoleTexture) -> bool {
        self.width == packed.width() as u32 && self.height == packed.height() as u32
    }

    /// Rewrites the whole texture.
    pub fn upload(&self, queue: &wgpu::Queue, packed: &PackedHoleTexture) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            packed.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * BYTES_PER_TEXEL),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Rewrites only the texels of record `index`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn upload_record(&self, queue: &wgpu::Queue, packed: &PackedHoleTexture, index: usize) {
        let (x, y) = packed.record_origin(index);
        let texels = packed.texels_per_hole() as u32;
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: x as u32,
                    y: y as u32,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(packed.record(index)),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texels * BYTES_PER_TEXEL),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: texels,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Texture width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frees the GPU allocation.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}
