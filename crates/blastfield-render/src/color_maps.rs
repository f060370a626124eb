//! Colour ramps and the textures the analytics fragment stage samples.

use std::collections::HashMap;

use glam::Vec3;

/// Texels across a ramp texture.
pub const RAMP_RESOLUTION: u32 = 256;

/// Ramp used when a requested name is unknown.
pub const FALLBACK_RAMP: &str = "viridis";

/// A piecewise-linear colour ramp over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub name: String,
    /// Evenly spaced colour stops.
    pub colors: Vec<Vec3>,
}

impl ColorMap {
    pub fn new(name: impl Into<String>, colors: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Samples the ramp at `t`, clamped to `[0, 1]`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn sample(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        match self.colors.len() {
            0 => Vec3::ZERO,
            1 => self.colors[0],
            len => {
                let n = len - 1;
                let scaled = t * n as f32;
                let idx = (scaled.floor() as usize).min(n - 1);
                self.colors[idx].lerp(self.colors[idx + 1], scaled - idx as f32)
            }
        }
    }

    /// Opaque RGBA8 texels, `width` samples from 0 to 1 inclusive.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn to_rgba8(&self, width: u32) -> Vec<u8> {
        let last = width.saturating_sub(1).max(1) as f32;
        (0..width)
            .flat_map(|i| {
                let c = self.sample(i as f32 / last);
                let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                [to_u8(c.x), to_u8(c.y), to_u8(c.z), 255]
            })
            .collect()
    }
}

/// Named colour ramps.
#[derive(Default)]
pub struct ColorMapRegistry {
    color_maps: HashMap<String, ColorMap>,
}

impl ColorMapRegistry {
    /// Creates a registry holding the default ramps.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register(ColorMap::new(
            "viridis",
            vec![
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.282, 0.140, 0.457),
                Vec3::new(0.253, 0.265, 0.529),
                Vec3::new(0.206, 0.371, 0.553),
                Vec3::new(0.163, 0.471, 0.558),
                Vec3::new(0.127, 0.566, 0.550),
                Vec3::new(0.134, 0.658, 0.517),
                Vec3::new(0.266, 0.749, 0.440),
                Vec3::new(0.477, 0.821, 0.318),
                Vec3::new(0.741, 0.873, 0.150),
                Vec3::new(0.993, 0.906, 0.144),
            ],
        ));

        self.register(ColorMap::new(
            "reds",
            vec![
                Vec3::new(1.000, 0.961, 0.941),
                Vec3::new(0.996, 0.878, 0.824),
                Vec3::new(0.988, 0.733, 0.631),
                Vec3::new(0.988, 0.573, 0.447),
                Vec3::new(0.984, 0.416, 0.290),
                Vec3::new(0.937, 0.231, 0.173),
                Vec3::new(0.796, 0.094, 0.114),
                Vec3::new(0.647, 0.059, 0.082),
                Vec3::new(0.404, 0.000, 0.051),
            ],
        ));

        self.register(ColorMap::new(
            "coolwarm",
            vec![
                Vec3::new(0.230, 0.299, 0.754),
                Vec3::new(0.552, 0.690, 0.996),
                Vec3::new(0.866, 0.866, 0.866),
                Vec3::new(0.956, 0.604, 0.486),
                Vec3::new(0.706, 0.016, 0.150),
            ],
        ));

        // Blue through red, the conventional vibration scale.
        self.register(ColorMap::new(
            "rainbow",
            vec![
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 0.5, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
        ));

        self.register(ColorMap::new(
            "greyscale",
            vec![Vec3::ZERO, Vec3::ONE],
        ));
    }

    /// Registers a ramp, replacing any with the same name.
    pub fn register(&mut self, color_map: ColorMap) {
        self.color_maps.insert(color_map.name.clone(), color_map);
    }

    pub fn get(&self, name: &str) -> Option<&ColorMap> {
        self.color_maps.get(name)
    }

    /// Registered ramp names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.color_maps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// A ramp uploaded to the GPU.
pub struct RampTexture {
    /// Name of the ramp actually uploaded, after any fallback.
    pub name: String,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Produces and releases colour-ramp textures by name.
pub trait ColourRampFactory {
    /// Creates the texture for `name`. Unknown names fall back to a default
    /// ramp; the returned texture reports the name it holds.
    fn create(&self, device: &wgpu::Device, queue: &wgpu::Queue, name: &str) -> RampTexture;

    /// Releases the texture's GPU memory.
    fn dispose(&self, ramp: RampTexture) {
        ramp.texture.destroy();
    }
}

/// [`ColourRampFactory`] backed by a [`ColorMapRegistry`].
#[derive(Default)]
pub struct ColorMapRampFactory {
    registry: ColorMapRegistry,
}

impl ColorMapRampFactory {
    pub fn new() -> Self {
        Self {
            registry: ColorMapRegistry::new(),
        }
    }

    pub fn with_registry(registry: ColorMapRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ColorMapRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ColorMapRegistry {
        &mut self.registry
    }

    /// The map used for `name`, after fallback.
    fn resolve(&self, name: &str) -> ColorMap {
        if let Some(map) = self.registry.get(name) {
            return map.clone();
        }
        log::warn!("unknown colour ramp '{name}', using '{FALLBACK_RAMP}'");
        self.registry
            .get(FALLBACK_RAMP)
            .cloned()
            .unwrap_or_else(|| ColorMap::new(FALLBACK_RAMP, vec![Vec3::ZERO, Vec3::ONE]))
    }
}

impl ColourRampFactory for ColorMapRampFactory {
    fn create(&self, device: &wgpu::Device, queue: &wgpu::Queue, name: &str) -> RampTexture {
        let map = self.resolve(name);
        let size = wgpu::Extent3d {
            width: RAMP_RESOLUTION,
            height: 1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("colour ramp texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &map.to_rgba8(RAMP_RESOLUTION),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(RAMP_RESOLUTION * 4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        RampTexture {
            name: map.name,
            texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_endpoints_and_midpoint() {
        let map = ColorMap::new("bw", vec![Vec3::ZERO, Vec3::ONE]);
        assert_eq!(map.sample(0.0), Vec3::ZERO);
        assert_eq!(map.sample(1.0), Vec3::ONE);
        assert_eq!(map.sample(0.5), Vec3::splat(0.5));
        assert_eq!(map.sample(-3.0), Vec3::ZERO);
        assert_eq!(map.sample(7.0), Vec3::ONE);
    }

    #[test]
    fn test_to_rgba8() {
        let map = ColorMap::new("bw", vec![Vec3::ZERO, Vec3::ONE]);
        let texels = map.to_rgba8(RAMP_RESOLUTION);
        assert_eq!(texels.len(), RAMP_RESOLUTION as usize * 4);
        assert_eq!(&texels[..4], &[0, 0, 0, 255]);
        assert_eq!(&texels[texels.len() - 4..], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_defaults_cover_builtin_model_ramps() {
        let registry = ColorMapRegistry::new();
        for name in ["rainbow", "viridis", "reds", "coolwarm"] {
            assert!(registry.get(name).is_some(), "missing ramp {name}");
        }
    }

    #[test]
    fn test_factory_fallback() {
        let factory = ColorMapRampFactory::new();
        assert_eq!(factory.resolve("no-such-ramp").name, FALLBACK_RAMP);
        assert_eq!(factory.resolve("reds").name, "reds");
    }
}
