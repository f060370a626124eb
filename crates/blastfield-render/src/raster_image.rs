//! Flattened rasters and saving them to disk.

use std::path::Path;

use blastfield_core::Bounds2;
use image::RgbaImage;

/// A top-down raster of the analytics surface.
#[derive(Debug, Clone)]
pub struct FlattenResult {
    pub image: RgbaImage,
    /// World rectangle the image covers; row 0 is the north (max Y) edge.
    pub bounds: Bounds2,
    pub width: u32,
    pub height: u32,
    /// Resolution actually used, lower than requested if the size cap bound.
    pub pixels_per_metre: f64,
}

impl FlattenResult {
    /// Wraps tightly packed RGBA8 rows.
    pub fn from_rgba(
        data: Vec<u8>,
        width: u32,
        height: u32,
        bounds: Bounds2,
        pixels_per_metre: f64,
    ) -> Result<Self, RasterError> {
        let image = RgbaImage::from_raw(width, height, data).ok_or(RasterError::InvalidImageData)?;
        Ok(Self {
            image,
            bounds,
            width,
            height,
            pixels_per_metre,
        })
    }

    /// World XY of the centre of pixel `(x, y)`.
    pub fn pixel_center(&self, x: u32, y: u32) -> (f64, f64) {
        let sx = self.bounds.width() / f64::from(self.width);
        let sy = self.bounds.height() / f64::from(self.height);
        (
            self.bounds.min_x + (f64::from(x) + 0.5) * sx,
            self.bounds.max_y - (f64::from(y) + 0.5) * sy,
        )
    }

    /// Saves the raster; the format follows the extension (png, jpg, jpeg).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RasterError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "png" => {
                self.image.save_with_format(path, image::ImageFormat::Png)?;
            }
            "jpg" | "jpeg" => {
                // JPEG has no alpha
                let rgb = image::DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
                rgb.save_with_format(path, image::ImageFormat::Jpeg)?;
            }
            _ => return Err(RasterError::UnsupportedFormat(extension)),
        }
        log::info!("raster saved to {}", path.display());
        Ok(())
    }

    /// PNG-encoded bytes of the raster.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, RasterError> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, image::ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

/// Whether render targets of `format` can be read back as RGBA8.
pub fn is_readable_format(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Rgba8Unorm
            | wgpu::TextureFormat::Rgba8UnormSrgb
            | wgpu::TextureFormat::Bgra8Unorm
            | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}

/// Converts rows read back from a render target of `format` to RGBA8 in place.
///
/// Returns `false` for formats that are not 8-bit four-channel colour.
pub fn to_rgba_in_place(data: &mut [u8], format: wgpu::TextureFormat) -> bool {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => true,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
            for chunk in data.chunks_exact_mut(4) {
                chunk.swap(0, 2); // Swap B and R
            }
            true
        }
        _ => false,
    }
}

/// Error type for raster output.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid image data")]
    InvalidImageData,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_2x2() -> FlattenResult {
        let data = vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 0,
        ];
        FlattenResult::from_rgba(data, 2, 2, Bounds2::new(0.0, 0.0, 10.0, 10.0), 0.2).unwrap()
    }

    #[test]
    fn test_from_rgba_checks_length() {
        let short = FlattenResult::from_rgba(vec![0; 7], 2, 1, Bounds2::new(0.0, 0.0, 1.0, 1.0), 1.0);
        assert!(matches!(short, Err(RasterError::InvalidImageData)));
    }

    #[test]
    fn test_pixel_center_is_north_up() {
        let result = result_2x2();
        assert_eq!(result.pixel_center(0, 0), (2.5, 7.5));
        assert_eq!(result.pixel_center(1, 1), (7.5, 2.5));
    }

    #[test]
    fn test_bgra_swap() {
        let mut data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        assert!(to_rgba_in_place(&mut data, wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(data, vec![3, 2, 1, 4, 7, 6, 5, 8]);

        let mut data = vec![1, 2, 3, 4];
        assert!(to_rgba_in_place(&mut data, wgpu::TextureFormat::Rgba8Unorm));
        assert_eq!(data, vec![1, 2, 3, 4]);
        assert!(!to_rgba_in_place(&mut data, wgpu::TextureFormat::Rgba16Float));
        assert!(!is_readable_format(wgpu::TextureFormat::Rgba16Float));
        assert!(is_readable_format(wgpu::TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn test_png_bytes_and_unsupported_extension() {
        let result = result_2x2();
        let png = result.to_png_bytes().unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let err = result.save(std::env::temp_dir().join("blastfield_raster.bmp"));
        assert!(matches!(err, Err(RasterError::UnsupportedFormat(ext)) if ext == "bmp"));
    }

    #[test]
    fn test_save_png_round_trip() {
        let result = result_2x2();
        let path = std::env::temp_dir().join("blastfield_raster_test.png");
        result.save(&path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (2, 2));
        assert_eq!(loaded.get_pixel(1, 0).0, [0, 255, 0, 255]);
        let _ = std::fs::remove_file(&path);
    }
}
