//! Sizing and camera for flattening the analytics surface to a 2D raster.

use glam::Mat4;

use crate::coords::{Bounds2, WorldOffset};
use crate::error::{AnalyticsError, Result};

/// Half-depth of the orthographic volume used for flattening, in local units.
const FLATTEN_DEPTH_RANGE: f32 = 10_000.0;

/// Pixel dimensions of a flatten raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
    /// Resolution actually used; lower than requested when the cap binds.
    pub pixels_per_metre: f64,
}

impl RasterSize {
    /// Computes `ceil(extent * pixels_per_metre)` per side, at least one
    /// pixel, scaling resolution down uniformly if a side would exceed
    /// `max_dimension`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn for_bounds(bounds: &Bounds2, pixels_per_metre: f64, max_dimension: u32) -> Result<Self> {
        bounds.validate()?;
        if !(pixels_per_metre.is_finite() && pixels_per_metre > 0.0) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "pixels per metre must be positive, got {pixels_per_metre}"
            )));
        }
        let (dx, dy) = (bounds.width(), bounds.height());
        if dx <= 0.0 || dy <= 0.0 {
            return Err(AnalyticsError::InvalidArgument(
                "flatten bounds have zero area".to_string(),
            ));
        }

        let max = f64::from(max_dimension.max(1));
        let mut ppm = pixels_per_metre;
        let longest = dx.max(dy) * ppm;
        if longest.ceil() > max {
            ppm *= max / longest;
            log::warn!(
                "flatten raster capped at {max_dimension}px; resolution reduced to {ppm:.4} px/m"
            );
        }

        let side = |extent: f64| ((extent * ppm).ceil().clamp(1.0, max)) as u32;
        Ok(Self {
            width: side(dx),
            height: side(dy),
            pixels_per_metre: ppm,
        })
    }
}

/// Top-down orthographic view-projection covering `bounds`, expressed in the
/// local frame of `offset`. North (max Y) maps to the first image row and
/// higher surfaces win the depth test.
#[allow(clippy::cast_possible_truncation)]
pub fn flatten_view_projection(bounds: &Bounds2, offset: WorldOffset) -> Mat4 {
    let o = offset.0;
    Mat4::orthographic_rh(
        (bounds.min_x - o.x) as f32,
        (bounds.max_x - o.x) as f32,
        (bounds.min_y - o.y) as f32,
        (bounds.max_y - o.y) as f32,
        -FLATTEN_DEPTH_RANGE,
        FLATTEN_DEPTH_RANGE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn test_size_from_resolution() {
        let bounds = Bounds2::new(0.0, 0.0, 120.5, 80.0);
        let size = RasterSize::for_bounds(&bounds, 1.0, 8192).unwrap();
        assert_eq!((size.width, size.height), (121, 80));

        let size = RasterSize::for_bounds(&bounds, 2.0, 8192).unwrap();
        assert_eq!((size.width, size.height), (241, 160));
        assert_eq!(size.pixels_per_metre, 2.0);
    }

    #[test]
    fn test_size_is_deterministic() {
        let bounds = Bounds2::new(478_000.0, 6_912_000.0, 478_333.3, 6_912_111.1);
        let a = RasterSize::for_bounds(&bounds, 0.75, 8192).unwrap();
        let b = RasterSize::for_bounds(&bounds, 0.75, 8192).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_size_cap() {
        let bounds = Bounds2::new(0.0, 0.0, 10_000.0, 5_000.0);
        let size = RasterSize::for_bounds(&bounds, 2.0, 4096).unwrap();
        assert_eq!(size.width, 4096);
        assert_eq!(size.height, 2048);
        assert!((size.pixels_per_metre - 0.4096).abs() < 1e-9);
    }

    #[test]
    fn test_size_rejects_bad_input() {
        let bounds = Bounds2::new(0.0, 0.0, 10.0, 10.0);
        assert!(RasterSize::for_bounds(&bounds, 0.0, 8192).is_err());
        assert!(RasterSize::for_bounds(&bounds, f64::INFINITY, 8192).is_err());
        assert!(RasterSize::for_bounds(&Bounds2::new(0.0, 0.0, 0.0, 10.0), 1.0, 8192).is_err());
    }

    #[test]
    fn test_flatten_projection_maps_bounds_to_clip() {
        let bounds = Bounds2::new(1000.0, 2000.0, 1100.0, 2050.0);
        let offset = WorldOffset::new(1050.0, 2025.0, 300.0);
        let vp = flatten_view_projection(&bounds, offset);

        let sw = vp * Vec4::new(-50.0, -25.0, 0.0, 1.0);
        let ne = vp * Vec4::new(50.0, 25.0, 0.0, 1.0);
        assert!((sw.truncate() - Vec3::new(-1.0, -1.0, sw.z)).abs().max_element() < 1e-5);
        assert!((ne.truncate() - Vec3::new(1.0, 1.0, ne.z)).abs().max_element() < 1e-5);

        let low = vp * Vec4::new(0.0, 0.0, -5.0, 1.0);
        let high = vp * Vec4::new(0.0, 0.0, 5.0, 1.0);
        assert!(high.z < low.z, "higher surfaces must be nearer");
        assert!((0.0..=1.0).contains(&low.z) && (0.0..=1.0).contains(&high.z));
    }
}
