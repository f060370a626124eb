//! World-space bounds and the world-to-local offset.
//!
//! Real blast plans sit at UTM-scale coordinates (hundreds of thousands of
//! metres). GPU fragment math is 32-bit, so every object rendered by the
//! engine is expressed relative to a [`WorldOffset`] close to its centre.

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// An axis-aligned rectangle in world XY.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds2 {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds2 {
    /// Creates bounds from explicit extents.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest bounds containing all points, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Centre of the rectangle.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Returns the bounds grown by `padding` on every side.
    #[must_use]
    pub fn expanded(&self, padding: f64) -> Self {
        Self::new(
            self.min_x - padding,
            self.min_y - padding,
            self.max_x + padding,
            self.max_y + padding,
        )
    }

    /// Rejects non-finite or inverted bounds.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(AnalyticsError::InvalidArgument(format!(
                "bounds must be finite: {self:?}"
            )));
        }
        if self.max_x < self.min_x || self.max_y < self.min_y {
            return Err(AnalyticsError::InvalidArgument(format!(
                "bounds are inverted: {self:?}"
            )));
        }
        Ok(())
    }
}

/// World-space anchor that maps to local (0, 0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldOffset(pub DVec3);

impl WorldOffset {
    pub const ZERO: Self = Self(DVec3::ZERO);

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(DVec3::new(x, y, z))
    }

    /// Converts a world position into the local frame.
    ///
    /// The subtraction happens in `f64`; only the small result is narrowed.
    pub fn to_local(&self, world: DVec3) -> Vec3 {
        (world - self.0).as_vec3()
    }

    /// Converts a local position back into world space.
    pub fn to_world(&self, local: Vec3) -> DVec3 {
        self.0 + local.as_dvec3()
    }

    /// Translation placing an object built around this offset into a host
    /// scene whose own local origin sits at `scene_origin`.
    pub fn translation_from(&self, scene_origin: DVec3) -> Vec3 {
        (self.0 - scene_origin).as_vec3()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_local_keeps_precision_at_utm_scale() {
        let offset = WorldOffset::new(478_123.0, 6_912_345.0, 310.0);
        let world = DVec3::new(478_123.125, 6_912_345.25, 312.5);
        let local = offset.to_local(world);
        assert_eq!(local, Vec3::new(0.125, 0.25, 2.5));
    }

    #[test]
    fn test_bounds_expanded_and_center() {
        let b = Bounds2::new(0.0, 0.0, 100.0, 100.0).expanded(10.0);
        assert_eq!(b, Bounds2::new(-10.0, -10.0, 110.0, 110.0));
        assert_eq!(b.center(), (50.0, 50.0));
        assert_eq!(b.width(), 120.0);
    }

    #[test]
    fn test_bounds_validate() {
        assert!(Bounds2::new(0.0, 0.0, 1.0, 1.0).validate().is_ok());
        assert!(Bounds2::new(1.0, 0.0, 0.0, 1.0).validate().is_err());
        assert!(Bounds2::new(f64::NAN, 0.0, 1.0, 1.0).validate().is_err());
    }

    #[test]
    fn test_bounds_from_points() {
        let b = Bounds2::from_points([
            DVec3::new(3.0, -1.0, 0.0),
            DVec3::new(-2.0, 4.0, 9.0),
        ])
        .unwrap();
        assert_eq!(b, Bounds2::new(-2.0, -1.0, 3.0, 4.0));
        assert!(Bounds2::from_points(std::iter::empty()).is_none());
    }
}
