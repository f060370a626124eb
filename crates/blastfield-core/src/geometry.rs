//! Target geometry for the analytics surface.

use glam::{DVec3, Vec3};

use crate::coords::{Bounds2, WorldOffset};
use crate::error::{AnalyticsError, Result};

/// A triangle mesh in the local frame of some [`WorldOffset`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Creates geometry from local positions and a triangle list.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        let geometry = Self { positions, indices };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Recentres a world-space surface around its bounding-box centre.
    ///
    /// Returns the local geometry together with the offset it is relative to.
    pub fn from_world_surface(
        vertices: &[DVec3],
        triangles: &[[u32; 3]],
    ) -> Result<(Self, WorldOffset)> {
        let Some(first) = vertices.first() else {
            return Err(AnalyticsError::InvalidArgument(
                "surface has no vertices".to_string(),
            ));
        };
        let (min, max) = vertices
            .iter()
            .fold((*first, *first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let offset = WorldOffset((min + max) * 0.5);

        let positions = vertices.iter().map(|v| offset.to_local(*v)).collect();
        let indices = triangles.iter().flatten().copied().collect();
        Ok((Self::new(positions, indices)?, offset))
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space axis-aligned bounds, `None` when empty.
    pub fn local_bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Rejects geometry that cannot be drawn: no triangles, a partial
    /// triangle, or an index past the last vertex.
    pub fn validate(&self) -> Result<()> {
        if self.indices.is_empty() {
            return Err(AnalyticsError::InvalidArgument(
                "geometry has no triangles".to_string(),
            ));
        }
        if self.indices.len() % 3 != 0 {
            return Err(AnalyticsError::InvalidArgument(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let count = self.positions.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= count) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "index {bad} out of range for {count} vertices"
            )));
        }
        Ok(())
    }
}

/// A plane built over plan bounds.
#[derive(Debug, Clone)]
pub struct PlaneBuild {
    pub geometry: Geometry,
    /// Plane centre at the requested elevation.
    pub world_offset: WorldOffset,
    /// Padded world rectangle the plane covers.
    pub world_bounds: Bounds2,
    /// Subdivisions per side.
    pub segments: u32,
}

/// Subdivisions per side for a plane of the given size: one segment per two
/// units of the longer side, capped at `max_segments`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn plane_segments(width: f64, height: f64, max_segments: u32) -> u32 {
    let wanted = (width.max(height) / 2.0).ceil().max(1.0);
    (wanted.min(f64::from(max_segments)) as u32).max(1)
}

/// Builds a subdivided rectangle covering `bounds` expanded by `padding`.
///
/// The plane is centred on its own world centre so that vertex positions
/// stay small; that centre (at `elevation`) becomes the world offset.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn build_plane(
    bounds: &Bounds2,
    elevation: f64,
    padding: f64,
    max_segments: u32,
) -> Result<PlaneBuild> {
    bounds.validate()?;
    if !padding.is_finite() || padding < 0.0 {
        return Err(AnalyticsError::InvalidArgument(format!(
            "padding must be a non-negative number, got {padding}"
        )));
    }

    let padded = bounds.expanded(padding);
    let (width, height) = (padded.width(), padded.height());
    if width <= 0.0 || height <= 0.0 {
        return Err(AnalyticsError::InvalidArgument(
            "plane would have zero area".to_string(),
        ));
    }

    let segments = plane_segments(width, height, max_segments);
    let (cx, cy) = padded.center();
    let world_offset = WorldOffset::new(cx, cy, elevation);

    let n = segments as usize;
    let (half_w, half_h) = ((width * 0.5) as f32, (height * 0.5) as f32);
    let step_x = width as f32 / segments as f32;
    let step_y = height as f32 / segments as f32;

    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    for row in 0..=n {
        for col in 0..=n {
            positions.push(Vec3::new(
                -half_w + col as f32 * step_x,
                -half_h + row as f32 * step_y,
                0.0,
            ));
        }
    }

    let mut indices = Vec::with_capacity(n * n * 6);
    let stride = segments + 1;
    for row in 0..segments {
        for col in 0..segments {
            let a = row * stride + col;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    log::debug!(
        "built {segments}x{segments} plane over {width:.1} x {height:.1} at {:?}",
        world_offset.0
    );

    Ok(PlaneBuild {
        geometry: Geometry { positions, indices },
        world_offset,
        world_bounds: padded,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_covers_padded_bounds() {
        let plane = build_plane(&Bounds2::new(0.0, 0.0, 100.0, 100.0), 0.0, 10.0, 256).unwrap();

        assert_eq!(plane.world_offset, WorldOffset::new(50.0, 50.0, 0.0));
        assert_eq!(plane.world_bounds, Bounds2::new(-10.0, -10.0, 110.0, 110.0));

        let (lo, hi) = plane.geometry.local_bounds().unwrap();
        assert_eq!(lo, Vec3::new(-60.0, -60.0, 0.0));
        assert!((hi - Vec3::new(60.0, 60.0, 0.0)).abs().max_element() < 1e-4);

        let world_lo = plane.world_offset.to_world(lo);
        let world_hi = plane.world_offset.to_world(hi);
        assert_eq!((world_lo.x, world_lo.y), (-10.0, -10.0));
        assert!((world_hi.x - 110.0).abs() < 1e-4 && (world_hi.y - 110.0).abs() < 1e-4);
    }

    #[test]
    fn test_plane_segment_policy() {
        assert_eq!(plane_segments(120.0, 80.0, 256), 60);
        assert_eq!(plane_segments(121.0, 80.0, 256), 61);
        assert_eq!(plane_segments(5000.0, 10.0, 256), 256);
        assert_eq!(plane_segments(0.5, 0.5, 256), 1);

        let plane = build_plane(&Bounds2::new(0.0, 0.0, 100.0, 100.0), 0.0, 10.0, 256).unwrap();
        assert_eq!(plane.segments, 60);
        assert_eq!(plane.geometry.positions.len(), 61 * 61);
        assert_eq!(plane.geometry.triangle_count(), 60 * 60 * 2);
    }

    #[test]
    fn test_plane_elevation_and_utm_precision() {
        let bounds = Bounds2::new(478_000.0, 6_912_000.0, 478_200.0, 6_912_100.0);
        let plane = build_plane(&bounds, 312.5, 50.0, 256).unwrap();
        assert_eq!(plane.world_offset, WorldOffset::new(478_100.0, 6_912_050.0, 312.5));
        let (lo, _) = plane.geometry.local_bounds().unwrap();
        assert_eq!(lo, Vec3::new(-150.0, -100.0, 0.0));
    }

    #[test]
    fn test_plane_rejects_bad_input() {
        let bounds = Bounds2::new(0.0, 0.0, 10.0, 10.0);
        assert!(build_plane(&bounds, 0.0, -1.0, 256).is_err());
        assert!(build_plane(&Bounds2::new(0.0, 0.0, 0.0, 0.0), 0.0, 0.0, 256).is_err());
    }

    #[test]
    fn test_from_world_surface_recentres() {
        let vertices = [
            DVec3::new(500_000.0, 7_000_000.0, 100.0),
            DVec3::new(500_010.0, 7_000_000.0, 102.0),
            DVec3::new(500_000.0, 7_000_020.0, 104.0),
        ];
        let (geometry, offset) = Geometry::from_world_surface(&vertices, &[[0, 1, 2]]).unwrap();
        assert_eq!(offset, WorldOffset::new(500_005.0, 7_000_010.0, 102.0));
        assert_eq!(geometry.positions[0], Vec3::new(-5.0, -10.0, -2.0));
        assert_eq!(geometry.indices, vec![0, 1, 2]);

        assert!(Geometry::from_world_surface(&vertices, &[[0, 1, 7]]).is_err());
        assert!(Geometry::from_world_surface(&[], &[]).is_err());
    }

    #[test]
    fn test_geometry_without_triangles_rejected() {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        assert!(matches!(
            Geometry::new(points.clone(), vec![]),
            Err(AnalyticsError::InvalidArgument(_))
        ));
        assert!(Geometry::from_world_surface(&[DVec3::ZERO, DVec3::X, DVec3::Y], &[]).is_err());

        let literal = Geometry {
            positions: points,
            indices: vec![],
        };
        assert!(literal.validate().is_err());
    }
}
