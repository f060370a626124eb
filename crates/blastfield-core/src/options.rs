//! Configuration options for blastfield.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How hole records are turned into texture records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncodeOptions {
    /// Encode the toe position instead of the collar.
    pub use_toe_location: bool,
    /// Write hidden holes as empty records. Off by default: the engine
    /// encodes exactly what it is given.
    pub skip_hidden: bool,
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Padding added around plan bounds by `build_plane` when none is given.
    pub plane_padding: f64,

    /// Upper bound on plane subdivisions per side.
    pub max_plane_segments: u32,

    /// Resolution used by `flatten` when none is given.
    pub default_pixels_per_metre: f64,

    /// Largest flatten raster side in pixels.
    pub max_raster_dimension: u32,

    /// Surface opacity applied when a model is selected.
    pub opacity: f32,

    /// World position of the host scene's local origin.
    pub scene_origin: DVec3,

    /// Encoding used by `update` and `update_single_hole`.
    pub encode: EncodeOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            plane_padding: 50.0,
            max_plane_segments: 256,
            default_pixels_per_metre: 1.0,
            max_raster_dimension: 8192,
            opacity: 1.0,
            scene_origin: DVec3::ZERO,
            encode: EncodeOptions::default(),
        }
    }
}

impl EngineOptions {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = EngineOptions::from_json_str(
            r#"{"planePadding": 25.0, "sceneOrigin": [478000.0, 6912000.0, 0.0], "encode": {"useToeLocation": true}}"#,
        )
        .unwrap();
        assert_eq!(options.plane_padding, 25.0);
        assert_eq!(options.scene_origin, DVec3::new(478_000.0, 6_912_000.0, 0.0));
        assert!(options.encode.use_toe_location);
        assert!(!options.encode.skip_hidden);
        assert_eq!(options.max_plane_segments, 256);
    }

    #[test]
    fn test_json_round_trip() {
        let options = EngineOptions::default();
        let json = options.to_json_string().unwrap();
        assert_eq!(EngineOptions::from_json_str(&json).unwrap(), options);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineOptions::from_json_file("/nonexistent/blastfield.json").unwrap_err();
        assert!(matches!(err, crate::AnalyticsError::IoError(_)));
    }
}
