//! blastfield: GPU analytics rendering for blast-hole charge data.
//!
//! The engine shades a surface (a flat plane over a blast or an imported
//! terrain mesh) with a per-fragment physical model evaluated against every
//! charged hole, then draws it into a host render pass or flattens it to a
//! north-up raster.
//!
//! # Quick Start
//!
//! ```no_run
//! use blastfield::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!     let mut engine = AnalyticsEngine::new_headless(EngineOptions::default())?;
//!
//!     for model in engine.get_available_models() {
//!         println!("{} ({})", model.display_name, model.unit);
//!     }
//!
//!     engine.set_model("scaled_distance", &ModelParams::new())?;
//!     Ok(())
//! }
//! ```
//!
//! # Coordinates
//!
//! Hole and surface positions are world coordinates in `f64`. Before
//! anything reaches the GPU it is expressed relative to a [`WorldOffset`]
//! near the surface centre, so 32-bit shader math stays precise at
//! UTM-scale coordinates.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod engine;

pub use engine::{AnalyticsEngine, MeshHandle};

// Re-export core types
pub use blastfield_core::{
    error::{AnalyticsError, Result},
    models, Bounds2, ChargeDeck, DVec3, EncodeOptions, EngineOptions, Geometry, HoleField,
    HoleRecord, Mat4, ModelDefinition, ModelInfo, ModelParams, PackOutcome, PackedHoleTexture,
    PipelineTransition, RowUpdate, UniformSet, UniformValue, Vec2, Vec3, Vec4, WorldOffset,
    MAX_HOLE_CAPACITY,
};
pub use blastfield_core::AnalyticsModel;

// Re-export render types
pub use blastfield_render::{
    ColorMap, ColorMapRampFactory, ColorMapRegistry, ColourRampFactory, FlattenResult,
    GpuContext, RampTexture, RasterError, RenderError, DEPTH_FORMAT,
};

/// Initializes `env_logger` from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
