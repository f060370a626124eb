//! Core logic for blastfield.
//!
//! Everything here is GPU-free:
//! - [`AnalyticsModel`] and the [`ModelRegistry`] of named models
//! - [`HoleEncoder`] packing hole records into a data texture mirror
//! - [`PipelineState`] and WGSL [`ProgramSource`] assembly
//! - plane construction, world-offset handling and flatten sizing

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Hole and model names repeat the module name on purpose
#![allow(clippy::module_name_repetitions)]

pub mod coords;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod gpu_layout;
pub mod hole;
pub mod model;
pub mod models;
pub mod options;
pub mod params;
pub mod pipeline;
pub mod program;
pub mod raster;
pub mod registry;
pub mod uniforms;

pub use coords::{Bounds2, WorldOffset};
pub use encoder::{
    HoleEncoder, HoleLayout, PackOutcome, PackedHoleTexture, RowUpdate, MAX_HOLE_CAPACITY,
};
pub use error::{AnalyticsError, Result};
pub use geometry::{build_plane, Geometry, PlaneBuild};
pub use gpu_layout::{model_block_bytes, BaseUniforms};
pub use hole::{ChargeDeck, HoleRecord};
pub use model::{AnalyticsModel, HoleField, ModelDefinition, ModelInfo};
pub use options::{EncodeOptions, EngineOptions};
pub use params::ModelParams;
pub use pipeline::{BaseInputs, PipelineState, PipelineTransition};
pub use program::ProgramSource;
pub use raster::{flatten_view_projection, RasterSize};
pub use registry::ModelRegistry;
pub use uniforms::{Assign, TextureSlot, UniformKind, UniformSet, UniformValue};

// Re-export glam types for convenience
pub use glam::{DVec3, Mat4, Vec2, Vec3, Vec4};
