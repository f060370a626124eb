//! Rendering backend for blastfield.
//!
//! This crate owns every wgpu resource the analytics engine uses:
//! - the device/queue context, headless or borrowed from a host
//! - the hole data texture and colour-ramp textures
//! - compiled analytics programs and surface meshes
//! - the off-screen flatten pass and raster output

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod color_maps;
pub mod context;
pub mod error;
pub mod flatten_pass;
pub mod hole_texture;
pub mod mesh;
pub mod program;
pub mod raster_image;

pub use color_maps::{ColorMap, ColorMapRampFactory, ColorMapRegistry, ColourRampFactory, RampTexture};
pub use context::GpuContext;
pub use error::{RenderError, RenderResult};
pub use flatten_pass::Flattener;
pub use hole_texture::HoleTexture;
pub use mesh::AnalyticsMesh;
pub use program::{AnalyticsProgram, ProgramInputs, DEPTH_FORMAT};
pub use raster_image::{FlattenResult, RasterError};
