//! Rendering error types.

use blastfield_core::AnalyticsError;
use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Shader compilation failed.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// Pipeline creation failed.
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),

    /// Texture creation failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// The render target format cannot be read back as 8-bit RGBA.
    #[error("unsupported target format for readback: {0:?}")]
    UnsupportedTargetFormat(wgpu::TextureFormat),

    /// Mapping a readback buffer failed.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for AnalyticsError {
    fn from(err: RenderError) -> Self {
        AnalyticsError::Render(err.to_string())
    }
}

impl From<crate::raster_image::RasterError> for AnalyticsError {
    fn from(err: crate::raster_image::RasterError) -> Self {
        match err {
            crate::raster_image::RasterError::IoError(io) => AnalyticsError::IoError(io),
            other => AnalyticsError::Render(other.to_string()),
        }
    }
}
