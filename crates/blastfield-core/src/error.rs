//! Error types for blastfield.

use thiserror::Error;

/// The main error type for blastfield operations.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// `set_model` was called with a name that is not registered.
    #[error("unknown analytics model '{0}'")]
    UnknownModel(String),

    /// A registry lookup did not find the requested model.
    #[error("model '{0}' not found")]
    ModelNotFound(String),

    /// A model with the given name is already registered.
    #[error("model '{0}' already registered")]
    DuplicateModel(String),

    /// A model declares something the program assembler cannot express.
    #[error("invalid model '{model}': {reason}")]
    InvalidModel { model: String, reason: String },

    /// More holes than the packed texture can ever hold.
    #[error("hole count {requested} exceeds texture capacity {capacity}")]
    Capacity { requested: usize, capacity: usize },

    /// A single-hole update addressed a record that does not exist.
    #[error("hole index {index} out of range for {count} holes")]
    HoleIndexOutOfRange { index: usize, count: usize },

    /// An operation needs state (model, mesh, GPU resources) that does not exist yet.
    #[error("engine not ready: {0}")]
    NotReady(&'static str),

    /// A caller-supplied argument is outside its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// GPU-side failure.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for blastfield operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
