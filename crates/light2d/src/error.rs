use thiserror::Error;

use crate::api::types::{StageId, TextureId};
use crate::renderer::buffer::BufferFormat;

/// Failures reported by a [`GraphicsBackend`](crate::renderer::traits::GraphicsBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The device refused to create an offscreen buffer.
    #[error("backend cannot allocate a {width}x{height} {format:?} buffer")]
    Allocation {
        width: u32,
        height: u32,
        format: BufferFormat,
    },
    /// A texture handle that the backend does not know about (already released or never created).
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
    /// A shading stage handle with no registered program.
    #[error("unknown shading stage {0:?}")]
    UnknownStage(StageId),
}

/// Errors surfaced by the lighting pipeline.
#[derive(Debug, Error)]
pub enum LightingError {
    /// No lighting camera was supplied at start.
    #[error("lighting camera is not assigned; lighting is disabled")]
    MissingLightCamera,
    /// No overlay shading stage was supplied at start.
    #[error("light overlay shading stage is not assigned; lighting is disabled")]
    MissingOverlayStage,
    /// A configuration value is out of range.
    #[error("invalid lighting config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("failed to parse lighting config: {0}")]
    Json(#[from] serde_json::Error),
}
