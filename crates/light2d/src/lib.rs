pub mod api;
pub mod core;
pub mod components;
pub mod error;
pub mod systems;
pub mod renderer;

// Re-export key types at crate root for convenience
pub use api::config::LightingConfig;
pub use api::types::{Color, EntityId, Image, StageId, TextureId};
pub use components::entity::Entity;
pub use components::layer::{LayerMask, LightingLayers};
pub use components::light_sprite::{LightPayload, LightShape, LightSprite};
pub use core::scene::Scene;
pub use core::time::{FrameClock, FrameTime};
pub use error::{BackendError, LightingError};
pub use renderer::buffer::{BufferFormat, BufferPool, BufferSlot};
pub use renderer::camera::{
    FrustumState, LightCamera, LightTextureSize, MainCamera, Projection,
};
pub use renderer::headless::HeadlessBackend;
pub use renderer::instance::{LightGeometryBuffer, LightQuad, LightVertex};
pub use renderer::stage::{ShadingStages, StageInputs};
pub use renderer::traits::{GraphicsBackend, RenderTier, ShaderGlobals};
pub use systems::light_emitters::{build_light_geometry, publish_light_emitters};
pub use systems::lighting::{
    FramePipeline, FrameReport, LightingSystem, OverlayTransform, PreviewLighting,
};
