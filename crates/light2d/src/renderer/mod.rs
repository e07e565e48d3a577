pub mod buffer;
pub mod camera;
pub mod headless;
pub mod instance;
pub mod stage;
pub mod traits;

// Re-export key types for convenient access
pub use traits::{
    CameraView, GlobalTexture, GraphicsBackend, LayerPass, RenderTier, ShaderGlobals,
};
pub use buffer::{BufferFormat, BufferPool, BufferSlot, OffscreenBuffer};
pub use stage::{ShadingStages, StageDraw, StageInput, StageInputs};
