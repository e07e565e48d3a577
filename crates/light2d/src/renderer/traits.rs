//! Backend contract for the lighting pipeline.
//!
//! The pipeline never touches a GPU API directly. A backend (wgpu, Metal,
//! the bundled headless backend) implements [`GraphicsBackend`] and the
//! lighting system drives it pass by pass.

use glam::Vec3;

use crate::api::types::{Color, TextureId};
use crate::components::layer::LayerMask;
use crate::error::BackendError;
use crate::renderer::buffer::BufferFormat;
use crate::renderer::instance::LightQuad;
use crate::renderer::stage::StageDraw;

/// Render tier indicating GPU capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTier {
    /// HDR with Extended Dynamic Range.
    HdrEdr,
    /// HDR within sRGB gamut (half-float targets, no EDR output).
    HdrSrgb,
    /// Standard Dynamic Range (8-bit targets only).
    Sdr,
    /// Software fallback.
    Software,
}

impl RenderTier {
    /// Whether half-float offscreen targets are available.
    pub fn supports_extended_range(self) -> bool {
        matches!(self, RenderTier::HdrEdr | RenderTier::HdrSrgb)
    }
}

/// Snapshot of the lighting camera used for one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub orthographic: bool,
    /// Half-height of the view in world units.
    pub orthographic_size: f32,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub aspect: f32,
}

/// One camera render of a set of scene layers into an offscreen buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerPass {
    pub view: CameraView,
    pub culling_mask: LayerMask,
    /// Color the target is cleared to before drawing.
    pub background: Color,
    pub target: TextureId,
    /// Supersampling factor the target was allocated with (1 or 2).
    pub supersample: u32,
}

/// Texture bound to the global obstacle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalTexture {
    /// Built-in white texture: no occlusion anywhere.
    White,
    Texture(TextureId),
}

/// Values every light-related shader can read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderGlobals {
    pub obstacle_texture: GlobalTexture,
    pub pixels_per_unit: f32,
    /// Buffers use the extended-range format.
    pub hdr: bool,
    /// Main camera uses a perspective projection.
    pub perspective_camera: bool,
}

impl ShaderGlobals {
    /// Globals that leave every shaded object fully lit.
    pub fn unoccluded(pixels_per_unit: f32) -> Self {
        Self {
            obstacle_texture: GlobalTexture::White,
            pixels_per_unit,
            hdr: false,
            perspective_camera: false,
        }
    }
}

/// Graphics backend driven by the lighting system.
///
/// All calls happen on the render thread in pipeline order. Handles
/// returned by `create_buffer` stay valid until `release_buffer`.
pub trait GraphicsBackend {
    /// Backend identifier (e.g., "wgpu", "metal", "headless").
    fn backend(&self) -> &'static str;

    /// Current render tier based on hardware capabilities.
    fn tier(&self) -> RenderTier;

    fn supports_format(&self, format: BufferFormat) -> bool {
        match format {
            BufferFormat::Standard => true,
            BufferFormat::Extended => self.tier().supports_extended_range(),
        }
    }

    fn create_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: BufferFormat,
    ) -> Result<TextureId, BackendError>;

    fn release_buffer(&mut self, texture: TextureId);

    /// Mark a texture's contents as undefined ahead of a full overwrite.
    fn discard_contents(&mut self, texture: TextureId);

    /// Replace the light geometry of each entity in `quads`. Entities not
    /// listed keep what was uploaded for them before.
    fn upload_light_geometry(&mut self, quads: &[LightQuad]);

    fn render_layer(&mut self, pass: &LayerPass) -> Result<(), BackendError>;

    /// Copy `source` into `target`, through `stage` when given. A stage may
    /// run without a source and read only its named inputs.
    fn blit(
        &mut self,
        source: Option<TextureId>,
        target: TextureId,
        stage: Option<StageDraw<'_>>,
    ) -> Result<(), BackendError>;

    fn set_globals(&mut self, globals: &ShaderGlobals);
}
