use glam::Vec2;

use crate::api::config::LightingConfig;
use crate::api::types::{Image, StageId, TextureId};
use crate::error::BackendError;
use crate::renderer::buffer::{BufferPool, BufferSlot};
use crate::renderer::camera::{LightCamera, LightTextureSize, MainCamera};
use crate::renderer::stage::{
    StageDraw, StageInputs, AMBIENT_LIGHT_TEX, GAME_TEX, LIGHT_SOURCES_TEX, OFFSET, SCALE,
};
use crate::renderer::traits::GraphicsBackend;

/// Maps main-camera screen UVs into lighting-camera UVs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    /// Offset in light UV units. Negated: the overlay samples against the
    /// direction the lighting camera is displaced.
    pub offset: Vec2,
    /// Size of the main frustum relative to the lighting frustum.
    pub scale: Vec2,
}

/// Reconcile the two camera frustums for this frame.
///
/// A perspective main camera gets its orthographic size re-derived from its
/// current field of view, so runtime zoom is honored.
pub fn overlay_transform(
    main: &MainCamera,
    light: &LightCamera,
    size: LightTextureSize,
    config: &LightingConfig,
) -> OverlayTransform {
    let ppu = config.pixels_per_unit();
    let world_offset = (light.position - main.position).truncate();
    let offset = size.texel_size() * (-world_offset * ppu);

    let x_diff = main.aspect / light.aspect;
    let main_size = main.effective_orthographic_size(config.light_obstacles_distance);
    let scale_y = main_size / light.orthographic_size;

    OverlayTransform {
        offset,
        scale: Vec2::new(scale_y * x_diff, scale_y),
    }
}

/// Textures feeding the overlay stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlaySources {
    /// `None` when ambient light is off.
    pub ambient: Option<TextureId>,
    pub light_sources: TextureId,
}

/// Composite the scene with the lighting into `destination`.
///
/// The overlay stage writes into a scratch buffer sized to the source image,
/// which is then copied to the destination. Without a destination the
/// result is discarded after the overlay pass.
pub fn composite<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    pool: &mut BufferPool,
    overlay: StageId,
    sources: OverlaySources,
    transform: OverlayTransform,
    source: Image,
    destination: Option<TextureId>,
) -> Result<(), BackendError> {
    let scratch = pool.ensure(backend, BufferSlot::ScreenScratch, source.width, source.height)?;

    let inputs = StageInputs::new()
        .with_texture(AMBIENT_LIGHT_TEX, sources.ambient)
        .with_texture(LIGHT_SOURCES_TEX, Some(sources.light_sources))
        .with_texture(GAME_TEX, Some(source.texture))
        .with_vector(OFFSET, transform.offset)
        .with_vector(SCALE, transform.scale);

    pool.discard(backend, BufferSlot::ScreenScratch);
    backend.blit(None, scratch, Some(StageDraw { stage: overlay, inputs: &inputs }))?;
    pool.mark_written(BufferSlot::ScreenScratch);

    if let Some(dest) = destination {
        backend.blit(Some(scratch), dest, None)?;
    }
    Ok(())
}
