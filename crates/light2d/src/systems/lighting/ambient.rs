//! Temporal ambient light.
//!
//! The ambient field persists across frames. Each pass feeds the previous
//! field, the freshly rendered ambient emitters and a camera-motion shift
//! to the ambient-compute stage, which spreads light a little further. The
//! shift keeps the field fixed in world space while the camera scrolls.

use glam::Vec2;

use crate::api::config::LightingConfig;
use crate::api::types::{TextureId, TRANSPARENT_BLACK};
use crate::error::BackendError;
use crate::renderer::buffer::{BufferPool, BufferSlot};
use crate::renderer::camera::{LightCamera, LightTextureSize};
use crate::renderer::stage::{
    ShadingStages, StageDraw, StageInputs, LIGHT_SOURCES_TEX, MAIN_TEX, SHIFT,
};
use crate::renderer::traits::GraphicsBackend;

/// Result of a frame's ambient accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientOutput {
    /// Latest ambient field.
    pub texture: TextureId,
    /// Propagation passes run this frame (1 + extra iterations).
    pub passes: u32,
    /// Shift applied by the first pass.
    pub shift: Vec2,
}

/// Camera-motion compensation in texture UV units.
///
/// Displacement is converted to light pixels, then to UV. Each component is
/// clamped to one full texture: anything beyond that has scrolled entirely
/// out of the field anyway.
pub fn ambient_shift(displacement: Vec2, pixel_size: f32, size: LightTextureSize) -> Vec2 {
    let shift = displacement / pixel_size / size.as_vec2();
    let clamped = shift.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    if clamped != shift {
        log::debug!("ambient shift {:?} clamped to {:?}", shift, clamped);
    }
    clamped
}

/// Per-frame state of the ambient field. Its buffers live in the
/// orchestrator's [`BufferPool`].
#[derive(Debug, Clone, Default)]
pub struct AmbientAccumulator {
    pending_extra: u32,
    reference: Option<Vec2>,
}

impl AmbientAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `count` extra propagation passes next frame. Requests from
    /// several callers in one frame add up.
    pub fn request_extra_iterations(&mut self, count: u32) {
        self.pending_extra = self.pending_extra.saturating_add(count);
    }

    pub fn pending(&self) -> u32 {
        self.pending_extra
    }

    /// Camera position the next shift is measured from.
    pub fn reference(&self) -> Option<Vec2> {
        self.reference
    }

    /// Forget the reference position, e.g. after buffers were reallocated.
    pub fn reset_reference(&mut self) {
        self.reference = None;
    }

    /// Run this frame's ambient passes. Returns `None` when ambient light is
    /// off or no compute stage is configured; pending requests then wait.
    pub fn accumulate<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        pool: &mut BufferPool,
        camera: &mut LightCamera,
        config: &LightingConfig,
        stages: &ShadingStages,
        size: LightTextureSize,
    ) -> Result<Option<AmbientOutput>, BackendError> {
        let camera_pos = camera.position.truncate();
        let compute = match stages.ambient_compute {
            Some(stage) if config.enable_ambient_light => stage,
            _ => {
                self.reference = Some(camera_pos);
                return Ok(None);
            }
        };

        let mut current = pool.ensure(backend, BufferSlot::AmbientCurrent, size.width, size.height)?;
        let mut previous = pool.ensure(backend, BufferSlot::AmbientPrevious, size.width, size.height)?;
        let emission = pool.ensure(backend, BufferSlot::AmbientEmission, size.width, size.height)?;

        pool.discard(backend, BufferSlot::AmbientEmission);
        camera.render_into(
            backend,
            emission,
            config.layers.ambient_light_mask(),
            TRANSPARENT_BLACK,
            1,
        )?;
        pool.mark_written(BufferSlot::AmbientEmission);

        let blur = stages.ambient_blur.filter(|_| config.blur_ambient_light);
        let displacement = camera_pos - self.reference.unwrap_or(camera_pos);
        let first_shift = ambient_shift(displacement, config.light_pixel_size, size);
        let passes = self.pending_extra.saturating_add(1);

        for pass in 0..passes {
            pool.swap(BufferSlot::AmbientCurrent, BufferSlot::AmbientPrevious);
            std::mem::swap(&mut current, &mut previous);
            // Camera motion is measured once per frame; later passes only
            // propagate further.
            let shift = if pass == 0 { first_shift } else { Vec2::ZERO };

            let inputs = StageInputs::new()
                .with_texture(LIGHT_SOURCES_TEX, Some(emission))
                .with_texture(MAIN_TEX, Some(previous))
                .with_vector(SHIFT, shift);
            pool.discard(backend, BufferSlot::AmbientCurrent);
            backend.blit(None, current, Some(StageDraw { stage: compute, inputs: &inputs }))?;
            pool.mark_written(BufferSlot::AmbientCurrent);

            if let Some(blur) = blur {
                let inputs = StageInputs::new().with_texture(MAIN_TEX, Some(current));
                pool.discard(backend, BufferSlot::AmbientPrevious);
                backend.blit(None, previous, Some(StageDraw { stage: blur, inputs: &inputs }))?;
                pool.mark_written(BufferSlot::AmbientPrevious);
                pool.swap(BufferSlot::AmbientCurrent, BufferSlot::AmbientPrevious);
                std::mem::swap(&mut current, &mut previous);
            }
        }

        self.reference = Some(camera_pos);
        self.pending_extra = 0;
        log::trace!("ambient light: {} passes, shift {:?}", passes, first_shift);

        Ok(Some(AmbientOutput {
            texture: current,
            passes,
            shift: first_shift,
        }))
    }
}
