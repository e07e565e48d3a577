use crate::api::config::LightingConfig;
use crate::api::types::{TextureId, TRANSPARENT_BLACK};
use crate::error::BackendError;
use crate::renderer::buffer::{BufferPool, BufferSlot};
use crate::renderer::camera::{LightCamera, LightTextureSize};
use crate::renderer::stage::{ShadingStages, StageDraw, StageInputs, MAIN_TEX};
use crate::renderer::traits::GraphicsBackend;

/// Light-source buffer chosen for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightSourcesOutput {
    pub texture: TextureId,
    /// Whether `texture` is the blurred copy.
    pub blurred: bool,
}

/// Render the light-source layer and, when enabled, blur it.
///
/// The returned buffer is the one the compositor must use for the rest of
/// the frame.
pub fn render_light_sources<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    pool: &mut BufferPool,
    camera: &mut LightCamera,
    config: &LightingConfig,
    stages: &ShadingStages,
    size: LightTextureSize,
) -> Result<LightSourcesOutput, BackendError> {
    let raw = pool.ensure(backend, BufferSlot::LightSources, size.width, size.height)?;
    pool.discard(backend, BufferSlot::LightSources);
    camera.render_into(
        backend,
        raw,
        config.layers.light_sources_mask(),
        TRANSPARENT_BLACK,
        1,
    )?;
    pool.mark_written(BufferSlot::LightSources);

    let blur = match stages.light_sources_blur {
        Some(stage) if config.blur_light_sources => stage,
        _ => {
            return Ok(LightSourcesOutput {
                texture: raw,
                blurred: false,
            })
        }
    };

    let blurred = pool.ensure(backend, BufferSlot::LightSourcesBlurred, size.width, size.height)?;
    pool.discard(backend, BufferSlot::LightSourcesBlurred);
    let inputs = StageInputs::new().with_texture(MAIN_TEX, Some(raw));
    backend.blit(None, blurred, Some(StageDraw { stage: blur, inputs: &inputs }))?;
    pool.mark_written(BufferSlot::LightSourcesBlurred);

    Ok(LightSourcesOutput {
        texture: blurred,
        blurred: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::StageId;
    use crate::renderer::buffer::BufferFormat;
    use crate::renderer::headless::{Command, HeadlessBackend};
    use crate::renderer::traits::RenderTier;

    const SIZE: LightTextureSize = LightTextureSize { width: 16, height: 16 };
    const BLUR: StageId = StageId(3);

    fn backend() -> HeadlessBackend {
        let mut backend = HeadlessBackend::new(RenderTier::HdrSrgb);
        backend.register_stage(BLUR, |ctx| {
            let c = ctx.texture(MAIN_TEX);
            [c[0] * 0.5, c[1] * 0.5, c[2] * 0.5, c[3] * 0.5]
        });
        backend
    }

    fn stages() -> ShadingStages {
        ShadingStages {
            light_sources_blur: Some(BLUR),
            ..Default::default()
        }
    }

    #[test]
    fn blurred_buffer_is_allocated_lazily_and_used() {
        let mut backend = backend();
        let mut pool = BufferPool::new(BufferFormat::Extended);
        let mut cam = LightCamera::new();
        let config = LightingConfig::default();
        backend.set_layer_content(config.layers.light_sources, Some([1.0, 1.0, 1.0, 1.0]));

        let out = render_light_sources(&mut backend, &mut pool, &mut cam, &config, &stages(), SIZE).unwrap();
        assert!(out.blurred);
        assert_eq!(Some(out.texture), pool.texture(BufferSlot::LightSourcesBlurred));
        assert_eq!(backend.read(out.texture), Some([0.5, 0.5, 0.5, 0.5]));
        assert_eq!(backend.stage_invocations(BLUR), 1);
    }

    #[test]
    fn raw_buffer_is_used_without_blur_stage() {
        let mut backend = backend();
        let mut pool = BufferPool::new(BufferFormat::Extended);
        let mut cam = LightCamera::new();
        let config = LightingConfig::default();

        let out = render_light_sources(&mut backend, &mut pool, &mut cam, &config, &ShadingStages::default(), SIZE)
            .unwrap();
        assert!(!out.blurred);
        assert_eq!(Some(out.texture), pool.texture(BufferSlot::LightSources));
        assert!(pool.get(BufferSlot::LightSourcesBlurred).is_none());
    }

    #[test]
    fn blur_disabled_in_config_skips_stage() {
        let mut backend = backend();
        let mut pool = BufferPool::new(BufferFormat::Extended);
        let mut cam = LightCamera::new();
        let config = LightingConfig {
            blur_light_sources: false,
            ..Default::default()
        };
        let out = render_light_sources(&mut backend, &mut pool, &mut cam, &config, &stages(), SIZE).unwrap();
        assert!(!out.blurred);
        assert_eq!(backend.stage_invocations(BLUR), 0);
    }

    #[test]
    fn background_is_transparent_black() {
        let mut backend = backend();
        let mut pool = BufferPool::new(BufferFormat::Extended);
        let mut cam = LightCamera::new();
        let out = render_light_sources(
            &mut backend,
            &mut pool,
            &mut cam,
            &LightingConfig::default(),
            &ShadingStages::default(),
            SIZE,
        )
        .unwrap();
        assert_eq!(backend.read(out.texture), Some(TRANSPARENT_BLACK));
        assert!(backend
            .commands()
            .iter()
            .any(|c| matches!(c, Command::RenderLayer(p) if p.background == TRANSPARENT_BLACK)));
    }
}
