use crate::api::config::LightingConfig;
use crate::api::types::{TextureId, OBSTACLE_BACKGROUND};
use crate::error::BackendError;
use crate::renderer::buffer::{BufferPool, BufferSlot};
use crate::renderer::camera::{LightCamera, LightTextureSize};
use crate::renderer::traits::GraphicsBackend;

/// Render the obstacle layer into the obstacle mask and return the texture
/// downstream stages should sample.
///
/// With antialiasing the mask is drawn at 2x and box-filtered into a 1x
/// copy. Without it the 1x copy is dropped and the raw mask is returned.
pub fn render_obstacles<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    pool: &mut BufferPool,
    camera: &mut LightCamera,
    config: &LightingConfig,
    size: LightTextureSize,
) -> Result<TextureId, BackendError> {
    let supersample = config.obstacle_supersample();
    let (width, height) = size.scaled(supersample).ok_or(BackendError::Allocation {
        width: size.width.saturating_mul(supersample),
        height: size.height.saturating_mul(supersample),
        format: pool.format(),
    })?;
    let obstacles = pool.ensure(backend, BufferSlot::Obstacles, width, height)?;

    pool.discard(backend, BufferSlot::Obstacles);
    camera.render_into(
        backend,
        obstacles,
        config.layers.light_obstacles_mask(),
        OBSTACLE_BACKGROUND,
        supersample,
    )?;
    pool.mark_written(BufferSlot::Obstacles);

    if config.light_obstacles_antialiasing {
        let downsampled = pool.ensure(backend, BufferSlot::ObstaclesDownsampled, size.width, size.height)?;
        pool.discard(backend, BufferSlot::ObstaclesDownsampled);
        backend.blit(Some(obstacles), downsampled, None)?;
        pool.mark_written(BufferSlot::ObstaclesDownsampled);
    } else {
        pool.release(backend, BufferSlot::ObstaclesDownsampled);
    }

    Ok(obstacle_texture(pool).unwrap_or(obstacles))
}

/// The obstacle mask stages should read: the downsampled copy when there is
/// one, the raw mask otherwise.
pub fn obstacle_texture(pool: &BufferPool) -> Option<TextureId> {
    pool.texture(BufferSlot::ObstaclesDownsampled)
        .or_else(|| pool.texture(BufferSlot::Obstacles))
}
