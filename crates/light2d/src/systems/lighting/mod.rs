//! Screen-space 2D lighting.
//!
//! Each frame the lighting camera renders three layers at light-pixel
//! resolution (obstacles, light sources, ambient emitters), the ambient
//! field is propagated, and the overlay stage composites everything over
//! the scene image.

pub mod ambient;
pub mod compositor;
pub mod light_sources;
pub mod obstacles;
pub mod preview;
pub mod system;

pub use ambient::{ambient_shift, AmbientAccumulator, AmbientOutput};
pub use compositor::{composite, overlay_transform, OverlaySources, OverlayTransform};
pub use light_sources::{render_light_sources, LightSourcesOutput};
pub use obstacles::{obstacle_texture, render_obstacles};
pub use preview::PreviewLighting;
pub use system::LightingSystem;

use crate::api::types::{Image, TextureId};
use crate::core::time::FrameTime;
use crate::error::{BackendError, LightingError};
use crate::renderer::traits::GraphicsBackend;

/// What a frame did. Returned by [`FramePipeline::render_frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: FrameTime,
    /// The source was copied unchanged.
    pub passthrough: bool,
    /// The lighting frustum was re-derived this frame.
    pub rederived: bool,
    pub obstacle_texture: Option<TextureId>,
    pub light_sources_blurred: bool,
    /// Ambient propagation passes run; 0 when ambient light is off.
    pub ambient_passes: u32,
    /// Light quads re-uploaded before the light-source pass.
    pub lights_uploaded: usize,
    pub transform: Option<OverlayTransform>,
}

impl FrameReport {
    pub fn passthrough(frame: FrameTime) -> Self {
        Self {
            frame,
            passthrough: true,
            rederived: false,
            obstacle_texture: None,
            light_sources_blurred: false,
            ambient_passes: 0,
            lights_uploaded: 0,
            transform: None,
        }
    }
}

/// Per-frame entry point shared by the lit pipeline and the preview.
///
/// The host calls `render_frame` once per frame after the scene image is
/// rendered. `destination` is `None` when the result is not shown.
pub trait FramePipeline {
    fn render_frame(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        source: Image,
        destination: Option<TextureId>,
        frame: FrameTime,
    ) -> Result<FrameReport, LightingError>;

    /// Release every buffer the pipeline owns.
    fn shutdown(&mut self, backend: &mut dyn GraphicsBackend);
}

/// Copy `source` to `destination` unchanged.
pub fn pass_through<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    source: Image,
    destination: Option<TextureId>,
) -> Result<(), BackendError> {
    match destination {
        Some(dest) if dest != source.texture => {
            backend.discard_contents(dest);
            backend.blit(Some(source.texture), dest, None)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessBackend;
    use crate::renderer::traits::RenderTier;

    #[test]
    fn pass_through_copies_source() {
        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let source = backend.create_image(4, 4, [0.1, 0.2, 0.3, 1.0]);
        let dest = backend.create_image(4, 4, [0.0; 4]).texture;
        pass_through(&mut backend, source, Some(dest)).unwrap();
        assert_eq!(backend.read(dest), Some([0.1, 0.2, 0.3, 1.0]));
    }

    #[test]
    fn pass_through_onto_itself_is_a_no_op() {
        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let source = backend.create_image(4, 4, [1.0; 4]);
        pass_through(&mut backend, source, Some(source.texture)).unwrap();
        pass_through(&mut backend, source, None).unwrap();
        assert!(backend.commands().is_empty());
        assert_eq!(backend.read(source.texture), Some([1.0; 4]));
    }
}
