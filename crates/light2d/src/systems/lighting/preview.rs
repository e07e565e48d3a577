//! Lighting preview for authoring tools.
//!
//! Draws nothing: lit objects see the white obstacle texture and the frame
//! is copied through. The lighting camera still tracks the main camera with
//! the configured padding, so tools can show the lighting frustum.

use crate::api::config::LightingConfig;
use crate::api::types::{Image, TextureId};
use crate::core::time::FrameTime;
use crate::error::LightingError;
use crate::renderer::buffer::BufferFormat;
use crate::renderer::camera::{LightCamera, MainCamera, Projection};
use crate::renderer::traits::{GraphicsBackend, ShaderGlobals};
use crate::systems::lighting::{pass_through, FramePipeline, FrameReport};

pub struct PreviewLighting {
    config: LightingConfig,
    main_camera: MainCamera,
    light_camera: Option<LightCamera>,
}

impl PreviewLighting {
    pub fn new(config: LightingConfig, main_camera: MainCamera, light_camera: Option<LightCamera>) -> Self {
        Self {
            config,
            main_camera,
            light_camera,
        }
    }

    /// Pad the lighting camera around the main camera.
    pub fn sync_light_camera(&mut self) {
        let Some(camera) = self.light_camera.as_mut() else {
            return;
        };
        camera.position = self.main_camera.position;
        camera.aspect = self.main_camera.aspect;
        match self.main_camera.projection {
            Projection::Orthographic { size } => {
                camera.orthographic = true;
                camera.orthographic_size = size + self.config.light_camera_size_add;
            }
            Projection::Perspective { fov } => {
                camera.orthographic = false;
                camera.field_of_view = fov + self.config.light_camera_fov_add;
            }
        }
    }

    pub fn render_frame<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        source: Image,
        destination: Option<TextureId>,
        frame: FrameTime,
    ) -> Result<FrameReport, LightingError> {
        self.sync_light_camera();
        backend.set_globals(&ShaderGlobals {
            hdr: self.config.hdr && backend.supports_format(BufferFormat::Extended),
            perspective_camera: !self.main_camera.projection.is_orthographic(),
            ..ShaderGlobals::unoccluded(self.config.pixels_per_unit())
        });
        pass_through(backend, source, destination)?;
        Ok(FrameReport::passthrough(frame))
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LightingConfig) {
        self.config = config;
    }

    pub fn main_camera_mut(&mut self) -> &mut MainCamera {
        &mut self.main_camera
    }

    pub fn light_camera(&self) -> Option<&LightCamera> {
        self.light_camera.as_ref()
    }
}

impl FramePipeline for PreviewLighting {
    fn render_frame(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        source: Image,
        destination: Option<TextureId>,
        frame: FrameTime,
    ) -> Result<FrameReport, LightingError> {
        PreviewLighting::render_frame(self, backend, source, destination, frame)
    }

    fn shutdown(&mut self, _backend: &mut dyn GraphicsBackend) {}
}
