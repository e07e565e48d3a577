use crate::api::config::LightingConfig;
use crate::api::types::{Image, TextureId};
use crate::core::scene::Scene;
use crate::core::time::FrameTime;
use crate::error::LightingError;
use crate::renderer::buffer::{BufferFormat, BufferPool};
use crate::renderer::camera::{FrustumKey, FrustumState, LightCamera, LightTextureSize, MainCamera};
use crate::renderer::instance::LightGeometryBuffer;
use crate::renderer::stage::ShadingStages;
use crate::renderer::traits::{GlobalTexture, GraphicsBackend, ShaderGlobals};
use crate::systems::light_emitters::{build_light_geometry, publish_light_emitters};
use crate::systems::lighting::ambient::AmbientAccumulator;
use crate::systems::lighting::compositor::{composite, overlay_transform, OverlaySources};
use crate::systems::lighting::light_sources::render_light_sources;
use crate::systems::lighting::obstacles::render_obstacles;
use crate::systems::lighting::{pass_through, FramePipeline, FrameReport};

/// The lighting orchestrator.
///
/// Owns the buffer pool, both cameras and the derived frustum. The host
/// creates it once with [`LightingSystem::start`], calls
/// [`render_frame`](LightingSystem::render_frame) every frame and
/// [`shutdown`](LightingSystem::shutdown) on teardown.
pub struct LightingSystem {
    config: LightingConfig,
    stages: ShadingStages,
    main_camera: MainCamera,
    light_camera: Option<LightCamera>,
    enabled: bool,
    pool: BufferPool,
    frustum: Option<(FrustumKey, FrustumState)>,
    ambient: AmbientAccumulator,
    geometry: LightGeometryBuffer,
}

impl LightingSystem {
    /// Start lighting, failing if a required collaborator is missing.
    pub fn try_start<B: GraphicsBackend + ?Sized>(
        backend: &B,
        config: LightingConfig,
        stages: ShadingStages,
        main_camera: MainCamera,
        light_camera: Option<LightCamera>,
    ) -> Result<Self, LightingError> {
        let mut system = Self::inactive(config, stages, main_camera, light_camera);
        system.activate(backend)?;
        Ok(system)
    }

    /// Start lighting. A missing lighting camera or overlay stage is logged
    /// and yields a disabled system that passes frames through unchanged.
    pub fn start<B: GraphicsBackend + ?Sized>(
        backend: &B,
        config: LightingConfig,
        stages: ShadingStages,
        main_camera: MainCamera,
        light_camera: Option<LightCamera>,
    ) -> Self {
        let mut system = Self::inactive(config, stages, main_camera, light_camera);
        if let Err(err) = system.activate(backend) {
            log::error!("{}", err);
        }
        system
    }

    fn inactive(
        config: LightingConfig,
        stages: ShadingStages,
        main_camera: MainCamera,
        light_camera: Option<LightCamera>,
    ) -> Self {
        Self {
            config,
            stages,
            main_camera,
            light_camera,
            enabled: false,
            pool: BufferPool::new(BufferFormat::Standard),
            frustum: None,
            ambient: AmbientAccumulator::new(),
            geometry: LightGeometryBuffer::new(),
        }
    }

    fn activate<B: GraphicsBackend + ?Sized>(&mut self, backend: &B) -> Result<(), LightingError> {
        self.config.validate()?;
        let camera = self
            .light_camera
            .as_mut()
            .ok_or(LightingError::MissingLightCamera)?;
        self.stages.overlay.ok_or(LightingError::MissingOverlayStage)?;

        camera.auto_render = false;
        let format = BufferFormat::select(self.config.hdr, backend);
        self.pool = BufferPool::new(format);
        self.enabled = true;
        self.reconcile();
        log::info!(
            "lighting started on {} backend with {:?} buffers",
            backend.backend(),
            format
        );
        Ok(())
    }

    /// Re-derive the frustum if the camera configuration changed.
    fn reconcile(&mut self) -> bool {
        let key = FrustumKey::new(&self.main_camera, &self.config);
        if matches!(self.frustum, Some((current, _)) if current == key) {
            return false;
        }

        let state = FrustumState::derive(&self.main_camera, &self.config);
        if let Some(camera) = self.light_camera.as_mut() {
            state.apply_to(camera);
        }
        let resized = self
            .frustum
            .map_or(false, |(_, old)| old.texture_size != state.texture_size);
        if resized {
            self.ambient.reset_reference();
        }
        if state.texture_size.is_clamped() {
            log::warn!(
                "light_pixel_size {} needs buffers above {} px; the lighting frustum is cropped",
                self.config.light_pixel_size,
                LightTextureSize::MAX_DIMENSION
            );
        }
        log::info!(
            "lighting frustum: {}x{} light pixels, light half-height {:.3}",
            state.texture_size.width,
            state.texture_size.height,
            state.light_size
        );
        self.frustum = Some((key, state));
        true
    }

    /// Light `source` and write the result to `destination`.
    pub fn render_frame<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        source: Image,
        destination: Option<TextureId>,
        frame: FrameTime,
    ) -> Result<FrameReport, LightingError> {
        let overlay = match self.stages.overlay {
            Some(stage) if self.enabled => stage,
            _ => {
                pass_through(backend, source, destination)?;
                return Ok(FrameReport::passthrough(frame));
            }
        };

        let rederived = self.reconcile();
        let (state, camera) = match (self.frustum, self.light_camera.as_mut()) {
            (Some((_, state)), Some(camera)) => (state, camera),
            _ => {
                pass_through(backend, source, destination)?;
                return Ok(FrameReport::passthrough(frame));
            }
        };

        let config = &self.config;
        let ppu = config.pixels_per_unit();
        let size = state.texture_size;
        camera.follow(self.main_camera.position, ppu);

        let obstacles = render_obstacles(backend, &mut self.pool, camera, config, size)?;
        backend.set_globals(&ShaderGlobals {
            obstacle_texture: GlobalTexture::Texture(obstacles),
            pixels_per_unit: ppu,
            hdr: self.pool.format() == BufferFormat::Extended,
            perspective_camera: !state.orthographic,
        });

        let lights = render_light_sources(backend, &mut self.pool, camera, config, &self.stages, size)?;
        let ambient = self
            .ambient
            .accumulate(backend, &mut self.pool, camera, config, &self.stages, size)?;

        let transform = overlay_transform(&self.main_camera, camera, size, config);
        let sources = OverlaySources {
            ambient: ambient.map(|a| a.texture),
            light_sources: lights.texture,
        };
        composite(backend, &mut self.pool, overlay, sources, transform, source, destination)?;

        log::trace!(
            "lighting frame {}: ambient passes {}, offset {:?}",
            frame.index,
            ambient.map_or(0, |a| a.passes),
            transform.offset
        );

        Ok(FrameReport {
            frame,
            passthrough: false,
            rederived,
            obstacle_texture: Some(obstacles),
            light_sources_blurred: lights.blurred,
            ambient_passes: ambient.map_or(0, |a| a.passes),
            lights_uploaded: 0,
            transform: Some(transform),
        })
    }

    /// Like [`render_frame`](LightingSystem::render_frame), but first
    /// republishes the scene's light emitters and uploads the quads of the
    /// ones that changed on the light-source and ambient layers.
    pub fn render_scene<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        scene: &mut Scene,
        source: Image,
        destination: Option<TextureId>,
        frame: FrameTime,
    ) -> Result<FrameReport, LightingError> {
        let mut uploaded = 0;
        if self.enabled && self.stages.overlay.is_some() {
            publish_light_emitters(scene, false);
            build_light_geometry(scene, self.config.layers.emissive_mask(), &mut self.geometry);
            uploaded = self.geometry.len();
            if uploaded > 0 {
                backend.upload_light_geometry(self.geometry.quads());
            }
        }
        let report = self.render_frame(backend, source, destination, frame)?;
        Ok(FrameReport {
            lights_uploaded: uploaded,
            ..report
        })
    }

    /// Replace the configuration. Frustum changes apply on the next frame;
    /// a change of HDR preference releases every buffer.
    pub fn configure<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        config: LightingConfig,
    ) -> Result<(), LightingError> {
        config.validate()?;
        if self.enabled && config.hdr != self.config.hdr {
            let format = BufferFormat::select(config.hdr, backend);
            if format != self.pool.format() {
                log::info!("lighting buffers switch to {:?}", format);
                self.pool.set_format(backend, format);
                self.ambient.reset_reference();
            }
        }
        self.config = config;
        Ok(())
    }

    /// Run `count` extra ambient propagation passes next frame.
    pub fn request_extra_ambient_iterations(&mut self, count: u32) {
        self.ambient.request_extra_iterations(count);
    }

    pub fn shutdown<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        let live = self.pool.live_buffers();
        self.pool.release_all(backend);
        self.ambient.reset_reference();
        self.frustum = None;
        log::info!("lighting shut down, released {} buffers", live);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    pub fn stages(&self) -> &ShadingStages {
        &self.stages
    }

    pub fn main_camera(&self) -> &MainCamera {
        &self.main_camera
    }

    /// The host moves and zooms the main camera through this.
    pub fn main_camera_mut(&mut self) -> &mut MainCamera {
        &mut self.main_camera
    }

    pub fn light_camera(&self) -> Option<&LightCamera> {
        self.light_camera.as_ref()
    }

    pub fn frustum(&self) -> Option<&FrustumState> {
        self.frustum.as_ref().map(|(_, state)| state)
    }

    pub fn texture_size(&self) -> Option<LightTextureSize> {
        self.frustum().map(|s| s.texture_size)
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn ambient(&self) -> &AmbientAccumulator {
        &self.ambient
    }
}

impl FramePipeline for LightingSystem {
    fn render_frame(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        source: Image,
        destination: Option<TextureId>,
        frame: FrameTime,
    ) -> Result<FrameReport, LightingError> {
        LightingSystem::render_frame(self, backend, source, destination, frame)
    }

    fn shutdown(&mut self, backend: &mut dyn GraphicsBackend) {
        LightingSystem::shutdown(self, backend)
    }
}
