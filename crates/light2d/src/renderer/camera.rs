use glam::{Vec2, Vec3};

use crate::api::config::LightingConfig;
use crate::api::types::{Color, TextureId, TRANSPARENT_BLACK};
use crate::components::layer::LayerMask;
use crate::error::BackendError;
use crate::renderer::traits::{CameraView, GraphicsBackend, LayerPass};

/// Projection of the main (game) camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// `size` is the half-height of the view in world units.
    Orthographic { size: f32 },
    /// `fov` is the vertical field of view in degrees.
    Perspective { fov: f32 },
}

impl Projection {
    pub fn is_orthographic(&self) -> bool {
        matches!(self, Projection::Orthographic { .. })
    }
}

/// The camera that renders the scene the lighting is composited over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainCamera {
    pub position: Vec3,
    pub projection: Projection,
    /// Width / height of the screen.
    pub aspect: f32,
}

impl MainCamera {
    pub fn orthographic(size: f32, aspect: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            projection: Projection::Orthographic { size },
            aspect,
        }
    }

    pub fn perspective(fov: f32, aspect: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            projection: Projection::Perspective { fov },
            aspect,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Move the camera in the view plane, keeping its depth.
    pub fn look_at(&mut self, target: Vec2) {
        self.position.x = target.x;
        self.position.y = target.y;
    }

    /// Half-height of the view where it meets the obstacle plane.
    /// Perspective cameras are flattened onto the plane at `obstacle_distance`.
    pub fn effective_orthographic_size(&self, obstacle_distance: f32) -> f32 {
        match self.projection {
            Projection::Orthographic { size } => size,
            Projection::Perspective { fov } => half_extent(fov, obstacle_distance),
        }
    }
}

/// Half-height of a frustum with vertical `fov` degrees at `distance`.
fn half_extent(fov: f32, distance: f32) -> f32 {
    (fov.to_radians() / 2.0).tan() * distance
}

/// Size of the 1x lighting buffers. Both dimensions are even, at least 2
/// and at most [`LightTextureSize::MAX_DIMENSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightTextureSize {
    pub width: u32,
    pub height: u32,
}

impl LightTextureSize {
    /// Largest dimension a lighting buffer is derived at. Even, so clamped
    /// sizes stay even.
    pub const MAX_DIMENSION: u32 = 32768;

    /// Round raw pixel extents to the nearest integers, then up to even.
    pub fn from_raw(width: f32, height: f32) -> Self {
        Self {
            width: even_dimension(width),
            height: even_dimension(height),
        }
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// UV size of one light pixel.
    pub fn texel_size(&self) -> Vec2 {
        Vec2::ONE / self.as_vec2()
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Dimensions at `factor` times the resolution; `None` on overflow.
    pub fn scaled(&self, factor: u32) -> Option<(u32, u32)> {
        Some((self.width.checked_mul(factor)?, self.height.checked_mul(factor)?))
    }

    /// Whether either dimension sits at [`MAX_DIMENSION`](Self::MAX_DIMENSION).
    pub fn is_clamped(&self) -> bool {
        self.width == Self::MAX_DIMENSION || self.height == Self::MAX_DIMENSION
    }
}

fn even_dimension(raw: f32) -> u32 {
    let max = LightTextureSize::MAX_DIMENSION;
    let rounded = if raw.is_nan() { 0 } else { raw.round().clamp(0.0, max as f32) as u32 };
    (rounded + rounded % 2).clamp(2, max)
}

/// Inputs that decide the lighting frustum. A change in any of them
/// re-derives the frustum and the buffer sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumKey {
    projection: Projection,
    aspect: f32,
    size_add: f32,
    fov_add: f32,
    pixel_size: f32,
    obstacle_distance: f32,
}

impl FrustumKey {
    pub fn new(main: &MainCamera, config: &LightingConfig) -> Self {
        Self {
            projection: main.projection,
            aspect: main.aspect,
            size_add: config.light_camera_size_add,
            fov_add: config.light_camera_fov_add,
            pixel_size: config.light_pixel_size,
            obstacle_distance: config.light_obstacles_distance,
        }
    }
}

/// Derived geometry of the lighting camera relative to the main camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumState {
    pub orthographic: bool,
    /// Main camera half-height, flattened onto the obstacle plane if perspective.
    pub main_size: f32,
    /// Main camera field of view (perspective only).
    pub main_fov: Option<f32>,
    pub aspect: f32,
    /// Lighting camera half-height, aligned to whole light pixels.
    pub light_size: f32,
    /// Lighting camera field of view (perspective only).
    pub light_fov: Option<f32>,
    /// Lighting camera aspect; always the texture's aspect, not the screen's.
    pub light_aspect: f32,
    pub obstacle_distance: f32,
    pub texture_size: LightTextureSize,
}

impl FrustumState {
    pub fn derive(main: &MainCamera, config: &LightingConfig) -> Self {
        let ppu = config.pixels_per_unit();
        let distance = config.light_obstacles_distance;

        let (texture_size, main_fov, light_fov) = match main.projection {
            Projection::Orthographic { size } => {
                let raw_height = (size + config.light_camera_size_add) * 2.0;
                let raw_width = (size * main.aspect + config.light_camera_size_add) * 2.0;
                (LightTextureSize::from_raw(raw_width * ppu, raw_height * ppu), None, None)
            }
            Projection::Perspective { fov } => {
                let light_fov = fov + config.light_camera_fov_add;
                let light_extent = half_extent(light_fov, distance) * 2.0;
                let height = (light_extent / config.light_pixel_size).round();
                (
                    LightTextureSize::from_raw(height * main.aspect, height),
                    Some(fov),
                    Some(light_fov),
                )
            }
        };

        Self {
            orthographic: main.projection.is_orthographic(),
            main_size: main.effective_orthographic_size(distance),
            main_fov,
            aspect: main.aspect,
            light_size: texture_size.height as f32 / (2.0 * ppu),
            light_fov,
            light_aspect: texture_size.aspect(),
            obstacle_distance: distance,
            texture_size,
        }
    }

    /// Copy the derived projection onto the lighting camera.
    pub fn apply_to(&self, camera: &mut LightCamera) {
        camera.orthographic = self.orthographic;
        camera.orthographic_size = self.light_size;
        if let Some(fov) = self.light_fov {
            camera.field_of_view = fov;
        }
        camera.aspect = self.light_aspect;
    }
}

/// Round a world position to the light-pixel grid (xy only).
pub fn snap_to_pixel_grid(position: Vec3, pixels_per_unit: f32) -> Vec3 {
    Vec3::new(
        (position.x * pixels_per_unit).round() / pixels_per_unit,
        (position.y * pixels_per_unit).round() / pixels_per_unit,
        position.z,
    )
}

/// The offscreen camera that renders lighting layers.
///
/// It never renders on its own: each lighting pass points it at a target,
/// renders one layer and puts it back to the neutral state.
#[derive(Debug, Clone, PartialEq)]
pub struct LightCamera {
    pub position: Vec3,
    pub orthographic: bool,
    pub orthographic_size: f32,
    pub field_of_view: f32,
    pub aspect: f32,
    /// Whether the host's render loop may draw this camera by itself.
    pub auto_render: bool,
    pub target: Option<TextureId>,
    pub culling_mask: LayerMask,
    pub background: Color,
}

impl LightCamera {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            orthographic: true,
            orthographic_size: 5.0,
            field_of_view: 60.0,
            aspect: 1.0,
            auto_render: true,
            target: None,
            culling_mask: LayerMask::NONE,
            background: TRANSPARENT_BLACK,
        }
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            position: self.position,
            orthographic: self.orthographic,
            orthographic_size: self.orthographic_size,
            field_of_view: self.field_of_view,
            aspect: self.aspect,
        }
    }

    /// Follow the main camera, snapped to whole light pixels so the lighting
    /// buffers do not shimmer while the camera moves.
    pub fn follow(&mut self, main_position: Vec3, pixels_per_unit: f32) {
        self.position = snap_to_pixel_grid(main_position, pixels_per_unit);
    }

    /// Target none, empty culling mask, transparent black background.
    pub fn is_neutral(&self) -> bool {
        self.target.is_none()
            && self.culling_mask.is_empty()
            && self.background == TRANSPARENT_BLACK
    }

    /// Render `mask` into `target`, then restore the neutral state.
    pub fn render_into<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        target: TextureId,
        mask: LayerMask,
        background: Color,
        supersample: u32,
    ) -> Result<(), BackendError> {
        self.auto_render = false;
        self.target = Some(target);
        self.culling_mask = mask;
        self.background = background;

        let pass = LayerPass {
            view: self.view(),
            culling_mask: mask,
            background,
            target,
            supersample,
        };
        let result = backend.render_layer(&pass);

        self.target = None;
        self.culling_mask = LayerMask::NONE;
        self.background = TRANSPARENT_BLACK;
        result
    }
}

impl Default for LightCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::OBSTACLE_BACKGROUND;
    use crate::renderer::headless::HeadlessBackend;
    use crate::renderer::traits::RenderTier;

    #[test]
    fn orthographic_texture_size_matches_padded_frustum() {
        let config = LightingConfig::default(); // 20 px/unit, +3 units
        let main = MainCamera::orthographic(5.0, 16.0 / 9.0);
        let state = FrustumState::derive(&main, &config);

        // (5 + 3) * 2 * 20 = 320; (5 * 16/9 + 3) * 2 * 20 = 475.6 -> 476
        assert_eq!(state.texture_size, LightTextureSize { width: 476, height: 320 });
        assert!((state.light_size - 8.0).abs() < 1e-4);
        assert!((state.light_aspect - 476.0 / 320.0).abs() < 1e-6);
        assert_eq!(state.main_size, 5.0);
    }

    #[test]
    fn odd_sizes_are_bumped_to_even() {
        assert_eq!(LightTextureSize::from_raw(101.2, 99.0), LightTextureSize { width: 102, height: 100 });
        assert_eq!(LightTextureSize::from_raw(0.2, 0.0), LightTextureSize { width: 2, height: 2 });
    }

    #[test]
    fn tiny_pixel_size_clamps_to_even_maximum() {
        let config = LightingConfig {
            light_pixel_size: 1e-9,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let state = FrustumState::derive(&MainCamera::orthographic(5.0, 1.0), &config);
        let max = LightTextureSize::MAX_DIMENSION;
        assert_eq!(state.texture_size, LightTextureSize { width: max, height: max });
        assert!(state.texture_size.is_clamped());
        assert_eq!(LightTextureSize::from_raw(f32::INFINITY, f32::NAN).width, max);
        assert_eq!(LightTextureSize::from_raw(f32::INFINITY, f32::NAN).height, 2);
    }

    #[test]
    fn scaled_reports_overflow() {
        let size = LightTextureSize { width: 100, height: 60 };
        assert_eq!(size.scaled(2), Some((200, 120)));
        let huge = LightTextureSize { width: u32::MAX - 1, height: 2 };
        assert_eq!(huge.scaled(2), None);
    }

    #[test]
    fn perspective_flattens_onto_obstacle_plane() {
        let config = LightingConfig {
            light_camera_fov_add: 30.0,
            light_obstacles_distance: 10.0,
            light_pixel_size: 0.1,
            ..Default::default()
        };
        let main = MainCamera::perspective(60.0, 2.0);
        let state = FrustumState::derive(&main, &config);

        // tan(45deg) * 10 * 2 = 20 units -> 200 px high, 400 px wide.
        assert_eq!(state.texture_size, LightTextureSize { width: 400, height: 200 });
        assert_eq!(state.light_fov, Some(90.0));
        let expected_main = (30.0f32).to_radians().tan() * 10.0;
        assert!((state.main_size - expected_main).abs() < 1e-4);
        assert!((state.light_size - 10.0).abs() < 1e-4);
    }

    #[test]
    fn apply_sets_texture_aspect_on_light_camera() {
        let config = LightingConfig::default();
        let state = FrustumState::derive(&MainCamera::orthographic(4.0, 1.5), &config);
        let mut cam = LightCamera::new();
        state.apply_to(&mut cam);
        assert_eq!(cam.aspect, state.texture_size.aspect());
        assert_eq!(cam.orthographic_size, state.light_size);
        assert!(cam.orthographic);
    }

    #[test]
    fn frustum_key_tracks_projection_and_padding() {
        let config = LightingConfig::default();
        let a = FrustumKey::new(&MainCamera::orthographic(5.0, 1.0), &config);
        let moved = FrustumKey::new(
            &MainCamera::orthographic(5.0, 1.0).with_position(Vec3::new(9.0, 9.0, 0.0)),
            &config,
        );
        assert_eq!(a, moved);

        let padded = LightingConfig {
            light_camera_size_add: 4.0,
            ..Default::default()
        };
        assert_ne!(a, FrustumKey::new(&MainCamera::orthographic(5.0, 1.0), &padded));
        assert_ne!(a, FrustumKey::new(&MainCamera::perspective(60.0, 1.0), &config));
    }

    #[test]
    fn follow_snaps_to_light_pixels() {
        let mut cam = LightCamera::new();
        cam.follow(Vec3::new(1.013, -0.026, -10.0), 20.0);
        assert!((cam.position.x - 1.0).abs() < 1e-6);
        assert!((cam.position.y - -0.05).abs() < 1e-6);
        assert_eq!(cam.position.z, -10.0);
    }

    #[test]
    fn render_into_restores_neutral_state() {
        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let target = backend.create_image(4, 4, TRANSPARENT_BLACK).texture;
        let mut cam = LightCamera::new();
        cam.render_into(&mut backend, target, LayerMask::layer(10), OBSTACLE_BACKGROUND, 2)
            .unwrap();
        assert!(cam.is_neutral());
        assert!(!cam.auto_render);
        assert_eq!(backend.read(target), Some(OBSTACLE_BACKGROUND));
    }
}
