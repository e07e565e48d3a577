//! Property tests for lighting frustum derivation
//!
//! Texture sizes must stay even and positive for any pixel density, and the
//! lighting camera must cover the padded main frustum to within one light
//! pixel.

use glam::{Vec2, Vec3};
use light2d::renderer::camera::snap_to_pixel_grid;
use light2d::systems::lighting::ambient_shift;
use light2d::{FrustumState, LightTextureSize, LightingConfig, MainCamera};
use proptest::prelude::*;

fn config(pixel_size: f32, size_add: f32) -> LightingConfig {
    LightingConfig {
        light_pixel_size: pixel_size,
        light_camera_size_add: size_add,
        ..Default::default()
    }
}

proptest! {
    /// Property: orthographic texture dimensions are even and positive
    #[test]
    fn orthographic_texture_size_is_even(
        pixel_size in prop_oneof![1e-12f32..1e-3, 0.001f32..2.0],
        size in 0.1f32..50.0,
        aspect in 0.25f32..4.0,
        size_add in 0.0f32..10.0,
    ) {
        let state = FrustumState::derive(&MainCamera::orthographic(size, aspect), &config(pixel_size, size_add));
        let t = state.texture_size;
        prop_assert!(t.width >= 2 && t.height >= 2);
        prop_assert_eq!(t.width % 2, 0);
        prop_assert_eq!(t.height % 2, 0);
    }

    /// Property: perspective texture dimensions are even and positive
    #[test]
    fn perspective_texture_size_is_even(
        pixel_size in 0.001f32..2.0,
        fov in 10.0f32..100.0,
        fov_add in 0.0f32..40.0,
        aspect in 0.25f32..4.0,
        distance in 0.5f32..50.0,
    ) {
        let cfg = LightingConfig {
            light_pixel_size: pixel_size,
            light_camera_fov_add: fov_add,
            light_obstacles_distance: distance,
            ..Default::default()
        };
        let t = FrustumState::derive(&MainCamera::perspective(fov, aspect), &cfg).texture_size;
        prop_assert!(t.width >= 2 && t.height >= 2);
        prop_assert_eq!(t.width % 2, 0);
        prop_assert_eq!(t.height % 2, 0);
    }

    /// Property: raw sizes of any magnitude round to even, never zero
    #[test]
    fn raw_sizes_round_to_even(w in -10.0f32..1e12, h in -10.0f32..1e12) {
        let t = LightTextureSize::from_raw(w, h);
        prop_assert!(t.width >= 2 && t.height >= 2);
        prop_assert!(t.width <= LightTextureSize::MAX_DIMENSION);
        prop_assert!(t.height <= LightTextureSize::MAX_DIMENSION);
        prop_assert!(t.scaled(2).is_some());
        prop_assert_eq!(t.width % 2, 0);
        prop_assert_eq!(t.height % 2, 0);
    }

    /// Property: orthographic lighting half-height is S + A within one light pixel
    #[test]
    fn orthographic_light_size_covers_padding(
        pixel_size in 0.005f32..0.25,
        size in 0.5f32..50.0,
        size_add in 0.0f32..10.0,
    ) {
        let state = FrustumState::derive(&MainCamera::orthographic(size, 1.0), &config(pixel_size, size_add));
        let error = (state.light_size - (size + size_add)).abs();
        prop_assert!(error <= pixel_size * 1.001, "error {} > pixel {}", error, pixel_size);
    }

    /// Property: snapping moves a camera by at most half a light pixel
    #[test]
    fn snapping_stays_within_half_a_pixel(
        x in -1000.0f32..1000.0,
        y in -1000.0f32..1000.0,
        pixel_size in 0.01f32..1.0,
    ) {
        let p = Vec3::new(x, y, -10.0);
        let snapped = snap_to_pixel_grid(p, 1.0 / pixel_size);
        prop_assert!((snapped.x - x).abs() <= pixel_size * 0.5 + 1e-3);
        prop_assert!((snapped.y - y).abs() <= pixel_size * 0.5 + 1e-3);
        prop_assert_eq!(snapped.z, -10.0);
    }

    /// Property: a still camera produces no ambient shift
    #[test]
    fn still_camera_has_zero_shift(
        pixel_size in 0.001f32..10.0,
        w in 1u32..2048,
        h in 1u32..2048,
    ) {
        let size = LightTextureSize::from_raw(w as f32, h as f32);
        prop_assert_eq!(ambient_shift(Vec2::ZERO, pixel_size, size), Vec2::ZERO);
    }

    /// Property: ambient shift never exceeds one texture per axis
    #[test]
    fn ambient_shift_is_bounded(
        dx in -1000.0f32..1000.0,
        dy in -1000.0f32..1000.0,
        pixel_size in 0.001f32..1.0,
    ) {
        let size = LightTextureSize { width: 64, height: 32 };
        let shift = ambient_shift(Vec2::new(dx, dy), pixel_size, size);
        prop_assert!(shift.x.abs() <= 1.0 && shift.y.abs() <= 1.0);
    }
}
