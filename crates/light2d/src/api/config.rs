use serde::{Deserialize, Serialize};

use crate::components::layer::LightingLayers;
use crate::error::LightingError;

/// Lighting configuration, set once by the host or loaded from JSON.
///
/// Changing any value at runtime (through `LightingSystem::configure`)
/// re-derives the lighting frustum and buffer sizes on the next frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// World-space size of one lighting pixel. Smaller is sharper and slower.
    pub light_pixel_size: f32,
    /// Extra half-height (world units) added to an orthographic lighting camera,
    /// so lights just off screen still reach visible geometry. Set it to the
    /// radius of the largest light.
    pub light_camera_size_add: f32,
    /// Extra field of view (degrees) added to a perspective lighting camera.
    pub light_camera_fov_add: f32,
    /// Run the temporal ambient light pass.
    pub enable_ambient_light: bool,
    /// Blur the light sources buffer when a blur stage is available.
    pub blur_light_sources: bool,
    /// Blur the ambient buffer after every propagation pass when a blur stage is available.
    pub blur_ambient_light: bool,
    /// Prefer extended-range buffers. Ignored when the device lacks support.
    pub hdr: bool,
    /// Render obstacles at 2x and downsample.
    pub light_obstacles_antialiasing: bool,
    /// Distance from a perspective camera to the obstacle plane.
    pub light_obstacles_distance: f32,
    /// Layers holding each kind of lighting geometry.
    pub layers: LightingLayers,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_pixel_size: 0.05,
            light_camera_size_add: 3.0,
            light_camera_fov_add: 30.0,
            enable_ambient_light: true,
            blur_light_sources: true,
            blur_ambient_light: true,
            hdr: true,
            light_obstacles_antialiasing: true,
            light_obstacles_distance: 10.0,
            layers: LightingLayers::default(),
        }
    }
}

impl LightingConfig {
    /// Parse and validate a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, LightingError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Lighting pixels per world unit.
    pub fn pixels_per_unit(&self) -> f32 {
        1.0 / self.light_pixel_size
    }

    /// Supersampling factor of the obstacle pass.
    pub fn obstacle_supersample(&self) -> u32 {
        if self.light_obstacles_antialiasing {
            2
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<(), LightingError> {
        if !(self.light_pixel_size.is_finite() && self.light_pixel_size > 0.0) {
            return Err(LightingError::InvalidConfig(format!(
                "light_pixel_size must be positive, got {}",
                self.light_pixel_size
            )));
        }
        if !(self.light_camera_size_add.is_finite() && self.light_camera_size_add >= 0.0) {
            return Err(LightingError::InvalidConfig(format!(
                "light_camera_size_add must be non-negative, got {}",
                self.light_camera_size_add
            )));
        }
        if !(self.light_camera_fov_add.is_finite() && self.light_camera_fov_add >= 0.0) {
            return Err(LightingError::InvalidConfig(format!(
                "light_camera_fov_add must be non-negative, got {}",
                self.light_camera_fov_add
            )));
        }
        if !(self.light_obstacles_distance.is_finite() && self.light_obstacles_distance > 0.0) {
            return Err(LightingError::InvalidConfig(format!(
                "light_obstacles_distance must be positive, got {}",
                self.light_obstacles_distance
            )));
        }
        if let Some(layer) = self.layers.out_of_range() {
            return Err(LightingError::InvalidConfig(format!(
                "layer index {} is out of range",
                layer
            )));
        }
        Ok(())
    }
}
