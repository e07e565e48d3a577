use glam::{Mat4, Quat, Vec2, Vec3};
use crate::api::types::EntityId;
use crate::components::layer::LayerMask;
use crate::components::light_sprite::LightSprite;

/// A lit object: its transform plus an optional light sprite.
/// Gameplay state lives with the host; entities here only carry what the
/// light passes read.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Stable handle, unique within a scene.
    pub id: EntityId,
    /// Lookup name; need not be unique.
    pub tag: String,
    /// Inactive entities publish nothing.
    pub active: bool,
    /// World-space position of the sprite pivot.
    pub pos: Vec2,
    /// Distance along the view axis. Only matters under a perspective camera.
    pub depth: f32,
    /// Counter-clockwise rotation about Z, in radians.
    pub rotation: f32,
    /// Per-axis scale. Non-uniform scale is allowed.
    pub scale: Vec2,
    /// Scene layer the entity is drawn on (e.g. the light-obstacle layer).
    pub layer: u8,
    /// Light sprite (optional: only light sources carry one).
    pub light: Option<LightSprite>,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            pos: Vec2::ZERO,
            depth: 0.0,
            rotation: 0.0,
            scale: Vec2::ONE,
            layer: 0,
            light: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_light(mut self, light: LightSprite) -> Self {
        self.light = Some(light);
        self
    }

    /// Whether a camera culling with `mask` draws this entity.
    pub fn in_mask(&self, mask: LayerMask) -> bool {
        self.active && mask.contains(self.layer)
    }

    /// Local-to-world matrix.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.scale.x, self.scale.y, 1.0),
            Quat::from_rotation_z(self.rotation),
            self.pos.extend(self.depth),
        )
    }
}
