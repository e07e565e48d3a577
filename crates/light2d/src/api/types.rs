/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

/// Backend handle for a texture: an offscreen buffer or a host-owned image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Backend handle for a shading stage (a compiled fragment program plus its state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(pub u32);

/// Linear RGBA color.
pub type Color = [f32; 4];

/// Clear color of the obstacle buffer: white means "nothing blocks light here".
pub const OBSTACLE_BACKGROUND: Color = [1.0, 1.0, 1.0, 0.0];

/// Clear color of every light buffer: no light, no contribution.
pub const TRANSPARENT_BLACK: Color = [0.0, 0.0, 0.0, 0.0];

/// A host-owned image, e.g. the rendered scene handed to the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Image {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn new(texture: TextureId, width: u32, height: u32) -> Self {
        Self { texture, width, height }
    }
}
