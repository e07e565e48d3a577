//! Light sprite component: the per-object side of the lighting pipeline.
//!
//! A light sprite is a quad on the light-sources layer. The shading stage
//! reconstructs falloff from the light's world-space origin, which the sprite
//! publishes per vertex. Positions are published in world space so that a
//! non-uniform scale on the owning transform cannot skew the shading math.

use glam::{Mat4, Vec2};

use crate::api::types::Color;

/// Shape of the light's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightShape {
    /// Light radiates from a single point.
    #[default]
    Point,
    /// Light radiates from a horizontal segment spanning the sprite's width.
    Line,
}

/// World-space origin data consumed by the light-source rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightPayload {
    Point(Vec2),
    Line { left: Vec2, right: Vec2 },
}

impl LightPayload {
    pub fn shape(&self) -> LightShape {
        match self {
            LightPayload::Point(_) => LightShape::Point,
            LightPayload::Line { .. } => LightShape::Line,
        }
    }

    /// Origin for each of the quad's 4 vertices.
    ///
    /// Line endpoints alternate left, right, left, right so that the
    /// shading stage can interpolate along the segment.
    pub fn vertex_positions(&self) -> [Vec2; 4] {
        match *self {
            LightPayload::Point(p) => [p; 4],
            LightPayload::Line { left, right } => [left, right, left, right],
        }
    }
}

/// A point or line light attached to an entity.
#[derive(Debug, Clone)]
pub struct LightSprite {
    /// Light origin in sprite-local units, where the sprite spans -0.5..0.5.
    pub origin: Vec2,
    pub shape: LightShape,
    /// Local bounds of the sprite image.
    pub size: Vec2,
    /// Part of a static geometry batch: positions are baked and never republished.
    pub static_batched: bool,
    color: Color,
    snapshot: Option<Snapshot>,
    payload: Option<LightPayload>,
    geometry_dirty: bool,
}

/// State at the last publish, used to skip redundant work.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Snapshot {
    model: Mat4,
    origin: Vec2,
    shape: LightShape,
}

impl LightSprite {
    pub fn new(shape: LightShape, size: Vec2) -> Self {
        Self {
            origin: Vec2::ZERO,
            shape,
            size,
            static_batched: false,
            color: [1.0, 1.0, 1.0, 1.0],
            snapshot: None,
            payload: None,
            geometry_dirty: false,
        }
    }

    pub fn point(size: Vec2) -> Self {
        Self::new(LightShape::Point, size)
    }

    pub fn line(size: Vec2) -> Self {
        Self::new(LightShape::Line, size)
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_static_batched(mut self, static_batched: bool) -> Self {
        self.static_batched = static_batched;
        self
    }

    /// Light tint; alpha is the intensity.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Change the tint. Vertex colors live next to the origins, so this
    /// schedules a geometry re-upload.
    pub fn set_color(&mut self, color: Color) {
        if self.color != color {
            self.color = color;
            self.geometry_dirty = true;
        }
    }

    /// Last published payload, if any.
    pub fn payload(&self) -> Option<&LightPayload> {
        self.payload.as_ref()
    }

    pub fn is_geometry_dirty(&self) -> bool {
        self.geometry_dirty
    }

    /// Consume the geometry-dirty flag. Returns true if the quad needs re-uploading.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.geometry_dirty)
    }

    /// Republish the light origin if the model matrix, origin or shape
    /// changed since the last publish (or `force` is set).
    ///
    /// Returns whether a new payload was published.
    pub fn update(&mut self, model: &Mat4, force: bool) -> bool {
        if self.static_batched {
            return false;
        }

        let current = Snapshot {
            model: *model,
            origin: self.origin,
            shape: self.shape,
        };
        if !force && self.snapshot == Some(current) {
            return false;
        }

        self.snapshot = Some(current);
        self.payload = Some(self.compute_payload(model));
        self.geometry_dirty = true;
        true
    }

    fn compute_payload(&self, model: &Mat4) -> LightPayload {
        let to_world = |local: Vec2| model.transform_point3((local * self.size).extend(0.0)).truncate();
        match self.shape {
            LightShape::Point => LightPayload::Point(to_world(self.origin)),
            LightShape::Line => LightPayload::Line {
                left: to_world(Vec2::new(-0.5, self.origin.y)),
                right: to_world(Vec2::new(0.5, self.origin.y)),
            },
        }
    }
}
