use bytemuck::{Pod, Zeroable};

use crate::api::types::{Color, EntityId};
use crate::components::light_sprite::LightPayload;

/// Per-vertex light data uploaded with each light quad.
/// 6 floats = 24 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct LightVertex {
    /// World-space light origin for this vertex.
    pub origin: [f32; 2],
    /// Light tint, alpha = intensity.
    pub color: [f32; 4],
}

impl LightVertex {
    pub const FLOATS: usize = 6;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    /// Expand a payload into the quad's 4 vertices.
    pub fn quad(payload: &LightPayload, color: Color) -> [LightVertex; 4] {
        payload.vertex_positions().map(|p| LightVertex {
            origin: p.to_array(),
            color,
        })
    }
}

/// One re-uploaded light quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightQuad {
    pub entity: EntityId,
    /// Scene layer the quad is drawn on.
    pub layer: u8,
    pub vertices: [LightVertex; 4],
}

impl LightQuad {
    pub fn color(&self) -> Color {
        self.vertices[0].color
    }
}

/// Light quads whose geometry changed since the last upload.
pub struct LightGeometryBuffer {
    quads: Vec<LightQuad>,
}

impl LightGeometryBuffer {
    pub fn new() -> Self {
        Self {
            quads: Vec::with_capacity(64),
        }
    }

    pub fn clear(&mut self) {
        self.quads.clear();
    }

    pub fn push(&mut self, entity: EntityId, layer: u8, payload: &LightPayload, color: Color) {
        self.quads.push(LightQuad {
            entity,
            layer,
            vertices: LightVertex::quad(payload, color),
        });
    }

    pub fn quads(&self) -> &[LightQuad] {
        &self.quads
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Flat vertex data, 4 vertices per quad, ready for a vertex buffer write.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        let verts: Vec<LightVertex> = self.quads.iter().flat_map(|q| q.vertices).collect();
        bytemuck::cast_slice(&verts).to_vec()
    }
}

impl Default for LightGeometryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn light_vertex_is_6_floats() {
        assert_eq!(std::mem::size_of::<LightVertex>(), LightVertex::STRIDE_BYTES);
    }

    #[test]
    fn vertex_bytes_cover_all_quads() {
        let mut buf = LightGeometryBuffer::new();
        let payload = LightPayload::Line {
            left: Vec2::new(-1.0, 0.0),
            right: Vec2::new(1.0, 0.0),
        };
        buf.push(EntityId(1), 8, &payload, [1.0; 4]);
        buf.push(EntityId(2), 8, &LightPayload::Point(Vec2::ZERO), [1.0; 4]);
        assert_eq!(buf.vertex_bytes().len(), 2 * 4 * LightVertex::STRIDE_BYTES);
        assert_eq!(buf.quads()[0].vertices[1].origin, [1.0, 0.0]);
    }
}
