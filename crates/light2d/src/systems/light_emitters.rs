use crate::components::layer::LayerMask;
use crate::core::scene::Scene;
use crate::renderer::instance::LightGeometryBuffer;

/// Republish light origins for every active light sprite whose transform,
/// origin or shape changed. Returns how many sprites republished.
pub fn publish_light_emitters(scene: &mut Scene, force: bool) -> usize {
    let mut published = 0;
    for lit in scene.lights_mut(LayerMask::ALL) {
        if lit.light.update(&lit.model, force) {
            published += 1;
        }
    }
    if published > 0 {
        log::trace!("republished {} light emitters", published);
    }
    published
}

/// Collect the quads of light sprites on `mask` flagged geometry-dirty into
/// `buffer`, clearing their flags. Sprites on other layers keep theirs.
pub fn build_light_geometry(scene: &mut Scene, mask: LayerMask, buffer: &mut LightGeometryBuffer) {
    buffer.clear();
    for lit in scene.lights_mut(mask) {
        if !lit.light.take_dirty() {
            continue;
        }
        if let Some(payload) = lit.light.payload().copied() {
            buffer.push(lit.id, lit.layer, &payload, lit.light.color());
        }
    }
}
