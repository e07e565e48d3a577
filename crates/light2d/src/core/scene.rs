use glam::Mat4;

use crate::api::types::EntityId;
use crate::components::entity::Entity;
use crate::components::layer::LayerMask;
use crate::components::light_sprite::LightSprite;

/// A lit entity borrowed out of the scene.
pub struct LitEntity<'a> {
    pub id: EntityId,
    pub layer: u8,
    pub model: Mat4,
    pub light: &'a mut LightSprite,
}

/// Entities the lighting passes care about, in draw order.
///
/// Flat Vec storage: a scene holds at most a few hundred lit objects.
pub struct Scene {
    entities: Vec<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            entities: Vec::with_capacity(64),
        }
    }

    /// Add an entity, replacing any entity with the same id in place.
    pub fn insert(&mut self, entity: Entity) {
        match self.entity_mut(entity.id) {
            Some(slot) => *slot = entity,
            None => self.entities.push(entity),
        }
    }

    /// Remove an entity, keeping the draw order of the rest.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(idx))
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Light sprites of active entities drawn on a layer in `mask`.
    pub fn lights_mut(&mut self, mask: LayerMask) -> impl Iterator<Item = LitEntity<'_>> {
        self.entities
            .iter_mut()
            .filter(move |e| e.in_mask(mask))
            .filter_map(|e| {
                let model = e.model_matrix();
                let (id, layer) = (e.id, e.layer);
                e.light.as_mut().map(|light| LitEntity { id, layer, model, light })
            })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
