//! Shading stages and their named inputs.
//!
//! The pixel math of each stage belongs to the backend. The pipeline only
//! decides which stage runs, in what order, and with which inputs.

use glam::Vec2;

use crate::api::types::{StageId, TextureId};

/// Texture read by blur and ambient-compute stages.
pub const MAIN_TEX: &str = "main_tex";
/// Light emission (light sources or ambient emitters).
pub const LIGHT_SOURCES_TEX: &str = "light_sources_tex";
/// Accumulated ambient light, or none when ambient lighting is off.
pub const AMBIENT_LIGHT_TEX: &str = "ambient_light_tex";
/// The rendered scene.
pub const GAME_TEX: &str = "game_tex";
/// Camera-motion compensation, in texture UV units.
pub const SHIFT: &str = "shift";
/// Lighting-to-main camera offset, in light UV units.
pub const OFFSET: &str = "offset";
/// Lighting-to-main camera frustum scale.
pub const SCALE: &str = "scale";

/// Value bound to a named stage input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageInput {
    /// A texture binding. `None` binds nothing.
    Texture(Option<TextureId>),
    Vector(Vec2),
    Float(f32),
}

/// The named inputs of one stage invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageInputs {
    entries: Vec<(&'static str, StageInput)>,
}

impl StageInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texture(self, name: &'static str, texture: Option<TextureId>) -> Self {
        self.with(name, StageInput::Texture(texture))
    }

    pub fn with_vector(self, name: &'static str, value: Vec2) -> Self {
        self.with(name, StageInput::Vector(value))
    }

    pub fn with_float(self, name: &'static str, value: f32) -> Self {
        self.with(name, StageInput::Float(value))
    }

    fn with(mut self, name: &'static str, input: StageInput) -> Self {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = input,
            None => self.entries.push((name, input)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<StageInput> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// Texture bound to `name`; `None` if unbound or bound to nothing.
    pub fn texture(&self, name: &str) -> Option<TextureId> {
        match self.get(name) {
            Some(StageInput::Texture(t)) => t,
            _ => None,
        }
    }

    pub fn vector(&self, name: &str) -> Option<Vec2> {
        match self.get(name) {
            Some(StageInput::Vector(v)) => Some(v),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, StageInput)> + '_ {
        self.entries.iter().copied()
    }
}

/// A stage plus the inputs for one draw.
#[derive(Debug, Clone, Copy)]
pub struct StageDraw<'a> {
    pub stage: StageId,
    pub inputs: &'a StageInputs,
}

/// The stages the lighting system drives. Optional stages that are missing
/// simply skip their pass; the overlay stage is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadingStages {
    /// Propagates ambient light: (emission, previous ambient, shift) -> ambient.
    pub ambient_compute: Option<StageId>,
    pub ambient_blur: Option<StageId>,
    pub light_sources_blur: Option<StageId>,
    /// Combines scene, light sources and ambient light into the final image.
    pub overlay: Option<StageId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebinding_a_name_replaces_it() {
        let inputs = StageInputs::new()
            .with_texture(MAIN_TEX, Some(TextureId(1)))
            .with_texture(MAIN_TEX, Some(TextureId(2)));
        assert_eq!(inputs.iter().count(), 1);
        assert_eq!(inputs.texture(MAIN_TEX), Some(TextureId(2)));
    }

    #[test]
    fn null_texture_is_bound_but_empty() {
        let inputs = StageInputs::new().with_texture(AMBIENT_LIGHT_TEX, None);
        assert_eq!(inputs.get(AMBIENT_LIGHT_TEX), Some(StageInput::Texture(None)));
        assert_eq!(inputs.texture(AMBIENT_LIGHT_TEX), None);
    }

    #[test]
    fn typed_lookups_ignore_mismatched_kinds() {
        let inputs = StageInputs::new()
            .with_vector(SHIFT, Vec2::new(0.5, 0.0))
            .with_float("gain", 2.0);
        assert_eq!(inputs.vector(SHIFT), Some(Vec2::new(0.5, 0.0)));
        assert_eq!(inputs.texture(SHIFT), None);
        assert_eq!(inputs.vector("gain"), None);
    }
}
