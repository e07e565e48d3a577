//! Headless backend: every texture is a single flat color.
//!
//! Useful for hosts without a GPU and for exercising the pipeline. Layers
//! are given a flat content color, and shading stages are plain closures
//! over the colors of their inputs. Every call is recorded in order.

use std::collections::HashMap;

use crate::api::types::{Color, EntityId, Image, StageId, TextureId, TRANSPARENT_BLACK};
use crate::error::BackendError;
use crate::renderer::buffer::BufferFormat;
use crate::renderer::instance::LightQuad;
use crate::renderer::stage::{StageDraw, StageInput, StageInputs};
use crate::renderer::traits::{GraphicsBackend, LayerPass, RenderTier, ShaderGlobals};

/// What a stage closure sees: its source color and the colors of its inputs.
pub struct StageContext<'a> {
    pub source: Option<Color>,
    pub inputs: &'a StageInputs,
    colors: Vec<(&'static str, Color)>,
}

impl StageContext<'_> {
    /// Color of the texture bound to `name`; transparent black when unbound.
    pub fn texture(&self, name: &str) -> Color {
        self.colors
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
            .unwrap_or(TRANSPARENT_BLACK)
    }
}

pub type StageFn = Box<dyn Fn(&StageContext<'_>) -> Color>;

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create {
        texture: TextureId,
        width: u32,
        height: u32,
        format: BufferFormat,
    },
    Release(TextureId),
    Discard(TextureId),
    /// Light quads replaced, by entity.
    UploadLights(Vec<EntityId>),
    RenderLayer(LayerPass),
    Blit {
        source: Option<TextureId>,
        target: TextureId,
        stage: Option<StageId>,
        inputs: Option<StageInputs>,
    },
    SetGlobals(ShaderGlobals),
}

#[derive(Debug, Clone, Copy)]
struct FlatTexture {
    width: u32,
    height: u32,
    format: Option<BufferFormat>,
    /// `None` while contents are undefined (after a discard).
    color: Option<Color>,
}

pub struct HeadlessBackend {
    tier: RenderTier,
    next_id: u32,
    max_dimension: u32,
    textures: HashMap<TextureId, FlatTexture>,
    layers: HashMap<u8, Color>,
    light_quads: HashMap<EntityId, LightQuad>,
    stages: HashMap<StageId, StageFn>,
    globals: Option<ShaderGlobals>,
    commands: Vec<Command>,
}

impl HeadlessBackend {
    pub fn new(tier: RenderTier) -> Self {
        Self {
            tier,
            next_id: 1,
            max_dimension: 16384,
            textures: HashMap::new(),
            layers: HashMap::new(),
            light_quads: HashMap::new(),
            stages: HashMap::new(),
            globals: None,
            commands: Vec::new(),
        }
    }

    /// Refuse buffers larger than `max` on either axis.
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max;
        self
    }

    /// Create a host-owned image (scene source or display target).
    pub fn create_image(&mut self, width: u32, height: u32, color: Color) -> Image {
        let texture = self.alloc_id();
        self.textures.insert(
            texture,
            FlatTexture {
                width,
                height,
                format: None,
                color: Some(color),
            },
        );
        Image::new(texture, width, height)
    }

    /// Set the flat content drawn for `layer`. `None` empties the layer.
    pub fn set_layer_content(&mut self, layer: u8, color: Option<Color>) {
        match color {
            Some(c) => self.layers.insert(layer, c),
            None => self.layers.remove(&layer),
        };
    }

    pub fn register_stage(&mut self, stage: StageId, f: impl Fn(&StageContext<'_>) -> Color + 'static) {
        self.stages.insert(stage, Box::new(f));
    }

    /// Current color of a texture; `None` if unknown or discarded.
    pub fn read(&self, texture: TextureId) -> Option<Color> {
        self.textures.get(&texture).and_then(|t| t.color)
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&texture).map(|t| (t.width, t.height))
    }

    /// Format of an offscreen buffer; `None` for host images and unknown ids.
    pub fn texture_format(&self, texture: TextureId) -> Option<BufferFormat> {
        self.textures.get(&texture).and_then(|t| t.format)
    }

    pub fn is_live(&self, texture: TextureId) -> bool {
        self.textures.contains_key(&texture)
    }

    /// Offscreen buffers created and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.textures.values().filter(|t| t.format.is_some()).count()
    }

    pub fn globals(&self) -> Option<&ShaderGlobals> {
        self.globals.as_ref()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Light geometry currently held for `entity`.
    pub fn light_quad(&self, entity: EntityId) -> Option<&LightQuad> {
        self.light_quads.get(&entity)
    }

    /// Entities whose light quads were uploaded, one entry per upload, in order.
    pub fn uploaded_lights(&self) -> Vec<EntityId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::UploadLights(ids) => Some(ids.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Number of blits that went through `stage`.
    pub fn stage_invocations(&self, stage: StageId) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Blit { stage: Some(s), .. } if *s == stage))
            .count()
    }

    fn alloc_id(&mut self) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        id
    }

    fn sample(&self, texture: TextureId) -> Result<Color, BackendError> {
        let tex = self
            .textures
            .get(&texture)
            .ok_or(BackendError::UnknownTexture(texture))?;
        Ok(tex.color.unwrap_or(TRANSPARENT_BLACK))
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn backend(&self) -> &'static str {
        "headless"
    }

    fn tier(&self) -> RenderTier {
        self.tier
    }

    fn create_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: BufferFormat,
    ) -> Result<TextureId, BackendError> {
        let too_big = width > self.max_dimension || height > self.max_dimension;
        if width == 0 || height == 0 || too_big || !self.supports_format(format) {
            return Err(BackendError::Allocation { width, height, format });
        }
        let texture = self.alloc_id();
        self.textures.insert(
            texture,
            FlatTexture {
                width,
                height,
                format: Some(format),
                color: None,
            },
        );
        self.commands.push(Command::Create { texture, width, height, format });
        Ok(texture)
    }

    fn release_buffer(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.commands.push(Command::Release(texture));
    }

    fn discard_contents(&mut self, texture: TextureId) {
        if let Some(tex) = self.textures.get_mut(&texture) {
            tex.color = None;
        }
        self.commands.push(Command::Discard(texture));
    }

    fn upload_light_geometry(&mut self, quads: &[LightQuad]) {
        for quad in quads {
            self.light_quads.insert(quad.entity, *quad);
        }
        self.commands
            .push(Command::UploadLights(quads.iter().map(|q| q.entity).collect()));
    }

    fn render_layer(&mut self, pass: &LayerPass) -> Result<(), BackendError> {
        let mask = pass.culling_mask;
        let layer_colors = mask.layers().filter_map(|layer| self.layers.get(&layer));
        let quad_colors = self
            .light_quads
            .values()
            .filter(|q| mask.contains(q.layer))
            .map(LightQuad::color);
        let mut drawn: Option<Color> = None;
        for c in layer_colors.copied().chain(quad_colors) {
            let acc = drawn.get_or_insert(TRANSPARENT_BLACK);
            for i in 0..4 {
                acc[i] += c[i];
            }
        }
        let tex = self
            .textures
            .get_mut(&pass.target)
            .ok_or(BackendError::UnknownTexture(pass.target))?;
        tex.color = Some(drawn.unwrap_or(pass.background));
        self.commands.push(Command::RenderLayer(*pass));
        Ok(())
    }

    fn blit(
        &mut self,
        source: Option<TextureId>,
        target: TextureId,
        stage: Option<StageDraw<'_>>,
    ) -> Result<(), BackendError> {
        let source_color = source.map(|s| self.sample(s)).transpose()?;
        let color = match stage {
            Some(draw) => {
                let mut colors = Vec::new();
                for (name, input) in draw.inputs.iter() {
                    if let StageInput::Texture(Some(t)) = input {
                        colors.push((name, self.sample(t)?));
                    }
                }
                let ctx = StageContext {
                    source: source_color,
                    inputs: draw.inputs,
                    colors,
                };
                let f = self
                    .stages
                    .get(&draw.stage)
                    .ok_or(BackendError::UnknownStage(draw.stage))?;
                f(&ctx)
            }
            None => source_color.unwrap_or(TRANSPARENT_BLACK),
        };

        let tex = self
            .textures
            .get_mut(&target)
            .ok_or(BackendError::UnknownTexture(target))?;
        tex.color = Some(color);
        self.commands.push(Command::Blit {
            source,
            target,
            stage: stage.map(|d| d.stage),
            inputs: stage.map(|d| d.inputs.clone()),
        });
        Ok(())
    }

    fn set_globals(&mut self, globals: &ShaderGlobals) {
        self.globals = Some(*globals);
        self.commands.push(Command::SetGlobals(*globals));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::stage::MAIN_TEX;

    #[test]
    fn sdr_backend_refuses_extended_buffers() {
        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let err = backend.create_buffer(8, 8, BufferFormat::Extended).unwrap_err();
        assert!(matches!(err, BackendError::Allocation { .. }));
    }

    #[test]
    fn plain_blit_copies_color() {
        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let src = backend.create_image(4, 4, [0.2, 0.4, 0.6, 1.0]);
        let dst = backend.create_buffer(4, 4, BufferFormat::Standard).unwrap();
        backend.blit(Some(src.texture), dst, None).unwrap();
        assert_eq!(backend.read(dst), Some([0.2, 0.4, 0.6, 1.0]));
    }

    #[test]
    fn stage_blit_runs_registered_closure() {
        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let stage = StageId(7);
        backend.register_stage(stage, |ctx| {
            let c = ctx.texture(MAIN_TEX);
            [c[0] * 0.5, c[1] * 0.5, c[2] * 0.5, c[3]]
        });
        let src = backend.create_image(2, 2, [1.0, 1.0, 1.0, 1.0]);
        let dst = backend.create_buffer(2, 2, BufferFormat::Standard).unwrap();
        let inputs = StageInputs::new().with_texture(MAIN_TEX, Some(src.texture));
        backend
            .blit(None, dst, Some(StageDraw { stage, inputs: &inputs }))
            .unwrap();
        assert_eq!(backend.read(dst), Some([0.5, 0.5, 0.5, 1.0]));
        assert_eq!(backend.stage_invocations(stage), 1);
    }

    #[test]
    fn unknown_stage_is_an_error() {
        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let dst = backend.create_buffer(2, 2, BufferFormat::Standard).unwrap();
        let inputs = StageInputs::new();
        let err = backend
            .blit(None, dst, Some(StageDraw { stage: StageId(99), inputs: &inputs }))
            .unwrap_err();
        assert!(matches!(err, BackendError::UnknownStage(StageId(99))));
    }

    #[test]
    fn uploaded_quads_draw_on_their_layer() {
        use crate::components::layer::LayerMask;
        use crate::components::light_sprite::LightPayload;
        use crate::renderer::instance::LightGeometryBuffer;
        use crate::renderer::traits::CameraView;
        use glam::{Vec2, Vec3};

        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let mut geometry = LightGeometryBuffer::new();
        geometry.push(EntityId(1), 8, &LightPayload::Point(Vec2::ZERO), [0.25, 0.0, 0.0, 1.0]);
        backend.upload_light_geometry(geometry.quads());
        geometry.clear();
        geometry.push(EntityId(1), 8, &LightPayload::Point(Vec2::ONE), [0.5, 0.0, 0.0, 1.0]);
        backend.upload_light_geometry(geometry.quads());
        assert_eq!(backend.uploaded_lights(), vec![EntityId(1), EntityId(1)]);
        assert_eq!(backend.light_quad(EntityId(1)).unwrap().vertices[0].origin, [1.0, 1.0]);

        let target = backend.create_buffer(2, 2, BufferFormat::Standard).unwrap();
        let view = CameraView {
            position: Vec3::ZERO,
            orthographic: true,
            orthographic_size: 5.0,
            field_of_view: 60.0,
            aspect: 1.0,
        };
        let mut pass = LayerPass {
            view,
            culling_mask: LayerMask::layer(8),
            background: TRANSPARENT_BLACK,
            target,
            supersample: 1,
        };
        backend.render_layer(&pass).unwrap();
        assert_eq!(backend.read(target), Some([0.5, 0.0, 0.0, 1.0]));

        pass.culling_mask = LayerMask::layer(9);
        pass.background = [0.0, 0.0, 0.0, 1.0];
        backend.render_layer(&pass).unwrap();
        assert_eq!(backend.read(target), Some([0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn discard_makes_contents_undefined() {
        let mut backend = HeadlessBackend::new(RenderTier::Sdr);
        let img = backend.create_image(2, 2, [1.0; 4]);
        backend.discard_contents(img.texture);
        assert_eq!(backend.read(img.texture), None);
    }
}
