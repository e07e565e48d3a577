//! Offscreen buffers owned by the lighting system.
//!
//! Every buffer lives in a named [`BufferSlot`] of a [`BufferPool`]. Stages
//! look buffers up by slot each frame and never hold on to a handle across
//! frames, so a resize can swap the handle underneath them safely.

use crate::api::types::TextureId;
use crate::error::BackendError;
use crate::renderer::traits::GraphicsBackend;

/// Pixel format of the lighting buffers. One format is used for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferFormat {
    /// 8 bits per channel.
    Standard,
    /// Half-float per channel; smoother light gradients.
    Extended,
}

impl BufferFormat {
    /// Pick the format for a session: extended range if preferred and
    /// supported, otherwise standard.
    pub fn select<B: GraphicsBackend + ?Sized>(prefer_extended: bool, backend: &B) -> Self {
        if !prefer_extended {
            return BufferFormat::Standard;
        }
        if backend.supports_format(BufferFormat::Extended) {
            BufferFormat::Extended
        } else {
            log::warn!(
                "{} backend has no extended-range buffers; lighting falls back to standard format",
                backend.backend()
            );
            BufferFormat::Standard
        }
    }
}

/// Named buffer roles in the lighting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSlot {
    /// Obstacle mask, at 2x when antialiased.
    Obstacles,
    /// 1x copy of an antialiased obstacle mask.
    ObstaclesDownsampled,
    LightSources,
    LightSourcesBlurred,
    /// Latest ambient field.
    AmbientCurrent,
    /// Ambient field of the previous pass.
    AmbientPrevious,
    /// Ambient emitters rendered this frame.
    AmbientEmission,
    /// Screen-sized target of the overlay stage.
    ScreenScratch,
}

impl BufferSlot {
    pub const COUNT: usize = 8;

    pub const ALL: [BufferSlot; Self::COUNT] = [
        BufferSlot::Obstacles,
        BufferSlot::ObstaclesDownsampled,
        BufferSlot::LightSources,
        BufferSlot::LightSourcesBlurred,
        BufferSlot::AmbientCurrent,
        BufferSlot::AmbientPrevious,
        BufferSlot::AmbientEmission,
        BufferSlot::ScreenScratch,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// An allocated offscreen buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenBuffer {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
    pub format: BufferFormat,
    /// False after a discard until the next full write.
    pub contents_valid: bool,
}

/// Allocation counters, for leak checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocations: u32,
    pub releases: u32,
}

impl PoolStats {
    pub fn live(&self) -> u32 {
        self.allocations - self.releases
    }
}

/// Owner of all lighting buffers.
pub struct BufferPool {
    slots: [Option<OffscreenBuffer>; BufferSlot::COUNT],
    format: BufferFormat,
    stats: PoolStats,
}

impl BufferPool {
    pub fn new(format: BufferFormat) -> Self {
        Self {
            slots: [None; BufferSlot::COUNT],
            format,
            stats: PoolStats::default(),
        }
    }

    pub fn format(&self) -> BufferFormat {
        self.format
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn get(&self, slot: BufferSlot) -> Option<&OffscreenBuffer> {
        self.slots[slot.index()].as_ref()
    }

    pub fn texture(&self, slot: BufferSlot) -> Option<TextureId> {
        self.get(slot).map(|b| b.texture)
    }

    /// Number of slots currently holding a buffer.
    pub fn live_buffers(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Return the buffer in `slot`, allocating it on first use. A buffer of
    /// the wrong size or format is released before its replacement is created.
    pub fn ensure<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        slot: BufferSlot,
        width: u32,
        height: u32,
    ) -> Result<TextureId, BackendError> {
        if let Some(buf) = self.get(slot).copied() {
            if buf.width == width && buf.height == height && buf.format == self.format {
                return Ok(buf.texture);
            }
            log::debug!(
                "resizing {:?} from {}x{} to {}x{}",
                slot,
                buf.width,
                buf.height,
                width,
                height
            );
            self.release(backend, slot);
        }

        let texture = backend.create_buffer(width, height, self.format)?;
        self.stats.allocations += 1;
        self.slots[slot.index()] = Some(OffscreenBuffer {
            texture,
            width,
            height,
            format: self.format,
            contents_valid: false,
        });
        Ok(texture)
    }

    pub fn release<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B, slot: BufferSlot) {
        if let Some(buf) = self.slots[slot.index()].take() {
            backend.release_buffer(buf.texture);
            self.stats.releases += 1;
        }
    }

    pub fn release_all<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        for slot in BufferSlot::ALL {
            self.release(backend, slot);
        }
    }

    /// Switch every buffer to `format`. Existing buffers are released and
    /// come back lazily in the new format, so formats are never mixed.
    pub fn set_format<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B, format: BufferFormat) {
        if self.format == format {
            return;
        }
        self.release_all(backend);
        self.format = format;
    }

    /// Invalidate a buffer's contents before it is fully rewritten.
    pub fn discard<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B, slot: BufferSlot) {
        if let Some(buf) = self.slots[slot.index()].as_mut() {
            buf.contents_valid = false;
            backend.discard_contents(buf.texture);
        }
    }

    pub fn mark_written(&mut self, slot: BufferSlot) {
        if let Some(buf) = self.slots[slot.index()].as_mut() {
            buf.contents_valid = true;
        }
    }

    /// Exchange the buffers held by two slots (ping-pong).
    pub fn swap(&mut self, a: BufferSlot, b: BufferSlot) {
        self.slots.swap(a.index(), b.index());
    }
}
