/// Timing for one rendered frame, handed to `render_frame`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Monotonic frame counter, starting at 0.
    pub index: u64,
    /// Seconds since the previous frame.
    pub dt: f32,
}

/// Produces consecutive [`FrameTime`] values for a host's render loop.
pub struct FrameClock {
    next_index: u64,
    elapsed: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            next_index: 0,
            elapsed: 0.0,
        }
    }

    /// Advance by one frame of `dt` seconds. Negative deltas count as zero.
    pub fn tick(&mut self, dt: f32) -> FrameTime {
        let dt = dt.max(0.0);
        let frame = FrameTime {
            index: self.next_index,
            dt,
        };
        self.next_index += 1;
        self.elapsed += dt as f64;
        frame
    }

    /// Total seconds ticked so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
