//! Time management utilities

use std::time::Instant;

/// Timing sample produced once per loop iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the clock started (fed to the shader as `time`)
    pub elapsed: f32,
    /// Seconds since the previous tick (drives camera movement)
    pub delta: f32,
}

/// Monotonic clock for the present loop
pub struct FrameClock {
    start: Instant,
    last_tick: Instant,
    ticks: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock starting now
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            ticks: 0,
        }
    }

    /// Advance the clock (should be called once per loop iteration)
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.ticks += 1;
        FrameTime {
            elapsed: now.duration_since(self.start).as_secs_f32(),
            delta,
        }
    }

    /// Number of ticks so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Average ticks per second since the clock started
    pub fn average_rate(&self) -> f32 {
        let total = self.last_tick.duration_since(self.start).as_secs_f32();
        if total > 0.0 {
            self.ticks as f32 / total
        } else {
            0.0
        }
    }
}
