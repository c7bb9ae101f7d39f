use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: u32 = 10;
const MIN_ELAPSED_SECS: f64 = 1e-9;

/// Average frames per second over `frames`, with the divisor floored so a
/// zero-length interval cannot produce inf or NaN.
pub fn average_fps(frames: u32, elapsed: Duration) -> f64 {
    frames as f64 / elapsed.as_secs_f64().max(MIN_ELAPSED_SECS)
}

/// Frame rate averaged over fixed windows of `window` frames.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    window: u32,
    frames: u32,
    window_start: Instant,
    fps: f64,
}

impl FpsMeter {
    pub fn new(window: u32) -> Self {
        Self::starting_at(window, Instant::now())
    }

    pub fn starting_at(window: u32, start: Instant) -> Self {
        Self {
            window: window.max(1),
            frames: 0,
            window_start: start,
            fps: 0.0,
        }
    }

    /// Counts one frame finished at `now`. Returns the new average when a
    /// window closes.
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        if self.frames % self.window != 0 {
            return None;
        }

        self.frames = 0;
        self.fps = average_fps(self.window, now.saturating_duration_since(self.window_start));
        self.window_start = now;
        Some(self.fps)
    }

    /// Last completed average, 0.0 until the first window closes.
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
