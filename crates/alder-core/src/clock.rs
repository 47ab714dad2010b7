use web_time::{Duration, Instant};

/// Frame clock: per-frame elapsed seconds plus an FPS figure refreshed over
/// one-second windows.
pub struct FrameClock {
    last: Instant,
    window: Instant,
    frames: u32,
    fps: u32,
    delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        FrameClock {
            last: now,
            window: now,
            frames: 0,
            fps: 0,
            delta: 0.005,
        }
    }

    /// Advances the clock and returns the seconds elapsed since the
    /// previous tick.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;

        self.frames += 1;
        if now.duration_since(self.window) >= Duration::from_secs(1) {
            self.fps = self.frames;
            self.frames = 0;
            self.window = now;
        }

        self.delta
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        FrameClock::new()
    }
}
