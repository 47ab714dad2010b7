use std::sync::Arc;

use smallvec::SmallVec;
use web_time::{Duration, Instant};

/// One-shot interval timer polled from the update loop. `start` arms it;
/// the first `update` past the deadline disarms it and fires the elapsed
/// callbacks once.
pub struct Timer {
    enabled: bool,
    interval: Duration,
    deadline: Instant,
    elapsed: SmallVec<[Arc<dyn Fn() + Send + Sync>; 1]>,
}

impl Timer {
    pub fn new() -> Self {
        Timer {
            enabled: false,
            interval: Duration::ZERO,
            deadline: Instant::now(),
            elapsed: SmallVec::new(),
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn on_elapsed(&mut self, f: impl Fn() + Send + Sync + 'static) {
        self.elapsed.push(Arc::new(f));
    }

    pub fn start(&mut self) {
        self.enabled = true;
        self.deadline = Instant::now() + self.interval;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn update(&mut self) {
        if !self.enabled {
            return;
        }
        if Instant::now() >= self.deadline {
            self.enabled = false;
            for f in &self.elapsed {
                f();
            }
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new()
    }
}
